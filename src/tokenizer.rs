//! Rule-driven tokenization with a stack of lexer states.
//!
//! A `Tokenizer` holds an ordered list of default rules and named sets of
//! state-specific rules. The top of the state stack picks which set is active;
//! an empty stack means the default rules. Within a set, rules are tried in
//! declaration order and the first one whose pattern matches at the cursor
//! wins. There is no longest-match scan and no backtracking.
//!
//! Rules never push or pop states implicitly. Their actions do that through
//! the `LexContext` they are handed.
//!
//! ```
//! use rulelex::{StringIterator, Token, Tokenizer};
//!
//! let tokenizer = Tokenizer::builder()
//!     .rule("$", |_, _| Some(Token::eof(String::new())))?
//!     .rule(r"\s+", |_, _| None)?
//!     .rule(r"\w+", |m, _| Some(Token::new("WORD", m[0].to_owned())))?
//!     .build();
//!
//! let words: Vec<String> = tokenizer
//!     .map(StringIterator::new("two words"), Vec::<String>::new())
//!     .filter_map(|token| token.ok())
//!     .filter(|token| token.is("WORD"))
//!     .map(|token| token.value)
//!     .collect();
//! assert_eq!(words, ["two", "words"]);
//! # Ok::<(), rulelex::LexError>(())
//! ```

use std::collections::HashMap;
use std::fmt;
use std::iter::FusedIterator;

use regex::{Captures, Regex};
use tracing::{debug, trace};

use crate::error::{LexError, LexResult};
use crate::iter::{Chunk, StatefulIterator};
use crate::pattern;
use crate::token::Token;

/// Label used in diagnostics when the state stack is empty.
const DEFAULT_STATE: &str = "<default>";

/// Tokenizer configuration.
#[derive(Debug, Clone, Copy)]
pub struct TokenizerOptions {
    /// Units peeked from the input for each match attempt.
    ///
    /// A token longer than this can never be matched in one piece.
    pub peek_length: usize,

    /// Fail with `WindowExhausted` when an emitted token would run past
    /// `peek_length` units, rather than emitting only its front.
    ///
    /// The tokenizer then peeks one unit more than `peek_length`, so a token
    /// of exactly `peek_length` units still fits.
    pub reject_truncated: bool,
}

impl Default for TokenizerOptions {
    fn default() -> Self {
        TokenizerOptions {
            peek_length: 256,
            reject_truncated: true,
        }
    }
}

/// The action half of a rule.
///
/// Receives the match and the running context; returns the token to emit, or
/// `None` (or an ignorable token) to discard the match and keep going.
pub type Action<V> = Box<dyn Fn(&Captures<'_>, &mut LexContext<'_>) -> Option<Token<V>>>;

/// A pattern and the action run when it matches.
pub struct Rule<V> {
    pattern: Regex,
    source: String,
    action: Action<V>,
}

impl<V> Rule<V> {
    /// Build a rule. The pattern is anchored to the start of the remaining input.
    pub fn new(
        pattern: &str,
        action: impl Fn(&Captures<'_>, &mut LexContext<'_>) -> Option<Token<V>> + 'static,
    ) -> LexResult<Self> {
        Ok(Rule {
            pattern: pattern::anchored(pattern)?,
            source: pattern.to_owned(),
            action: Box::new(action),
        })
    }

    /// The pattern as written, without the anchor.
    pub fn pattern(&self) -> &str {
        &self.source
    }
}

impl<V> fmt::Debug for Rule<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("pattern", &self.source)
            .finish_non_exhaustive()
    }
}

/// What a rule action may see and change about the running stream.
#[derive(Debug)]
pub struct LexContext<'s> {
    states: &'s mut Vec<String>,
    position: usize,
    changed: bool,
}

impl LexContext<'_> {
    /// Enter `state`; its rules apply from the next match on.
    pub fn push_state(&mut self, state: impl Into<String>) {
        let state = state.into();
        debug!(state = state.as_str(), depth = self.states.len() + 1, "push state");
        self.states.push(state);
        self.changed = true;
    }

    /// Leave the current state, returning to the one below it.
    pub fn pop_state(&mut self) -> Option<String> {
        let state = self.states.pop();
        debug!(?state, depth = self.states.len(), "pop state");
        self.changed |= state.is_some();
        state
    }

    /// The active state, if any.
    pub fn state(&self) -> Option<&str> {
        self.states.last().map(String::as_str)
    }

    /// The whole stack, bottom first.
    pub fn states(&self) -> &[String] {
        self.states
    }

    /// Input position of the start of the match.
    pub fn position(&self) -> usize {
        self.position
    }
}

/// An ordered set of default rules plus per-state rule sets.
#[derive(Debug)]
pub struct Tokenizer<V> {
    default_rules: Vec<Rule<V>>,
    state_rules: HashMap<String, Vec<Rule<V>>>,
    options: TokenizerOptions,
}

impl<V> Tokenizer<V> {
    pub fn new(
        default_rules: Vec<Rule<V>>,
        state_rules: HashMap<String, Vec<Rule<V>>>,
        options: TokenizerOptions,
    ) -> Self {
        Tokenizer {
            default_rules,
            state_rules,
            options,
        }
    }

    pub fn builder() -> TokenizerBuilder<V> {
        TokenizerBuilder::default()
    }

    pub fn options(&self) -> TokenizerOptions {
        self.options
    }

    /// Lazily tokenize `input`, starting from `initial_states` (bottom first).
    pub fn map<I, S>(
        &self,
        input: I,
        initial_states: impl IntoIterator<Item = S>,
    ) -> TokenStream<'_, I, V>
    where
        I: StatefulIterator,
        S: Into<String>,
    {
        TokenStream {
            tokenizer: self,
            input,
            states: initial_states.into_iter().map(Into::into).collect(),
            finished: false,
        }
    }

    /// The rule set selected by the top of `states`.
    fn rules_for(&self, states: &[String]) -> LexResult<&[Rule<V>]> {
        match states.last() {
            None => Ok(&self.default_rules),
            Some(state) => self
                .state_rules
                .get(state)
                .map(Vec::as_slice)
                .ok_or_else(|| LexError::UnknownState(state.clone())),
        }
    }
}

/// Collects rules in declaration order.
#[derive(Debug)]
pub struct TokenizerBuilder<V> {
    default_rules: Vec<Rule<V>>,
    state_rules: HashMap<String, Vec<Rule<V>>>,
    options: TokenizerOptions,
}

impl<V> Default for TokenizerBuilder<V> {
    fn default() -> Self {
        TokenizerBuilder {
            default_rules: Vec::new(),
            state_rules: HashMap::new(),
            options: TokenizerOptions::default(),
        }
    }
}

impl<V> TokenizerBuilder<V> {
    /// Append a rule to the default set.
    pub fn rule(
        mut self,
        pattern: &str,
        action: impl Fn(&Captures<'_>, &mut LexContext<'_>) -> Option<Token<V>> + 'static,
    ) -> LexResult<Self> {
        self.default_rules.push(Rule::new(pattern, action)?);
        Ok(self)
    }

    /// Append a rule to the set for `state`, creating the set if needed.
    pub fn state_rule(
        mut self,
        state: &str,
        pattern: &str,
        action: impl Fn(&Captures<'_>, &mut LexContext<'_>) -> Option<Token<V>> + 'static,
    ) -> LexResult<Self> {
        let rule = Rule::new(pattern, action).map_err(|e| e.annotate(format!("state {state}")))?;
        self.state_rules
            .entry(state.to_owned())
            .or_default()
            .push(rule);
        Ok(self)
    }

    pub fn options(mut self, options: TokenizerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> Tokenizer<V> {
        Tokenizer::new(self.default_rules, self.state_rules, self.options)
    }
}

/// A lazy, single-pass token producer over one input.
///
/// `next_token` never ends by itself: once the input is exhausted, whichever
/// rule matches the empty window keeps firing. The `Iterator` impl stops after
/// the first `EOF` token or the first error.
#[derive(Debug)]
pub struct TokenStream<'t, I, V> {
    tokenizer: &'t Tokenizer<V>,
    input: I,
    states: Vec<String>,
    finished: bool,
}

impl<I, V> TokenStream<'_, I, V>
where
    I: StatefulIterator,
{
    /// The running state stack, bottom first.
    pub fn states(&self) -> &[String] {
        &self.states
    }

    /// Input position of the next match.
    pub fn position(&self) -> usize {
        self.input.position()
    }

    pub fn into_inner(self) -> I {
        self.input
    }

    fn state_label(&self) -> String {
        self.states
            .last()
            .map_or(DEFAULT_STATE, String::as_str)
            .to_owned()
    }

    /// Produce the next token that is not discarded.
    ///
    /// Errors leave the stream unusable: input already consumed stays consumed.
    pub fn next_token(&mut self) -> LexResult<Token<V>> {
        let tokenizer = self.tokenizer;
        let options = tokenizer.options;
        loop {
            let rules = tokenizer.rules_for(&self.states)?;
            let base = self.input.position();
            // One unit past the window shows whether a match would have run on.
            let request = if options.reject_truncated {
                options.peek_length.saturating_add(1)
            } else {
                options.peek_length
            };
            let chunk = self.input.peek(request)?;
            let (text, undecodable) =
                pattern::window_text(&chunk, base, chunk.units() < request);

            let Some((index, captures)) =
                pattern::first_match(rules.iter().map(|rule| &rule.pattern), text)
            else {
                return Err(match undecodable {
                    Some(position) => LexError::Decode { position },
                    None => LexError::NoMatch {
                        state: self.state_label(),
                        excerpt: pattern::excerpt(text),
                    },
                });
            };
            let rule = &rules[index];
            let matched = pattern::matched(&captures);

            // A match that reaches undecodable bytes might have gone on past them.
            if let Some(position) = undecodable {
                if matched.len() == text.len() {
                    return Err(LexError::Decode { position });
                }
            }

            let units = <I::Chunk as Chunk>::units_in(matched);
            self.input.skip(units)?;

            let mut context = LexContext {
                states: &mut self.states,
                position: base,
                changed: false,
            };
            let token = (rule.action)(&captures, &mut context);
            let changed = context.changed;

            match token {
                Some(token) if !token.is_ignorable() => {
                    // Discarded matches may run long; they are dropped whole.
                    if units > options.peek_length {
                        return Err(LexError::WindowExhausted {
                            state: self.state_label(),
                            peek_length: options.peek_length,
                        });
                    }
                    trace!(rule = rule.pattern(), position = base, name = token.name(), "token");
                    return Ok(token);
                }
                _ if units == 0 && !changed => {
                    return Err(LexError::Stalled {
                        state: self.state_label(),
                    });
                }
                _ => trace!(rule = rule.pattern(), position = base, "discarded"),
            }
        }
    }
}

impl<I, V> Iterator for TokenStream<'_, I, V>
where
    I: StatefulIterator,
{
    type Item = LexResult<Token<V>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = self.next_token();
        self.finished = match &result {
            Ok(token) => token.is_eof(),
            Err(_) => true,
        };
        Some(result)
    }
}

impl<I, V> FusedIterator for TokenStream<'_, I, V> where I: StatefulIterator {}
