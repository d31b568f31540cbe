//! Folding START...END runs of tokens into single tokens.
//!
//! The combiner sits on a token stream. A START token opens a span; tokens
//! inside are buffered rather than emitted; the END token closing the span names
//! a group in its value, and that group's reduction turns the buffered children
//! into one replacement token. The replacement is routed like any other token,
//! so an inner span reduces into its parent's children before the parent closes.
//!
//! Tokens outside any span pass through unchanged.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::iter::FusedIterator;

use tracing::trace;

use crate::error::{LexError, LexResult};
use crate::token::{Token, END, START};

/// Token values that can name a span's group.
pub trait GroupName {
    fn group_name(&self) -> Option<&str>;
}

impl GroupName for String {
    fn group_name(&self) -> Option<&str> {
        Some(self.as_str())
    }
}

impl GroupName for &str {
    fn group_name(&self) -> Option<&str> {
        Some(*self)
    }
}

impl GroupName for Cow<'_, str> {
    fn group_name(&self) -> Option<&str> {
        Some(self.as_ref())
    }
}

impl<T: GroupName> GroupName for Option<T> {
    fn group_name(&self) -> Option<&str> {
        self.as_ref().and_then(GroupName::group_name)
    }
}

/// Turns a span's children into the token that replaces the span.
pub type Reduction<V> = Box<dyn Fn(Vec<Token<V>>) -> Token<V>>;

#[derive(Debug, Clone, Copy, Default)]
pub struct CombinerOptions {
    /// Fail when END names a different group than the START that opened the span.
    ///
    /// Off by default: the END token's group alone picks the reduction.
    pub strict_groups: bool,
}

/// A span that has been opened but not yet closed.
#[derive(Debug, Clone, PartialEq)]
pub struct Span<V> {
    /// Group named by the opening START, if it named one.
    pub group: Option<String>,
    /// Finished tokens seen inside the span so far, in order.
    pub children: Vec<Token<V>>,
}

impl<V> Span<V> {
    pub fn new(group: Option<String>) -> Self {
        Span {
            group,
            children: Vec::new(),
        }
    }
}

impl<V> From<Vec<Token<V>>> for Span<V> {
    fn from(children: Vec<Token<V>>) -> Self {
        Span {
            group: None,
            children,
        }
    }
}

/// A set of named reductions.
pub struct Combiner<V> {
    rules: HashMap<String, Reduction<V>>,
    options: CombinerOptions,
}

impl<V> Default for Combiner<V> {
    fn default() -> Self {
        Combiner::new(CombinerOptions::default())
    }
}

impl<V> fmt::Debug for Combiner<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut groups: Vec<_> = self.rules.keys().collect();
        groups.sort();
        f.debug_struct("Combiner")
            .field("groups", &groups)
            .field("options", &self.options)
            .finish()
    }
}

impl<V> Combiner<V> {
    pub fn new(options: CombinerOptions) -> Self {
        Combiner {
            rules: HashMap::new(),
            options,
        }
    }

    /// Register the reduction for `group`, replacing any earlier one.
    pub fn rule(
        mut self,
        group: impl Into<String>,
        reduce: impl Fn(Vec<Token<V>>) -> Token<V> + 'static,
    ) -> Self {
        self.rules.insert(group.into(), Box::new(reduce));
        self
    }

    /// Wrap `tokens` with reduction, starting with `initial_stack` open (bottom first).
    pub fn map<T>(
        &self,
        tokens: T,
        initial_stack: Vec<Span<V>>,
    ) -> CombinedStream<'_, T::IntoIter, V>
    where
        T: IntoIterator<Item = LexResult<Token<V>>>,
    {
        CombinedStream {
            combiner: self,
            tokens: tokens.into_iter(),
            stack: initial_stack,
            finished: false,
        }
    }
}

/// A token stream with its START...END spans reduced.
pub struct CombinedStream<'c, T, V> {
    combiner: &'c Combiner<V>,
    tokens: T,
    stack: Vec<Span<V>>,
    finished: bool,
}

impl<T, V: fmt::Debug> fmt::Debug for CombinedStream<'_, T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombinedStream")
            .field("combiner", self.combiner)
            .field("stack", &self.stack)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl<T, V> CombinedStream<'_, T, V>
where
    T: Iterator<Item = LexResult<Token<V>>>,
    V: GroupName,
{
    /// Spans currently open, outermost first.
    pub fn pending(&self) -> &[Span<V>] {
        &self.stack
    }

    /// Close the innermost span and reduce it by the group END names.
    fn reduce(&mut self, end: Token<V>) -> LexResult<Token<V>> {
        let group = end.value.group_name().ok_or(LexError::MissingGroup)?;
        let span = self.stack.pop().ok_or_else(|| LexError::UnbalancedEnd {
            group: group.to_owned(),
        })?;
        if self.combiner.options.strict_groups {
            if let Some(opened) = span.group.as_deref().filter(|opened| *opened != group) {
                return Err(LexError::MismatchedGroup {
                    opened: opened.to_owned(),
                    closed: group.to_owned(),
                });
            }
        }
        let rule = self
            .combiner
            .rules
            .get(group)
            .ok_or_else(|| LexError::UnknownReduction(group.to_owned()))?;
        trace!(group, children = span.children.len(), depth = self.stack.len(), "reduce");
        Ok(rule(span.children))
    }

    /// The next token outside every span.
    ///
    /// `Ok(None)` means the wrapped stream ended with no span open.
    pub fn next_token(&mut self) -> LexResult<Option<Token<V>>> {
        loop {
            let Some(token) = self.tokens.next().transpose()? else {
                if !self.stack.is_empty() {
                    return Err(LexError::UnclosedSpan {
                        depth: self.stack.len(),
                    });
                }
                return Ok(None);
            };

            let token = if token.is(END) {
                self.reduce(token)?
            } else {
                token
            };

            if token.is_ignorable() {
                continue;
            }
            if token.is(START) {
                let group = token.value.group_name().map(str::to_owned);
                self.stack.push(Span::new(group));
                continue;
            }
            match self.stack.last_mut() {
                Some(span) => span.children.push(token),
                None => return Ok(Some(token)),
            }
        }
    }
}

impl<T, V> Iterator for CombinedStream<'_, T, V>
where
    T: Iterator<Item = LexResult<Token<V>>>,
    V: GroupName,
{
    type Item = LexResult<Token<V>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = self.next_token().transpose();
        self.finished = !matches!(result, Some(Ok(_)));
        result
    }
}

impl<T, V> FusedIterator for CombinedStream<'_, T, V>
where
    T: Iterator<Item = LexResult<Token<V>>>,
    V: GroupName,
{
}
