//! Lexing with one object per state.
//!
//! A `MachineState` is a small, self-contained lexer for one construct: it
//! carries its own accumulator and a static table of patterns bound to its
//! methods. `Machine::read` drives a state: it matches the table against the
//! input, skips the match, and calls the bound method, which either asks for
//! more input (`Step::ignore`) or finishes the state with a value
//! (`Step::pop`). A method can hand off to a fresh sub-state on the same input
//! with `Machine::attach_state`, so nested constructs lex recursively.

use regex::{Captures, Regex};
use tracing::{debug, trace};

use crate::error::{LexError, LexResult};
use crate::iter::{Chunk, StatefulIterator};
use crate::pattern;

/// What a bound method wants the machine to do next.
#[derive(Debug, Clone, PartialEq)]
pub enum Step<T> {
    /// Stay in this state and keep consuming input.
    Continue,
    /// Leave this state with its result.
    Pop(T),
}

impl<T> Step<T> {
    pub fn ignore() -> Self {
        Step::Continue
    }

    pub fn pop(value: T) -> Self {
        Step::Pop(value)
    }
}

/// A method of `S` bound to a pattern.
pub type Handler<S> = fn(
    &mut S,
    &Captures<'_>,
    &mut Machine<'_>,
) -> LexResult<Step<<S as MachineState>::Output>>;

/// One lexer state.
pub trait MachineState: Sized + 'static {
    type Output;

    /// Name used in diagnostics.
    const NAME: &'static str;

    /// The state's rule table, in match order.
    fn rules() -> &'static StateRules<Self>;
}

/// Ordered patterns and the handlers they dispatch to.
pub struct StateRules<S: MachineState> {
    patterns: Vec<Regex>,
    handlers: Vec<Handler<S>>,
}

impl<S: MachineState> Default for StateRules<S> {
    fn default() -> Self {
        StateRules {
            patterns: Vec::new(),
            handlers: Vec::new(),
        }
    }
}

impl<S: MachineState> std::fmt::Debug for StateRules<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateRules")
            .field("state", &S::NAME)
            .field("patterns", &self.patterns)
            .finish()
    }
}

impl<S: MachineState> StateRules<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule; the pattern is anchored to the start of the remaining input.
    pub fn rule(mut self, pattern: &str, handler: Handler<S>) -> LexResult<Self> {
        let pattern = pattern::anchored(pattern).map_err(|e| e.annotate(S::NAME))?;
        self.patterns.push(pattern);
        self.handlers.push(handler);
        Ok(self)
    }
}

/// Drives states over a character iterator.
pub struct Machine<'a> {
    input: &'a mut dyn StatefulIterator<Chunk = String>,
    peek_length: usize,
    depth: usize,
}

impl<'a> Machine<'a> {
    pub const DEFAULT_PEEK_LENGTH: usize = 256;

    pub fn new(input: &'a mut dyn StatefulIterator<Chunk = String>) -> Self {
        Self::with_peek_length(input, Self::DEFAULT_PEEK_LENGTH)
    }

    pub fn with_peek_length(
        input: &'a mut dyn StatefulIterator<Chunk = String>,
        peek_length: usize,
    ) -> Self {
        Machine {
            input,
            peek_length,
            depth: 0,
        }
    }

    /// Input position, in characters.
    pub fn position(&self) -> usize {
        self.input.position()
    }

    /// Run `state` until it pops, returning its result.
    pub fn read<S: MachineState>(&mut self, mut state: S) -> LexResult<S::Output> {
        self.depth += 1;
        let result = self.run(&mut state);
        self.depth -= 1;
        result
    }

    /// Run a sub-state on the same input from inside a handler.
    ///
    /// The caller's state resumes where the sub-state stopped.
    pub fn attach_state<S: MachineState>(&mut self, state: S) -> LexResult<S::Output> {
        debug!(state = S::NAME, depth = self.depth + 1, position = self.position(), "attach state");
        self.read(state)
    }

    fn run<S: MachineState>(&mut self, state: &mut S) -> LexResult<S::Output> {
        let rules = S::rules();
        loop {
            let base = self.input.position();
            let window = self.input.peek(self.peek_length)?;
            let Some((index, captures)) = pattern::first_match(&rules.patterns, &window) else {
                if window.is_empty() {
                    return Err(LexError::UnexpectedEof {
                        state: S::NAME.to_owned(),
                    });
                }
                return Err(LexError::NoMatch {
                    state: S::NAME.to_owned(),
                    excerpt: pattern::excerpt(&window),
                });
            };
            let units = <String as Chunk>::units_in(pattern::matched(&captures));
            self.input.skip(units)?;
            trace!(state = S::NAME, position = base, depth = self.depth, "match");

            match (rules.handlers[index])(state, &captures, self)? {
                Step::Pop(value) => return Ok(value),
                Step::Continue if self.input.position() == base => {
                    return Err(LexError::Stalled {
                        state: S::NAME.to_owned(),
                    })
                }
                Step::Continue => (),
            }
        }
    }
}
