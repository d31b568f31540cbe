//! Errors raised while lexing.
//!
//! Every error here is fatal for the stream that raised it: input consumed
//! before the failure is not rolled back, and the stream should be dropped.

use std::io;

/// Failure of a `next()`/`read()` call on any of the lexing layers.
#[derive(Debug, thiserror::Error)]
pub enum LexError {
    /// The current window matched no rule of the active state.
    #[error("invalid input in state {state}: no rule matches {excerpt:?}")]
    NoMatch { state: String, excerpt: String },

    /// A state name on the state stack has no rule set.
    #[error("no rules registered for state {0:?}")]
    UnknownState(String),

    /// An END token named a group with no reduction rule.
    #[error("no rule found for group {0:?}")]
    UnknownReduction(String),

    /// An END token's value could not be read as a group name.
    #[error("END token carries no group name")]
    MissingGroup,

    /// Input ran out inside a state that never popped.
    #[error("unexpected end of input in state {state}")]
    UnexpectedEof { state: String },

    /// A token ran past the end of the peek window and would have been cut short.
    #[error("token in state {state} is longer than the {peek_length}-unit peek window; raise peek_length")]
    WindowExhausted { state: String, peek_length: usize },

    /// An empty match discarded its token without changing state; lexing could not progress.
    #[error("empty match in state {state} makes no progress")]
    Stalled { state: String },

    /// END arrived with no span open.
    #[error("END for group {group:?} without a matching START")]
    UnbalancedEnd { group: String },

    /// END named a different group than the START that opened the span.
    #[error("span opened as {opened:?} closed as {closed:?}")]
    MismatchedGroup { opened: String, closed: String },

    /// The token source ended with spans still open.
    #[error("input ended inside {depth} open span(s)")]
    UnclosedSpan { depth: usize },

    /// Bytes at the given unit position are not valid UTF-8.
    #[error("invalid UTF-8 at position {position}")]
    Decode { position: usize },

    /// A rule pattern failed to compile.
    #[error("invalid rule pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// The backing source failed; passed through untranslated.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Another error, with additional context.
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<LexError>,
    },
}

impl LexError {
    /// Add additional context to an error.
    pub fn annotate(self, more: impl AsRef<str>) -> Self {
        LexError::Context {
            context: more.as_ref().to_owned(),
            source: Box::new(self),
        }
    }

    /// The underlying error, with any context stripped.
    pub fn root(&self) -> &LexError {
        match self {
            LexError::Context { source, .. } => source.root(),
            e => e,
        }
    }
}

/// The main result type for this crate.
pub type LexResult<T> = Result<T, LexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotate_keeps_root() {
        let err = LexError::UnknownState("string".to_owned())
            .annotate("while lexing input.txt")
            .annotate("batch 2");
        let text = err.to_string();
        assert!(text.starts_with("batch 2: while lexing input.txt"), "{text}");
        match err.root() {
            LexError::UnknownState(name) => assert_eq!(name, "string"),
            e => panic!("unexpected root error: {e:?}"),
        }
    }

    #[test]
    fn io_errors_pass_through() {
        let err: LexError = io::Error::new(io::ErrorKind::PermissionDenied, "denied").into();
        assert_eq!(err.to_string(), "denied");
    }
}
