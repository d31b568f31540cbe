//! Rule-driven lexing toolkit.
//!
//! Input flows through three layers, each a lazy, pull-based stream:
//!
//! 1.  A `StatefulIterator` over the raw input: in-memory bytes, strings or
//!     items, or blocks pulled on demand from a `Source`.
//! 2.  A `Tokenizer`, which matches ordered pattern/action rules against a
//!     bounded window of that input and emits named `Token`s. Rule actions
//!     push and pop lexer states to switch rule sets.
//! 3.  A `Combiner`, which folds START...END runs of tokens into single tokens.
//!
//! `Machine` and `MachineState` are an alternative to the tokenizer for
//! constructs that are easier to lex recursively, one state object per construct.

mod error;
mod pattern;

pub mod combiner;
pub mod iter;
pub mod machine;
pub mod source;
pub mod token;
pub mod tokenizer;

pub use combiner::{Combiner, CombinerOptions, GroupName, Span};
pub use error::{LexError, LexResult};
pub use iter::{
    BufferedByteIterator, BufferedOptions, BufferedStringIterator, ByteIterator, Chunk,
    Decoded, ItemIterator, StatefulIterator, StringIterator,
};
pub use machine::{Machine, MachineState, StateRules, Step};
pub use source::{FileSource, MemorySource, Source};
pub use token::{Token, END, EOF, START};
pub use tokenizer::{LexContext, Rule, Tokenizer, TokenizerOptions};
