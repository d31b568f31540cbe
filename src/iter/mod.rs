//! Cursor-based iterators over raw input.
//!
//! A `StatefulIterator` owns a read cursor into some resource and hands out
//! chunks of it. `peek` never moves the cursor; `next` and `skip` move it by
//! exactly the number of units they return, which is only less than asked for
//! at the end of the resource.
//!
//! Units depend on the variant: bytes for `ByteIterator` and
//! `BufferedByteIterator`, decoded characters for `StringIterator` and
//! `BufferedStringIterator`.

use crate::error::LexResult;

pub mod buffered;
mod memory;

pub use buffered::{BufferedByteIterator, BufferedOptions, BufferedStringIterator};
pub use memory::{ByteIterator, ItemIterator, StringIterator};

pub trait StatefulIterator {
    type Chunk: Chunk;

    /// Total length of the backing resource, in units.
    fn size(&mut self) -> LexResult<usize>;

    /// Units consumed so far.
    fn position(&self) -> usize;

    /// Up to `length` units at the cursor, without consuming them.
    fn peek(&mut self, length: usize) -> LexResult<Self::Chunk>;

    /// Up to `length` units at the cursor; the cursor moves past them.
    fn next(&mut self, length: usize) -> LexResult<Self::Chunk>;

    /// Move the cursor by up to `length` units, returning how many it moved.
    fn skip(&mut self, length: usize) -> LexResult<usize>;
}

impl<I: StatefulIterator + ?Sized> StatefulIterator for &mut I {
    type Chunk = I::Chunk;

    fn size(&mut self) -> LexResult<usize> {
        (**self).size()
    }

    fn position(&self) -> usize {
        (**self).position()
    }

    fn peek(&mut self, length: usize) -> LexResult<Self::Chunk> {
        (**self).peek(length)
    }

    fn next(&mut self, length: usize) -> LexResult<Self::Chunk> {
        (**self).next(length)
    }

    fn skip(&mut self, length: usize) -> LexResult<usize> {
        (**self).skip(length)
    }
}

/// How much of a chunk decodes as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    /// All of it.
    Complete,
    /// All but a multi-byte character cut off by the end of the chunk.
    Split,
    /// Only the bytes before an invalid sequence at this offset.
    Invalid(usize),
}

/// A piece of input that patterns can be matched against.
pub trait Chunk {
    /// Length in the iterator's units.
    fn units(&self) -> usize;

    /// The longest prefix of the chunk that is valid text, and why it stops
    /// where it does.
    fn as_text(&self) -> (&str, Decoded);

    /// Number of units that `text`, a prefix of `as_text()`, spans.
    fn units_in(text: &str) -> usize;
}

impl Chunk for Vec<u8> {
    fn units(&self) -> usize {
        self.len()
    }

    fn as_text(&self) -> (&str, Decoded) {
        match std::str::from_utf8(self) {
            Ok(text) => (text, Decoded::Complete),
            Err(e) => {
                let decoded = match e.error_len() {
                    None => Decoded::Split,
                    Some(_) => Decoded::Invalid(e.valid_up_to()),
                };
                let text = std::str::from_utf8(&self[..e.valid_up_to()]).unwrap_or_default();
                (text, decoded)
            }
        }
    }

    fn units_in(text: &str) -> usize {
        text.len()
    }
}

impl Chunk for String {
    fn units(&self) -> usize {
        self.chars().count()
    }

    fn as_text(&self) -> (&str, Decoded) {
        (self, Decoded::Complete)
    }

    fn units_in(text: &str) -> usize {
        text.chars().count()
    }
}

/// Byte length of the first `count` characters of `text` (all of it, if shorter).
pub(crate) fn char_prefix_len(text: &str, count: usize) -> usize {
    text.char_indices()
        .nth(count)
        .map(|(offset, _)| offset)
        .unwrap_or(text.len())
}
