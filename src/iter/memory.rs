//! Iterators over data held entirely in memory.

use super::{char_prefix_len, StatefulIterator};
use crate::error::LexResult;

/// Iterator over an owned byte buffer.
#[derive(Debug, Clone)]
pub struct ByteIterator {
    data: Vec<u8>,
    position: usize,
}

impl ByteIterator {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        ByteIterator {
            data: data.into(),
            position: 0,
        }
    }

    fn window(&self, length: usize) -> &[u8] {
        let rest = &self.data[self.position..];
        &rest[..length.min(rest.len())]
    }
}

impl StatefulIterator for ByteIterator {
    type Chunk = Vec<u8>;

    fn size(&mut self) -> LexResult<usize> {
        Ok(self.data.len())
    }

    fn position(&self) -> usize {
        self.position
    }

    fn peek(&mut self, length: usize) -> LexResult<Vec<u8>> {
        Ok(self.window(length).to_vec())
    }

    fn next(&mut self, length: usize) -> LexResult<Vec<u8>> {
        let chunk = self.window(length).to_vec();
        self.position += chunk.len();
        Ok(chunk)
    }

    fn skip(&mut self, length: usize) -> LexResult<usize> {
        let skipped = self.window(length).len();
        self.position += skipped;
        Ok(skipped)
    }
}

/// Iterator over an owned string, measured in characters rather than bytes.
#[derive(Debug, Clone)]
pub struct StringIterator {
    text: String,
    /// Size in characters.
    size: usize,
    /// Position in characters.
    position: usize,
    /// Byte offset of `position` within `text`.
    offset: usize,
}

impl StringIterator {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        StringIterator {
            size: text.chars().count(),
            text,
            position: 0,
            offset: 0,
        }
    }

    fn window(&self, length: usize) -> &str {
        let rest = &self.text[self.offset..];
        &rest[..char_prefix_len(rest, length)]
    }

    fn advance(&mut self, length: usize) -> usize {
        let rest = &self.text[self.offset..];
        let bytes = char_prefix_len(rest, length);
        let chars = rest[..bytes].chars().count();
        self.offset += bytes;
        self.position += chars;
        chars
    }
}

impl StatefulIterator for StringIterator {
    type Chunk = String;

    fn size(&mut self) -> LexResult<usize> {
        Ok(self.size)
    }

    fn position(&self) -> usize {
        self.position
    }

    fn peek(&mut self, length: usize) -> LexResult<String> {
        Ok(self.window(length).to_owned())
    }

    fn next(&mut self, length: usize) -> LexResult<String> {
        let chunk = self.window(length).to_owned();
        self.advance(length);
        Ok(chunk)
    }

    fn skip(&mut self, length: usize) -> LexResult<usize> {
        Ok(self.advance(length))
    }
}

/// Iterator over arbitrary items, one at a time.
///
/// Unlike the chunked iterators, `next` and `peek` deal in single items and
/// `skip` reports only whether the cursor moved.
#[derive(Debug, Clone)]
pub struct ItemIterator<T> {
    items: std::vec::IntoIter<T>,
    size: usize,
    position: usize,
}

impl<T> ItemIterator<T> {
    pub fn new(items: impl Into<Vec<T>>) -> Self {
        let items = items.into();
        ItemIterator {
            size: items.len(),
            items: items.into_iter(),
            position: 0,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn peek(&self) -> Option<&T> {
        self.items.as_slice().first()
    }

    /// The item at the cursor; the cursor moves past it.
    pub fn next(&mut self) -> Option<T> {
        let item = self.items.next()?;
        self.position += 1;
        Some(item)
    }

    /// Step over one item. Returns false at the end of the items.
    pub fn skip(&mut self) -> bool {
        self.next().is_some()
    }
}

impl<T> FromIterator<T> for ItemIterator<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        ItemIterator::new(iter.into_iter().collect::<Vec<_>>())
    }
}
