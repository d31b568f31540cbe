//! Iterators that pull fixed-size blocks from a `Source` on demand.
//!
//! Both variants keep an accumulation buffer of bytes already fetched but not
//! yet consumed. A request for more than is buffered reads whole blocks at the
//! absolute fetch cursor until the request is covered or a read comes back
//! short, which marks the end of the source. Consumed units are sliced off the
//! front of the buffer.

use tracing::debug;

use super::{char_prefix_len, StatefulIterator};
use crate::error::{LexError, LexResult};
use crate::source::Source;

/// Block read configuration.
#[derive(Debug, Clone, Copy)]
pub struct BufferedOptions {
    /// Bytes requested from the source per read.
    pub block_size: usize,
}

impl Default for BufferedOptions {
    fn default() -> Self {
        BufferedOptions { block_size: 1024 }
    }
}

/// Fetch state shared by both buffered variants.
#[derive(Debug)]
struct Blocks<S> {
    source: S,
    block_size: usize,
    buffer: Vec<u8>,
    /// Absolute position of the next byte to fetch from the source.
    fetched: usize,
}

impl<S: Source> Blocks<S> {
    fn new(source: S, options: BufferedOptions) -> Self {
        Blocks {
            source,
            block_size: options.block_size.max(1),
            buffer: Vec::new(),
            fetched: 0,
        }
    }

    /// Read one block onto the end of the buffer.
    ///
    /// Returns true if the read came back short, i.e. the source is exhausted.
    fn read_block(&mut self) -> LexResult<bool> {
        let start = self.buffer.len();
        self.buffer.resize(start + self.block_size, 0);
        let count = match self.source.read(&mut self.buffer[start..], self.fetched) {
            Ok(count) => count,
            Err(e) => {
                self.buffer.truncate(start);
                return Err(e.into());
            }
        };
        self.buffer.truncate(start + count);
        self.fetched += count;
        debug!(
            position = self.fetched - count,
            requested = self.block_size,
            count,
            "read block"
        );
        Ok(count < self.block_size)
    }

    /// Fetch until at least `length` bytes are buffered or the source runs out.
    fn fill_bytes(&mut self, length: usize) -> LexResult<()> {
        while self.buffer.len() < length {
            if self.read_block()? {
                break;
            }
        }
        Ok(())
    }
}

/// Byte iterator over a `Source`.
///
/// The source is not closed by this iterator; recover it with `into_source`.
#[derive(Debug)]
pub struct BufferedByteIterator<S> {
    blocks: Blocks<S>,
}

impl<S: Source> BufferedByteIterator<S> {
    pub fn new(source: S) -> Self {
        Self::with_options(source, BufferedOptions::default())
    }

    pub fn with_options(source: S, options: BufferedOptions) -> Self {
        BufferedByteIterator {
            blocks: Blocks::new(source, options),
        }
    }

    pub fn into_source(self) -> S {
        self.blocks.source
    }

    fn available(&mut self, length: usize) -> LexResult<usize> {
        self.blocks.fill_bytes(length)?;
        Ok(length.min(self.blocks.buffer.len()))
    }
}

impl<S: Source> StatefulIterator for BufferedByteIterator<S> {
    type Chunk = Vec<u8>;

    fn size(&mut self) -> LexResult<usize> {
        Ok(self.blocks.source.size()?)
    }

    fn position(&self) -> usize {
        self.blocks.fetched - self.blocks.buffer.len()
    }

    fn peek(&mut self, length: usize) -> LexResult<Vec<u8>> {
        let count = self.available(length)?;
        Ok(self.blocks.buffer[..count].to_vec())
    }

    fn next(&mut self, length: usize) -> LexResult<Vec<u8>> {
        let count = self.available(length)?;
        Ok(self.blocks.buffer.drain(..count).collect())
    }

    fn skip(&mut self, length: usize) -> LexResult<usize> {
        let count = self.available(length)?;
        self.blocks.buffer.drain(..count);
        Ok(count)
    }
}

/// Character iterator over a UTF-8 encoded `Source`.
///
/// `position` counts decoded characters. `size` reports the source's length in
/// bytes, an upper bound on its characters that needs no reading; the exact
/// count is `char_count`.
#[derive(Debug)]
pub struct BufferedStringIterator<S> {
    blocks: Blocks<S>,
    position: usize,
    chars: Option<usize>,
}

/// What follows the decodable prefix of the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tail {
    /// Nothing; the whole buffer decoded.
    Complete,
    /// The start of a multi-byte sequence that the next block may complete.
    Partial,
    /// Bytes that can never decode.
    Invalid,
}

/// The valid UTF-8 prefix of `bytes`, and what follows it.
fn decode_prefix(bytes: &[u8]) -> (&str, Tail) {
    match std::str::from_utf8(bytes) {
        Ok(text) => (text, Tail::Complete),
        Err(e) => {
            let tail = if e.error_len().is_none() {
                Tail::Partial
            } else {
                Tail::Invalid
            };
            let text = std::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or_default();
            (text, tail)
        }
    }
}

/// True for the second and later bytes of a multi-byte UTF-8 sequence.
fn is_continuation(byte: u8) -> bool {
    byte & 0xC0 == 0x80
}

impl<S: Source> BufferedStringIterator<S> {
    pub fn new(source: S) -> Self {
        Self::with_options(source, BufferedOptions::default())
    }

    pub fn with_options(source: S, options: BufferedOptions) -> Self {
        BufferedStringIterator {
            blocks: Blocks::new(source, options),
            position: 0,
            chars: None,
        }
    }

    pub fn into_source(self) -> S {
        self.blocks.source
    }

    /// Number of characters in the whole source.
    ///
    /// The first call reads the source from the start, in blocks of its own,
    /// and counts the bytes that begin a character. The cursor and buffer are
    /// left alone; invalid bytes still fail when a request reaches them.
    pub fn char_count(&mut self) -> LexResult<usize> {
        if let Some(chars) = self.chars {
            return Ok(chars);
        }
        let mut block = vec![0; self.blocks.block_size];
        let mut position = 0;
        let mut chars = 0;
        loop {
            let count = self.blocks.source.read(&mut block, position)?;
            chars += block[..count]
                .iter()
                .filter(|&&byte| !is_continuation(byte))
                .count();
            position += count;
            if count < block.len() {
                break;
            }
        }
        debug!(bytes = position, chars, "counted characters");
        self.chars = Some(chars);
        Ok(chars)
    }

    /// Fetch until `length` characters are decodable or the source runs out.
    ///
    /// Undecodable bytes are only an error once a request reaches them.
    fn fill(&mut self, length: usize) -> LexResult<()> {
        loop {
            let (text, tail) = decode_prefix(&self.blocks.buffer);
            let chars = text.chars().count();
            if chars >= length {
                return Ok(());
            }
            if tail == Tail::Invalid {
                return Err(LexError::Decode {
                    position: self.position + chars,
                });
            }
            if self.blocks.read_block()? {
                break;
            }
        }
        // No more bytes are coming, so a trailing partial sequence will never complete.
        let (text, tail) = decode_prefix(&self.blocks.buffer);
        let chars = text.chars().count();
        if chars < length && tail != Tail::Complete {
            return Err(LexError::Decode {
                position: self.position + chars,
            });
        }
        Ok(())
    }

    /// The first `length` characters in the buffer, and their byte length.
    fn window(&mut self, length: usize) -> LexResult<(String, usize)> {
        self.fill(length)?;
        let (text, _) = decode_prefix(&self.blocks.buffer);
        let bytes = char_prefix_len(text, length);
        Ok((text[..bytes].to_owned(), bytes))
    }

    fn consume(&mut self, bytes: usize, chars: usize) {
        self.blocks.buffer.drain(..bytes);
        self.position += chars;
    }
}

impl<S: Source> StatefulIterator for BufferedStringIterator<S> {
    type Chunk = String;

    fn size(&mut self) -> LexResult<usize> {
        Ok(self.blocks.source.size()?)
    }

    fn position(&self) -> usize {
        self.position
    }

    fn peek(&mut self, length: usize) -> LexResult<String> {
        Ok(self.window(length)?.0)
    }

    fn next(&mut self, length: usize) -> LexResult<String> {
        let (chunk, bytes) = self.window(length)?;
        self.consume(bytes, chunk.chars().count());
        Ok(chunk)
    }

    fn skip(&mut self, length: usize) -> LexResult<usize> {
        let (chunk, bytes) = self.window(length)?;
        let chars = chunk.chars().count();
        self.consume(bytes, chars);
        Ok(chars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use pretty_assertions::assert_eq;
    use std::io;

    /// Counts the reads issued against the wrapped source.
    struct Counting {
        inner: MemorySource,
        reads: Vec<(usize, usize)>,
    }

    impl Source for Counting {
        fn read(&mut self, buffer: &mut [u8], position: usize) -> io::Result<usize> {
            self.reads.push((position, buffer.len()));
            self.inner.read(buffer, position)
        }

        fn size(&mut self) -> io::Result<usize> {
            self.inner.size()
        }
    }

    struct Broken;

    impl Source for Broken {
        fn read(&mut self, _: &mut [u8], _: usize) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk on fire"))
        }

        fn size(&mut self) -> io::Result<usize> {
            Ok(100)
        }
    }

    fn small_blocks() -> BufferedOptions {
        BufferedOptions { block_size: 4 }
    }

    #[test]
    fn bytes_fetch_blocks_on_demand() {
        let mut source = Counting {
            inner: MemorySource::new("abcdefghij"),
            reads: Vec::new(),
        };
        let mut it = BufferedByteIterator::with_options(&mut source, small_blocks());

        assert_eq!(it.peek(2).unwrap(), b"ab".to_vec());
        assert_eq!(it.peek(6).unwrap(), b"abcdef".to_vec());
        assert_eq!(it.position(), 0);
        assert_eq!(it.next(5).unwrap(), b"abcde".to_vec());
        assert_eq!(it.position(), 5);
        assert_eq!(it.skip(10).unwrap(), 5);
        assert_eq!(it.position(), 10);
        assert_eq!(it.next(3).unwrap(), Vec::<u8>::new());
        assert_eq!(it.size().unwrap(), 10);
        drop(it);

        // Two full blocks, then a short one that marks EOF.
        assert_eq!(&source.reads[..3], &[(0, 4), (4, 4), (8, 4)]);
    }

    #[test]
    fn bytes_short_read_stops_fetching() {
        let mut source = Counting {
            inner: MemorySource::new("abc"),
            reads: Vec::new(),
        };
        let mut it = BufferedByteIterator::with_options(&mut source, small_blocks());
        assert_eq!(it.peek(100).unwrap(), b"abc".to_vec());
        drop(it);
        assert_eq!(source.reads, vec![(0, 4)]);
    }

    #[test]
    fn source_errors_propagate() {
        let mut it = BufferedByteIterator::new(Broken);
        match it.peek(1) {
            Err(LexError::Io(e)) => assert_eq!(e.to_string(), "disk on fire"),
            v => panic!("unexpected result: {v:?}"),
        }
        assert_eq!(it.position(), 0);

        let mut it = BufferedStringIterator::new(Broken);
        assert!(matches!(it.next(1), Err(LexError::Io(_))));
    }

    #[test]
    fn string_characters_across_blocks() {
        // Each "é" straddles a block boundary somewhere with 4-byte blocks.
        let text = "a\u{e9}\u{e9}\u{e9}b\u{e9}";
        let mut it =
            BufferedStringIterator::with_options(MemorySource::new(text), small_blocks());
        assert_eq!(it.size().unwrap(), text.len());

        assert_eq!(it.peek(2).unwrap(), "a\u{e9}");
        assert_eq!(it.next(3).unwrap(), "a\u{e9}\u{e9}");
        assert_eq!(it.position(), 3);
        assert_eq!(it.skip(2).unwrap(), 2);
        assert_eq!(it.position(), 5);
        assert_eq!(it.next(5).unwrap(), "\u{e9}");
        assert_eq!(it.position(), 6);
        assert_eq!(it.next(5).unwrap(), "");
        assert_eq!(it.skip(5).unwrap(), 0);
    }

    #[test]
    fn string_char_count_is_lazy_and_cached() {
        let text = "a\u{e9}\u{e9}\u{e9}b\u{e9}";
        let mut source = Counting {
            inner: MemorySource::new(text),
            reads: Vec::new(),
        };
        let mut it = BufferedStringIterator::with_options(&mut source, small_blocks());
        assert_eq!(it.next(2).unwrap(), "a\u{e9}");
        let before = it.position();

        assert_eq!(it.char_count().unwrap(), 6);
        assert_eq!(it.size().unwrap(), 10);
        assert_eq!(it.position(), before);
        assert_eq!(it.next(10).unwrap(), "\u{e9}\u{e9}b\u{e9}");

        let reads = it.blocks.source.reads.len();
        assert_eq!(it.char_count().unwrap(), 6);
        assert_eq!(it.blocks.source.reads.len(), reads);
    }

    #[test]
    fn string_invalid_utf8() {
        let mut it = BufferedStringIterator::with_options(
            MemorySource::new(vec![b'o', b'k', 0xff, b'!']),
            small_blocks(),
        );
        assert_eq!(it.next(1).unwrap(), "o");
        match it.peek(3) {
            Err(LexError::Decode { position }) => assert_eq!(position, 2),
            v => panic!("unexpected result: {v:?}"),
        }
    }

    #[test]
    fn string_truncated_sequence_at_eof() {
        let bytes = "x\u{e9}".as_bytes();
        let mut it = BufferedStringIterator::new(MemorySource::new(&bytes[..2]));
        assert_eq!(it.next(1).unwrap(), "x");
        assert!(matches!(it.peek(1), Err(LexError::Decode { position: 1 })));
    }
}
