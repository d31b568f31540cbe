//! Chunked data sources: "read N bytes at position P" over some resource.
//!
//! A source never fails because a read runs past its end; it returns a
//! short count instead, and a short count is how readers detect EOF.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};

pub trait Source {
    /// Copy up to `buffer.len()` bytes starting at absolute `position` into `buffer`.
    ///
    /// Returns the number of bytes copied. Fewer than requested means the end of
    /// the source was reached.
    fn read(&mut self, buffer: &mut [u8], position: usize) -> io::Result<usize>;

    /// Total length of the resource, in bytes.
    fn size(&mut self) -> io::Result<usize>;

    /// Read up to `length` bytes at `position` into a fresh buffer, which may be shorter.
    fn read_buffer(&mut self, length: usize, position: usize) -> io::Result<Vec<u8>> {
        let mut buffer = vec![0; length];
        let count = self.read(&mut buffer, position)?;
        buffer.truncate(count);
        Ok(buffer)
    }
}

impl<S: Source + ?Sized> Source for &mut S {
    fn read(&mut self, buffer: &mut [u8], position: usize) -> io::Result<usize> {
        (**self).read(buffer, position)
    }

    fn size(&mut self) -> io::Result<usize> {
        (**self).size()
    }
}

/// A source over a fixed in-memory byte array.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    data: Vec<u8>,
}

impl MemorySource {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        MemorySource { data: data.into() }
    }
}

impl Source for MemorySource {
    fn read(&mut self, buffer: &mut [u8], position: usize) -> io::Result<usize> {
        let available = self.data.get(position..).unwrap_or_default();
        let count = available.len().min(buffer.len());
        buffer[..count].copy_from_slice(&available[..count]);
        Ok(count)
    }

    fn size(&mut self) -> io::Result<usize> {
        Ok(self.data.len())
    }
}

/// A source over an open file.
///
/// The file is borrowed: whoever opened it is responsible for closing it.
#[derive(Debug)]
pub struct FileSource<'f> {
    file: &'f File,
}

impl<'f> FileSource<'f> {
    pub fn new(file: &'f File) -> Self {
        FileSource { file }
    }
}

impl Source for FileSource<'_> {
    fn read(&mut self, buffer: &mut [u8], position: usize) -> io::Result<usize> {
        let mut file = self.file;
        file.seek(SeekFrom::Start(position as u64))?;
        // A single read may come up short before the end of the file;
        // keep going until the buffer is full or the file is exhausted.
        let mut count = 0;
        while count < buffer.len() {
            match file.read(&mut buffer[count..]) {
                Ok(0) => break,
                Ok(n) => count += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(count)
    }

    fn size(&mut self) -> io::Result<usize> {
        let len = self.file.metadata()?.len();
        usize::try_from(len).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}
