//! Random-access byte sources.
//!
//! The footer locator needs only two things from its input: a total length
//! and ranged reads. Local files, in-memory buffers, and remote range-read
//! wrappers all fit behind [`ChunkReader`]; the parse path never assumes a
//! particular storage medium.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};

use bytes::Bytes;

use crate::errors::Result;

pub trait Length {
    /// Total length of the byte source in bytes.
    fn len(&self) -> u64;
}

/// A source of ranged reads.
pub trait ChunkReader: Length {
    /// Reads exactly `length` bytes starting at `start`.
    fn get_bytes(&self, start: u64, length: usize) -> Result<Bytes>;
}

impl Length for Bytes {
    fn len(&self) -> u64 {
        self.as_ref().len() as u64
    }
}

impl ChunkReader for Bytes {
    fn get_bytes(&self, start: u64, length: usize) -> Result<Bytes> {
        let start = usize::try_from(start).map_err(|_| eof(start, length))?;
        let end = start.checked_add(length).ok_or_else(|| eof(start as u64, length))?;
        if end > self.as_ref().len() {
            return Err(eof(start as u64, length));
        }
        Ok(self.slice(start..end))
    }
}

impl Length for File {
    fn len(&self) -> u64 {
        self.metadata().map(|m| m.len()).unwrap_or(0)
    }
}

impl ChunkReader for File {
    fn get_bytes(&self, start: u64, length: usize) -> Result<Bytes> {
        // Read + Seek are implemented for &File, so no interior state is
        // shared between callers holding the same handle.
        let mut file = self;
        file.seek(SeekFrom::Start(start))?;
        let mut buf = vec![0; length];
        file.read_exact(&mut buf)?;
        Ok(buf.into())
    }
}

fn eof(start: u64, length: usize) -> crate::errors::ParquetError {
    io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("read of {length} bytes at offset {start} is past end of buffer"),
    )
    .into()
}
