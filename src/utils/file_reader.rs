//! File reading and line splitting.
//!
//! The engine never touches the filesystem itself; index building and
//! directory search get their text from here.

use crate::error::{Error, Result};
use memmap2::Mmap;
use std::borrow::Cow;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Files at least this large are memory-mapped instead of read
pub const MMAP_THRESHOLD: u64 = 64 * 1024;

/// Raw file content
pub enum FileContent {
    Buffered(Vec<u8>),
    Mapped(Mmap),
}

impl FileContent {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            FileContent::Buffered(bytes) => bytes,
            FileContent::Mapped(map) => map,
        }
    }

    /// Decode as UTF-8, replacing invalid sequences
    pub fn to_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.as_bytes())
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

/// Size-gated file reader
#[derive(Debug, Clone, Copy)]
pub struct FileReader {
    max_size: u64,
}

impl FileReader {
    pub fn new(max_size: u64) -> Self {
        Self { max_size }
    }

    /// Read a file. Returns `Ok(None)` for files over the size limit.
    pub fn read(&self, path: &Path) -> Result<Option<FileContent>> {
        let mut file = File::open(path).map_err(|e| Error::io(path, e))?;
        let size = file.metadata().map_err(|e| Error::io(path, e))?.len();

        if size > self.max_size {
            tracing::debug!(path = %path.display(), size, "skipping oversized file");
            return Ok(None);
        }

        if size >= MMAP_THRESHOLD {
            // Safety: the map is read-only and dropped with the content
            let map = unsafe { Mmap::map(&file) }.map_err(|e| Error::io(path, e))?;
            return Ok(Some(FileContent::Mapped(map)));
        }

        let mut bytes = Vec::with_capacity(size as usize);
        file.read_to_end(&mut bytes)
            .map_err(|e| Error::io(path, e))?;
        Ok(Some(FileContent::Buffered(bytes)))
    }
}

/// Byte offset at which each line starts. Always contains 0.
pub fn line_starts(bytes: &[u8]) -> Vec<usize> {
    let mut starts = vec![0];
    starts.extend(memchr::memchr_iter(b'\n', bytes).map(|i| i + 1));
    starts
}

/// Text of 1-based `line`, without its terminator
pub fn line_text<'a>(text: &'a str, starts: &[usize], line: usize) -> &'a str {
    let Some(&begin) = line.checked_sub(1).and_then(|i| starts.get(i)) else {
        return "";
    };
    let end = starts
        .get(line)
        .map(|&next| next - 1)
        .unwrap_or(text.len());
    text.get(begin..end).unwrap_or("")
}
