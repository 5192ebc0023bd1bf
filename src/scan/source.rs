//! Byte sources the scanner reads from
//!
//! The scanner only ever asks two things of its input: how long it is, and
//! "give me up to N bytes at offset O". A short read means end of data.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Random-access read capability consumed by the scanner
pub trait ByteSource {
    /// Total length of the stream in bytes
    fn size(&mut self) -> io::Result<u64>;

    /// Fill `buf` from `offset`, returning how many bytes were copied.
    ///
    /// Returning fewer than `buf.len()` bytes means the stream ended; it is
    /// never a transient condition.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;
}

/// In-memory source over a borrowed buffer
#[derive(Debug, Clone, Copy)]
pub struct SliceSource<'a> {
    data: &'a [u8],
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }
}

impl ByteSource for SliceSource<'_> {
    fn size(&mut self) -> io::Result<u64> {
        Ok(self.data.len() as u64)
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let start = usize::try_from(offset).map_or(self.data.len(), |o| o.min(self.data.len()));
        let available = &self.data[start..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        Ok(n)
    }
}

/// Source over any seekable reader: files, cursors, ...
///
/// The reader is owned, so a file handle is closed when the source drops,
/// whichever way the scan ends.
#[derive(Debug)]
pub struct ReaderSource<R> {
    inner: R,
    len: Option<u64>,
}

impl<R: Read + Seek> ReaderSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, len: None }
    }

    /// Use a length already known to the caller instead of seeking to the end
    pub fn with_len(inner: R, len: u64) -> Self {
        Self {
            inner,
            len: Some(len),
        }
    }
}

impl<R: Read + Seek> ByteSource for ReaderSource<R> {
    fn size(&mut self) -> io::Result<u64> {
        if let Some(len) = self.len {
            return Ok(len);
        }
        let len = self.inner.seek(SeekFrom::End(0))?;
        self.len = Some(len);
        Ok(len)
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.seek(SeekFrom::Start(offset))?;

        // Read may return short counts before EOF; keep going until the
        // buffer is full or the reader reports 0
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }
}

/// Open a path for scanning
///
/// Anything but a regular file is rejected before a single byte is parsed.
pub fn open_file(path: &Path) -> Result<ReaderSource<File>> {
    let file = File::open(path)?;
    let metadata = file.metadata()?;
    if !metadata.is_file() {
        return Err(Error::NotAFile(path.to_path_buf()));
    }
    Ok(ReaderSource::with_len(file, metadata.len()))
}

/// What to compute a duration for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A file on disk
    Path(PathBuf),
    /// An MP3 stream already held in memory
    Bytes(Vec<u8>),
}

impl From<PathBuf> for Input {
    fn from(path: PathBuf) -> Self {
        Input::Path(path)
    }
}

impl From<&Path> for Input {
    fn from(path: &Path) -> Self {
        Input::Path(path.to_path_buf())
    }
}

impl From<&str> for Input {
    fn from(path: &str) -> Self {
        Input::Path(PathBuf::from(path))
    }
}

impl From<String> for Input {
    fn from(path: String) -> Self {
        Input::Path(PathBuf::from(path))
    }
}

impl From<Vec<u8>> for Input {
    fn from(bytes: Vec<u8>) -> Self {
        Input::Bytes(bytes)
    }
}

impl From<&[u8]> for Input {
    fn from(bytes: &[u8]) -> Self {
        Input::Bytes(bytes.to_vec())
    }
}
