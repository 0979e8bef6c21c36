//! File/stream capability traits (design notes: "polymorphic file/allocator
//! abstractions... express as a capability trait consumed by the
//! codestream"). The core never touches the filesystem directly; it reads
//! and writes through these traits, with an in-memory implementation for
//! tests/library users and an OS-file implementation for the example
//! driver binary.

use crate::error::{io_failure, CoreError};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};

/// Byte-oriented input capability: read, seek, tell, eof.
pub trait InFile {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, CoreError>;
    fn seek(&mut self, pos: u64) -> Result<(), CoreError>;
    fn tell(&mut self) -> Result<u64, CoreError>;
    fn eof(&mut self) -> Result<bool, CoreError>;

    /// Reads the entire remaining contents into a freshly allocated buffer.
    fn read_to_end(&mut self) -> Result<Vec<u8>, CoreError> {
        let mut out = Vec::new();
        let mut chunk = [0u8; 8192];
        loop {
            let n = self.read(&mut chunk)?;
            if n == 0 {
                break;
            }
            out.extend_from_slice(&chunk[..n]);
        }
        Ok(out)
    }
}

/// Byte-oriented output capability: write, tell.
pub trait OutFile {
    fn write(&mut self, buf: &[u8]) -> Result<(), CoreError>;
    fn tell(&mut self) -> Result<u64, CoreError>;
}

/// An in-memory input stream backed by a borrowed byte slice.
pub struct MemoryInFile<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> MemoryInFile<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }
}

impl<'a> InFile for MemoryInFile<'a> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, CoreError> {
        let remaining = self.data.len() - self.position;
        let n = remaining.min(buf.len());
        buf[..n].copy_from_slice(&self.data[self.position..self.position + n]);
        self.position += n;
        Ok(n)
    }

    fn seek(&mut self, pos: u64) -> Result<(), CoreError> {
        if pos > self.data.len() as u64 {
            return Err(io_failure!(1, "seek past end of in-memory stream"));
        }
        self.position = pos as usize;
        Ok(())
    }

    fn tell(&mut self) -> Result<u64, CoreError> {
        Ok(self.position as u64)
    }

    fn eof(&mut self) -> Result<bool, CoreError> {
        Ok(self.position >= self.data.len())
    }
}

/// An in-memory output stream backed by an owned, growable buffer.
#[derive(Default)]
pub struct MemoryOutFile {
    data: Vec<u8>,
}

impl MemoryOutFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

impl OutFile for MemoryOutFile {
    fn write(&mut self, buf: &[u8]) -> Result<(), CoreError> {
        self.data.extend_from_slice(buf);
        Ok(())
    }

    fn tell(&mut self) -> Result<u64, CoreError> {
        Ok(self.data.len() as u64)
    }
}

/// An OS-file-backed input stream.
pub struct OsInFile {
    file: File,
}

impl OsInFile {
    pub fn open(path: &std::path::Path) -> Result<Self, CoreError> {
        let file = File::open(path).map_err(|e| io_failure!(2, "open {:?}: {e}", path))?;
        Ok(Self { file })
    }
}

impl InFile for OsInFile {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, CoreError> {
        self.file.read(buf).map_err(|e| io_failure!(3, "read: {e}"))
    }

    fn seek(&mut self, pos: u64) -> Result<(), CoreError> {
        self.file
            .seek(SeekFrom::Start(pos))
            .map(|_| ())
            .map_err(|e| io_failure!(4, "seek: {e}"))
    }

    fn tell(&mut self) -> Result<u64, CoreError> {
        self.file
            .stream_position()
            .map_err(|e| io_failure!(5, "tell: {e}"))
    }

    fn eof(&mut self) -> Result<bool, CoreError> {
        let pos = self.tell()?;
        let len = self
            .file
            .metadata()
            .map_err(|e| io_failure!(6, "metadata: {e}"))?
            .len();
        Ok(pos >= len)
    }
}

/// An OS-file-backed output stream.
pub struct OsOutFile {
    file: File,
    position: u64,
}

impl OsOutFile {
    pub fn create(path: &std::path::Path) -> Result<Self, CoreError> {
        let file = File::create(path).map_err(|e| io_failure!(7, "create {:?}: {e}", path))?;
        Ok(Self { file, position: 0 })
    }
}

impl OutFile for OsOutFile {
    fn write(&mut self, buf: &[u8]) -> Result<(), CoreError> {
        self.file
            .write_all(buf)
            .map_err(|e| io_failure!(8, "write: {e}"))?;
        self.position += buf.len() as u64;
        Ok(())
    }

    fn tell(&mut self) -> Result<u64, CoreError> {
        Ok(self.position)
    }
}
