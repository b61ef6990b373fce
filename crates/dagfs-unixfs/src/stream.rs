use std::fmt;
use std::io::{self, Read, Seek, SeekFrom};

use crate::error::{FsError, FsResult};
use crate::file::File;
use crate::mode::OpenMode;

/// Largest single copy `read_bytes` makes into its scratch buffer.
const READ_STEP: u64 = 256 * 1024;

/// A cursor over an open [`File`].
///
/// Not synchronized: share a stream between threads only behind a lock.
pub struct FileStream {
    file: File,
    mode: OpenMode,
    pos: u64,
    closed: bool,
}

impl FileStream {
    pub(crate) fn new(file: File, mode: OpenMode) -> FsResult<Self> {
        if mode.truncate {
            return Err(FsError::NotImplemented("truncate"));
        }
        let pos = if mode.append { file.size() } else { 0 };
        Ok(Self {
            file,
            mode,
            pos,
            closed: false,
        })
    }

    pub fn file(&self) -> &File {
        &self.file
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    pub fn readable(&self) -> bool {
        self.mode.reading
    }

    pub fn writable(&self) -> bool {
        self.mode.writing
    }

    pub fn seekable(&self) -> bool {
        true
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn check_open(&self) -> FsResult<()> {
        if self.closed {
            return Err(FsError::Closed);
        }
        Ok(())
    }

    fn check_readable(&self) -> FsResult<()> {
        self.check_open()?;
        if !self.mode.reading {
            return Err(FsError::NotReadable);
        }
        Ok(())
    }

    /// Read into `buf` at the cursor, returning the number of bytes copied.
    pub fn read_into(&mut self, buf: &mut [u8]) -> FsResult<usize> {
        self.check_readable()?;
        let n = self.file.read_at(self.pos, buf)?;
        self.pos += n as u64;
        Ok(n)
    }

    /// Read up to `n` bytes, or everything up to end-of-file when `n` is
    /// `None`.
    ///
    /// The buffer grows with the bytes actually read, so a root claiming a
    /// huge `filesize` costs no more than the data behind it.
    pub fn read_bytes(&mut self, n: Option<usize>) -> FsResult<Vec<u8>> {
        self.check_readable()?;
        let remaining = self.file.size().saturating_sub(self.pos);
        let mut want = n.map_or(remaining, |n| (n as u64).min(remaining));
        let mut out = Vec::new();
        let mut step = vec![0u8; want.min(READ_STEP) as usize];
        while want > 0 {
            let len = want.min(step.len() as u64) as usize;
            let read = self.read_into(&mut step[..len])?;
            if read == 0 {
                break;
            }
            out.extend_from_slice(&step[..read]);
            want -= read as u64;
        }
        Ok(out)
    }

    /// Read the rest of the file as UTF-8 text. Only text-mode streams
    /// (`"r"`, `"rt"`, `"r+"`) decode; binary streams use [`read_bytes`].
    ///
    /// [`read_bytes`]: FileStream::read_bytes
    pub fn read_text(&mut self) -> FsResult<String> {
        self.check_readable()?;
        if !self.mode.text {
            return Err(FsError::BinaryMode);
        }
        let bytes = self.read_bytes(None)?;
        String::from_utf8(bytes).map_err(|_| FsError::InvalidUtf8)
    }

    pub fn tell(&self) -> u64 {
        self.pos
    }

    /// Move the cursor. Positions past end-of-file are allowed.
    pub fn seek_to(&mut self, target: SeekFrom) -> FsResult<u64> {
        self.check_open()?;
        let pos = match target {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::Current(delta) => self.pos.checked_add_signed(delta),
            SeekFrom::End(delta) => self.file.size().checked_add_signed(delta),
        };
        self.pos = pos.ok_or(FsError::InvalidSeek)?;
        Ok(self.pos)
    }

    pub fn write(&mut self, _data: &[u8]) -> FsResult<usize> {
        self.check_open()?;
        Err(FsError::NotImplemented("write"))
    }

    pub fn truncate(&mut self, _size: Option<u64>) -> FsResult<()> {
        self.check_open()?;
        Err(FsError::NotImplemented("truncate"))
    }

    /// Close the stream. Closing twice is a no-op.
    pub fn close(&mut self) {
        self.closed = true;
    }
}

impl Read for FileStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.read_into(buf)?)
    }
}

impl Seek for FileStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Ok(self.seek_to(pos)?)
    }
}

impl fmt::Debug for FileStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileStream")
            .field("hash", self.file.node().hash())
            .field("mode", &self.mode.to_string())
            .field("pos", &self.pos)
            .field("closed", &self.closed)
            .finish()
    }
}
