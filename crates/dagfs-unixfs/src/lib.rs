//! Unixfs files and directories for dagfs.
//!
//! [`UnixFs`] decodes node payloads as unixfs `Data` messages. A [`File`]
//! maps its logical byte range onto blocks through a [`BlockIndex`] and is
//! read through a seekable [`FileStream`]. A [`Directory`] resolves
//! slash-separated paths by link name.
//!
//! Only reading is implemented. Write paths fail with
//! [`FsError::NotImplemented`].

pub mod dir;
pub mod error;
pub mod file;
pub mod fs;
pub mod index;
pub mod mode;
pub mod stream;

#[cfg(test)]
mod testutil;

pub use dir::Directory;
pub use error::{FsError, FsResult};
pub use file::File;
pub use fs::{Stat, UnixFs};
pub use index::{BlockIndex, BlockSource, Chunk, Chunks, FileBlock};
pub use mode::OpenMode;
pub use stream::FileStream;
