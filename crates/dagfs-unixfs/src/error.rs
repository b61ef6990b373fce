use std::io;

use dagfs_codec::CodecError;
use dagfs_dag::DagError;
use dagfs_types::ContentHash;

/// Errors from unixfs operations.
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    #[error("invalid mode: {0:?}")]
    InvalidMode(String),

    #[error("not a file: {hash} is a {kind}")]
    NotAFile { hash: ContentHash, kind: String },

    #[error("not a directory: {hash} is a {kind}")]
    NotADirectory { hash: ContentHash, kind: String },

    /// The number of declared block sizes differs from the number of links.
    #[error("malformed file node {hash}: {blocksizes} block sizes for {links} links")]
    MalformedFileNode {
        hash: ContentHash,
        blocksizes: usize,
        links: usize,
    },

    /// A payload that is not a unixfs `Data` message, or a block shorter
    /// than its declared size.
    #[error("invalid unixfs node {hash}: {reason}")]
    InvalidNode { hash: ContentHash, reason: String },

    #[error("no such file or directory: {0}")]
    NotFound(String),

    #[error("invalid path: {0:?}")]
    InvalidPath(String),

    #[error("{0} is not implemented")]
    NotImplemented(&'static str),

    #[error("stream not opened for reading")]
    NotReadable,

    #[error("stream is closed")]
    Closed,

    #[error("seek to a negative position")]
    InvalidSeek,

    #[error("stream opened in binary mode")]
    BinaryMode,

    #[error("file content is not valid UTF-8")]
    InvalidUtf8,

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Dag(#[from] DagError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl From<FsError> for io::Error {
    fn from(err: FsError) -> Self {
        let kind = match &err {
            FsError::Io(inner) => inner.kind(),
            FsError::NotFound(_) => io::ErrorKind::NotFound,
            FsError::InvalidMode(_)
            | FsError::InvalidPath(_)
            | FsError::InvalidSeek
            | FsError::BinaryMode => {
                io::ErrorKind::InvalidInput
            }
            FsError::NotImplemented(_) | FsError::NotReadable => io::ErrorKind::Unsupported,
            FsError::InvalidUtf8 => io::ErrorKind::InvalidData,
            _ => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}

pub type FsResult<T> = Result<T, FsError>;
