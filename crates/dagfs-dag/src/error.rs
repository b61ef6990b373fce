//! Error types for merkledag operations.

use dagfs_codec::CodecError;
use dagfs_types::{ContentHash, TypeError};

/// Errors that can occur while loading or building nodes.
#[derive(Debug, thiserror::Error)]
pub enum DagError {
    /// The node has no link with the requested name.
    #[error("no link named {name:?} in node {node}")]
    LinkNotFound {
        /// The node whose link table was searched.
        node: ContentHash,
        /// The missing link name.
        name: String,
    },

    /// No object is stored under the hash.
    #[error("object not found: {0}")]
    NotFound(ContentHash),

    /// A reference could not be turned into a hash.
    #[error("cannot resolve {0}")]
    Unresolvable(String),

    /// A node already has a link with this name.
    #[error("duplicate link name {0:?}")]
    DuplicateLink(String),

    /// An object's link table or payload does not have the expected shape.
    #[error("malformed object: {0}")]
    Malformed(String),

    /// The operation exists in the interface but has no implementation.
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),

    /// Payload encode or decode failed.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Invalid hash or reference text.
    #[error(transparent)]
    Type(#[from] TypeError),

    /// Failure reported by the object accessor's transport, passed through
    /// unmodified.
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl DagError {
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Box::new(err))
    }
}

/// Convenience alias for DAG results.
pub type DagResult<T> = Result<T, DagError>;
