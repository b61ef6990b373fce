use bytes::Bytes;
use dagfs_types::{ContentHash, Reference};

use crate::error::DagResult;
use crate::object::{LinkRecord, ObjectRecord, PutResult};

/// Remote object storage that nodes load themselves from.
///
/// Implementations must be `Send + Sync`; a single accessor is shared by
/// every node of a [`Merkledag`](crate::Merkledag). Transport failures are
/// reported as [`DagError::Transport`](crate::DagError::Transport) and never
/// retried by the DAG.
pub trait ObjectAccessor: Send + Sync {
    /// Raw payload stored under `hash`.
    fn object_data(&self, hash: &ContentHash) -> DagResult<Bytes>;

    /// Ordered link table of the node stored under `hash`.
    fn object_links(&self, hash: &ContentHash) -> DagResult<Vec<LinkRecord>>;

    /// Store a new node and return its identity.
    fn object_put(&self, object: &ObjectRecord) -> DagResult<PutResult>;

    /// Turn a path reference into the hash it currently names.
    fn resolve(&self, reference: &Reference) -> DagResult<ContentHash>;
}
