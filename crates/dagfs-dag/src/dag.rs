use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use dagfs_codec::{Codec, Value};
use dagfs_types::{ContentHash, Reference};
use tracing::debug;

use crate::accessor::ObjectAccessor;
use crate::builder::NodeBuilder;
use crate::error::{DagError, DagResult};
use crate::node::Node;

struct DagInner {
    accessor: Arc<dyn ObjectAccessor>,
    codec: Option<Arc<dyn Codec>>,
}

/// Entry point for loading nodes.
///
/// Cheap to clone; every clone shares one accessor and codec. Nodes and
/// links keep a handle so that following a link needs no extra context.
#[derive(Clone)]
pub struct Merkledag {
    inner: Arc<DagInner>,
}

impl Merkledag {
    /// A DAG whose node values are the raw payload bytes.
    pub fn new(accessor: Arc<dyn ObjectAccessor>) -> Self {
        Self {
            inner: Arc::new(DagInner {
                accessor,
                codec: None,
            }),
        }
    }

    /// A DAG that decodes every payload with `codec`.
    pub fn with_codec(accessor: Arc<dyn ObjectAccessor>, codec: Arc<dyn Codec>) -> Self {
        Self {
            inner: Arc::new(DagInner {
                accessor,
                codec: Some(codec),
            }),
        }
    }

    pub fn accessor(&self) -> &Arc<dyn ObjectAccessor> {
        &self.inner.accessor
    }

    pub fn codec(&self) -> Option<&Arc<dyn Codec>> {
        self.inner.codec.as_ref()
    }

    /// Hash named by `reference`. Paths other than `/ipfs/<hash>` go through
    /// the accessor.
    pub fn resolve(&self, reference: &Reference) -> DagResult<ContentHash> {
        match reference.direct_hash() {
            Some(hash) => Ok(hash),
            None => {
                let hash = self.inner.accessor.resolve(reference)?;
                debug!(%reference, %hash, "resolved reference");
                Ok(hash)
            }
        }
    }

    /// Load the node named by `reference`. Only resolution happens eagerly;
    /// content and links load on first access.
    pub fn get(&self, reference: &Reference) -> DagResult<Node> {
        Ok(self.node(self.resolve(reference)?))
    }

    /// Parse `reference` and [`get`](Self::get) it.
    pub fn get_str(&self, reference: &str) -> DagResult<Node> {
        self.get(&Reference::parse(reference)?)
    }

    /// A fresh lazy node for `hash`. Never touches the accessor.
    pub fn node(&self, hash: ContentHash) -> Node {
        Node::new(self.clone(), hash)
    }

    pub fn builder(&self) -> NodeBuilder {
        NodeBuilder::new(self.clone())
    }

    pub(crate) fn decode_value(&self, raw: Bytes) -> DagResult<Value> {
        match &self.inner.codec {
            Some(codec) => Ok(codec.decode(raw)?),
            None => Ok(Value::Bytes(raw)),
        }
    }

    pub(crate) fn encode_value(&self, value: &Value) -> DagResult<Bytes> {
        match (&self.inner.codec, value) {
            (Some(codec), value) => Ok(codec.encode(value)?.into()),
            (None, Value::Bytes(raw)) => Ok(raw.clone()),
            (None, _) => Err(DagError::Malformed(format!(
                "cannot store a {} value without a codec",
                value.kind_name()
            ))),
        }
    }
}

impl fmt::Debug for Merkledag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Merkledag")
            .field("codec", &self.inner.codec.as_ref().map(|c| c.name()))
            .finish()
    }
}
