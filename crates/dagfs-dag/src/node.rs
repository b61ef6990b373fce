//! Lazily-loaded merkledag nodes and the links between them.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use bytes::Bytes;
use dagfs_codec::Value;
use dagfs_types::{ContentHash, Namespace, Reference};
use tracing::debug;

use crate::cell::LazyCell;
use crate::dag::Merkledag;
use crate::error::{DagError, DagResult};
use crate::object::{LinkRecord, ObjectRecord};

struct NodeContent {
    raw: Bytes,
    value: Arc<Value>,
}

struct LinkTable {
    links: Vec<Link>,
    /// First link wins when names collide.
    by_name: HashMap<String, usize>,
}

impl LinkTable {
    fn new(links: Vec<Link>) -> Self {
        let mut by_name = HashMap::with_capacity(links.len());
        for (i, link) in links.iter().enumerate() {
            by_name.entry(link.name.clone()).or_insert(i);
        }
        Self { links, by_name }
    }

    fn get(&self, name: &str) -> Option<&Link> {
        self.by_name.get(name).map(|&i| &self.links[i])
    }
}

/// A node of the DAG, identified by its content hash.
///
/// Content and links are fetched from the accessor on first use, at most
/// once each, and cached until [`flush`](Self::flush). Caches belong to this
/// instance: two `Node`s for the same hash load independently but compare
/// equal.
pub struct Node {
    hash: ContentHash,
    dag: Merkledag,
    content: LazyCell<NodeContent>,
    links: LazyCell<LinkTable>,
}

impl Node {
    pub(crate) fn new(dag: Merkledag, hash: ContentHash) -> Self {
        Self {
            hash,
            dag,
            content: LazyCell::new(),
            links: LazyCell::new(),
        }
    }

    pub fn hash(&self) -> &ContentHash {
        &self.hash
    }

    pub fn dag(&self) -> &Merkledag {
        &self.dag
    }

    /// `/ipfs/<hash>`
    pub fn reference(&self) -> Reference {
        Reference::Path {
            namespace: Namespace::Ipfs,
            path: self.hash.to_string(),
        }
    }

    fn content(&self) -> DagResult<Arc<NodeContent>> {
        self.content.get_or_try_init(|| {
            let raw = self.dag.accessor().object_data(&self.hash)?;
            debug!(hash = %self.hash, bytes = raw.len(), "loaded node content");
            let value = self.dag.decode_value(raw.clone())?;
            Ok(NodeContent {
                raw,
                value: Arc::new(value),
            })
        })
    }

    fn link_table(&self) -> DagResult<Arc<LinkTable>> {
        self.links.get_or_try_init(|| {
            let records = self.dag.accessor().object_links(&self.hash)?;
            debug!(hash = %self.hash, links = records.len(), "loaded node links");
            let links = records
                .into_iter()
                .map(|record| Link::from_record(self.dag.clone(), record))
                .collect();
            Ok(LinkTable::new(links))
        })
    }

    /// Raw payload bytes.
    pub fn data(&self) -> DagResult<Bytes> {
        Ok(self.content()?.raw.clone())
    }

    /// Payload decoded by the DAG's codec, or the raw bytes without one.
    pub fn value(&self) -> DagResult<Arc<Value>> {
        Ok(Arc::clone(&self.content()?.value))
    }

    /// Links in stored order.
    pub fn links(&self) -> DagResult<Vec<Link>> {
        Ok(self.link_table()?.links.clone())
    }

    pub fn link_names(&self) -> DagResult<Vec<String>> {
        Ok(self
            .link_table()?
            .links
            .iter()
            .map(|link| link.name.clone())
            .collect())
    }

    pub fn get_link(&self, name: &str) -> DagResult<Link> {
        self.link_table()?
            .get(name)
            .cloned()
            .ok_or_else(|| DagError::LinkNotFound {
                node: self.hash.clone(),
                name: name.to_string(),
            })
    }

    pub fn has_link(&self, name: &str) -> DagResult<bool> {
        Ok(self.link_table()?.get(name).is_some())
    }

    /// Follow the link called `name`.
    pub fn get_node(&self, name: &str) -> DagResult<Node> {
        Ok(self.get_link(name)?.follow())
    }

    pub fn is_loaded(&self) -> bool {
        self.content.is_loaded() || self.links.is_loaded()
    }

    /// Discard cached content and links; the next access fetches again.
    pub fn flush(&self) {
        let content = self.content.reset();
        let links = self.links.reset();
        if content || links {
            debug!(hash = %self.hash, "flushed node");
        }
    }

    fn to_object(&self) -> DagResult<ObjectRecord> {
        let links = self
            .link_table()?
            .links
            .iter()
            .map(Link::to_record)
            .collect();
        Ok(ObjectRecord::new(self.data()?, links))
    }

    fn store(&self, object: &ObjectRecord) -> DagResult<Node> {
        let put = self.dag.accessor().object_put(object)?;
        debug!(from = %self.hash, to = %put.hash, "stored modified node");
        Ok(self.dag.node(put.hash))
    }

    /// A new node equal to this one plus a link to `target`. This node is
    /// unchanged.
    pub fn with_link(&self, name: &str, target: &ContentHash, size: u64) -> DagResult<Node> {
        let mut object = self.to_object()?;
        if object.links.iter().any(|link| link.name == name) {
            return Err(DagError::DuplicateLink(name.to_string()));
        }
        object
            .links
            .push(LinkRecord::new(name, target.clone(), size));
        self.store(&object)
    }

    /// A new node equal to this one without links called `name`.
    pub fn without_link(&self, name: &str) -> DagResult<Node> {
        let mut object = self.to_object()?;
        let before = object.links.len();
        object.links.retain(|link| link.name != name);
        if object.links.len() == before {
            return Err(DagError::LinkNotFound {
                node: self.hash.clone(),
                name: name.to_string(),
            });
        }
        self.store(&object)
    }

    pub fn set_data(&self, _data: &[u8]) -> DagResult<Node> {
        Err(DagError::NotImplemented("set_data"))
    }

    pub fn append_data(&self, _data: &[u8]) -> DagResult<Node> {
        Err(DagError::NotImplemented("append_data"))
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("hash", &self.hash)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hash)
    }
}

/// A named, sized pointer to another node.
#[derive(Clone)]
pub struct Link {
    dag: Merkledag,
    name: String,
    hash: ContentHash,
    size: u64,
}

impl Link {
    fn from_record(dag: Merkledag, record: LinkRecord) -> Self {
        Self {
            dag,
            name: record.name,
            hash: record.hash,
            size: record.size,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hash(&self) -> &ContentHash {
        &self.hash
    }

    /// Size declared by the parent, covering the target and its descendants.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// A fresh, unloaded node for the target.
    pub fn follow(&self) -> Node {
        self.dag.node(self.hash.clone())
    }

    pub fn to_record(&self) -> LinkRecord {
        LinkRecord::new(self.name.clone(), self.hash.clone(), self.size)
    }
}

impl PartialEq for Link {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.hash == other.hash && self.size == other.size
    }
}

impl Eq for Link {}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("name", &self.name)
            .field("hash", &self.hash)
            .field("size", &self.size)
            .finish()
    }
}
