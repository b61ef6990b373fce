use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use bytes::Bytes;
use dagfs_types::{ContentHash, Namespace, Reference};

use crate::accessor::ObjectAccessor;
use crate::error::{DagError, DagResult};
use crate::object::{LinkRecord, ObjectRecord, PutResult};

/// In-process object table.
///
/// Intended for tests and embedding. Objects are keyed by the hash of their
/// `PBNode` encoding and cloned on read. `/ipns/` names map to hashes through
/// [`publish`](Self::publish). Every `object_data` and `object_links` call
/// is counted.
pub struct InMemoryAccessor {
    objects: RwLock<HashMap<ContentHash, ObjectRecord>>,
    names: RwLock<HashMap<String, ContentHash>>,
    data_fetches: AtomicUsize,
    links_fetches: AtomicUsize,
}

impl InMemoryAccessor {
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            names: RwLock::new(HashMap::new()),
            data_fetches: AtomicUsize::new(0),
            links_fetches: AtomicUsize::new(0),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }

    pub fn contains(&self, hash: &ContentHash) -> bool {
        self.objects.read().expect("lock poisoned").contains_key(hash)
    }

    /// Store `object` and return its hash. Storing identical content twice
    /// is a no-op.
    pub fn insert(&self, object: ObjectRecord) -> DagResult<ContentHash> {
        let hash = object.compute_hash()?;
        self.objects
            .write()
            .expect("lock poisoned")
            .entry(hash.clone())
            .or_insert(object);
        Ok(hash)
    }

    /// Point the `/ipns/<name>` path at `hash`.
    pub fn publish(&self, name: impl Into<String>, hash: ContentHash) {
        self.names
            .write()
            .expect("lock poisoned")
            .insert(name.into(), hash);
    }

    pub fn data_fetches(&self) -> usize {
        self.data_fetches.load(Ordering::SeqCst)
    }

    pub fn links_fetches(&self) -> usize {
        self.links_fetches.load(Ordering::SeqCst)
    }

    pub fn reset_counters(&self) {
        self.data_fetches.store(0, Ordering::SeqCst);
        self.links_fetches.store(0, Ordering::SeqCst);
    }

    fn lookup(&self, hash: &ContentHash) -> DagResult<ObjectRecord> {
        self.objects
            .read()
            .expect("lock poisoned")
            .get(hash)
            .cloned()
            .ok_or_else(|| DagError::NotFound(hash.clone()))
    }
}

impl Default for InMemoryAccessor {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectAccessor for InMemoryAccessor {
    fn object_data(&self, hash: &ContentHash) -> DagResult<Bytes> {
        self.data_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.lookup(hash)?.data)
    }

    fn object_links(&self, hash: &ContentHash) -> DagResult<Vec<LinkRecord>> {
        self.links_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.lookup(hash)?.links)
    }

    fn object_put(&self, object: &ObjectRecord) -> DagResult<PutResult> {
        let hash = self.insert(object.clone())?;
        Ok(PutResult {
            hash,
            links: object.links.clone(),
        })
    }

    fn resolve(&self, reference: &Reference) -> DagResult<ContentHash> {
        let (namespace, path) = match reference {
            Reference::Hash(hash) => return Ok(hash.clone()),
            Reference::Path { namespace, path } => (namespace, path),
        };
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let root = segments
            .next()
            .ok_or_else(|| DagError::Unresolvable(reference.to_string()))?;
        let mut current = match namespace {
            Namespace::Ipfs => ContentHash::parse(root)?,
            Namespace::Ipns => self
                .names
                .read()
                .expect("lock poisoned")
                .get(root)
                .cloned()
                .ok_or_else(|| DagError::Unresolvable(reference.to_string()))?,
        };
        for name in segments {
            let object = self.lookup(&current)?;
            let link = object
                .links
                .iter()
                .find(|link| link.name == name)
                .ok_or_else(|| DagError::LinkNotFound {
                    node: current.clone(),
                    name: name.to_string(),
                })?;
            current = link.hash.clone();
        }
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> (InMemoryAccessor, ContentHash, ContentHash) {
        let store = InMemoryAccessor::new();
        let leaf = store.insert(ObjectRecord::new(b"leaf".to_vec(), vec![])).unwrap();
        let mid = store
            .insert(ObjectRecord::new(Vec::new(), vec![LinkRecord::new("b", leaf.clone(), 4)]))
            .unwrap();
        let root = store
            .insert(ObjectRecord::new(Vec::new(), vec![LinkRecord::new("a", mid, 10)]))
            .unwrap();
        (store, root, leaf)
    }

    #[test]
    fn insert_is_idempotent() {
        let store = InMemoryAccessor::new();
        let a = store.insert(ObjectRecord::new(b"x".to_vec(), vec![])).unwrap();
        let b = store.insert(ObjectRecord::new(b"x".to_vec(), vec![])).unwrap();
        assert_eq!(a, b);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn counters_track_fetches() {
        let (store, root, _) = tree();
        store.object_links(&root).unwrap();
        store.object_links(&root).unwrap();
        store.object_data(&root).unwrap();
        assert_eq!(store.links_fetches(), 2);
        assert_eq!(store.data_fetches(), 1);
        store.reset_counters();
        assert_eq!(store.links_fetches(), 0);
    }

    #[test]
    fn resolves_ipfs_paths_through_links() {
        let (store, root, leaf) = tree();
        let reference = Reference::parse(&format!("/ipfs/{root}/a/b")).unwrap();
        assert_eq!(store.resolve(&reference).unwrap(), leaf);
    }

    #[test]
    fn resolves_ipns_names() {
        let (store, root, leaf) = tree();
        store.publish("site", root);
        let reference = Reference::parse("/ipns/site/a/b").unwrap();
        assert_eq!(store.resolve(&reference).unwrap(), leaf);
        let unknown = Reference::parse("/ipns/other").unwrap();
        assert!(matches!(store.resolve(&unknown), Err(DagError::Unresolvable(_))));
    }

    #[test]
    fn broken_path_reports_missing_link() {
        let (store, root, _) = tree();
        let reference = Reference::parse(&format!("/ipfs/{root}/nope")).unwrap();
        assert!(matches!(
            store.resolve(&reference),
            Err(DagError::LinkNotFound { .. })
        ));
    }

    #[test]
    fn missing_object_is_not_found() {
        let store = InMemoryAccessor::new();
        let hash = ContentHash::compute(b"ghost");
        assert!(matches!(store.object_data(&hash), Err(DagError::NotFound(_))));
    }
}
