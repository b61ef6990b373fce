use bytes::Bytes;
use dagfs_codec::Value;
use dagfs_types::ContentHash;

use crate::dag::Merkledag;
use crate::error::{DagError, DagResult};
use crate::node::Node;
use crate::object::{LinkRecord, ObjectRecord};

/// Assembles a new node and stores it with `object_put`.
#[derive(Debug)]
pub struct NodeBuilder {
    dag: Merkledag,
    data: Bytes,
    links: Vec<LinkRecord>,
}

impl NodeBuilder {
    pub(crate) fn new(dag: Merkledag) -> Self {
        Self {
            dag,
            data: Bytes::new(),
            links: Vec::new(),
        }
    }

    /// Set the raw payload.
    pub fn data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = data.into();
        self
    }

    /// Set the payload from a structured value, encoded with the DAG's codec.
    pub fn value(mut self, value: &Value) -> DagResult<Self> {
        self.data = self.dag.encode_value(value)?;
        Ok(self)
    }

    pub fn link(mut self, name: &str, hash: ContentHash, size: u64) -> DagResult<Self> {
        if self.links.iter().any(|link| link.name == name) {
            return Err(DagError::DuplicateLink(name.to_string()));
        }
        self.links.push(LinkRecord::new(name, hash, size));
        Ok(self)
    }

    /// Link to an existing node.
    pub fn link_node(self, name: &str, node: &Node, size: u64) -> DagResult<Self> {
        self.link(name, node.hash().clone(), size)
    }

    pub fn build(self) -> DagResult<Node> {
        let object = ObjectRecord::new(self.data, self.links);
        let put = self.dag.accessor().object_put(&object)?;
        Ok(self.dag.node(put.hash))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use dagfs_codec::proto::unixfs;
    use dagfs_codec::{ProtobufCodec, Record};

    use super::*;
    use crate::memory::InMemoryAccessor;

    #[test]
    fn builds_linked_nodes() {
        let store = Arc::new(InMemoryAccessor::new());
        let dag = Merkledag::new(store.clone());
        let leaf = dag.builder().data(&b"leaf"[..]).build().unwrap();
        let root = dag
            .builder()
            .link_node("leaf", &leaf, 4)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(root.get_node("leaf").unwrap(), leaf);
        assert_eq!(root.get_node("leaf").unwrap().data().unwrap().as_ref(), b"leaf");
    }

    #[test]
    fn duplicate_link_names_rejected() {
        let dag = Merkledag::new(Arc::new(InMemoryAccessor::new()));
        let hash = ContentHash::compute(b"x");
        let err = dag
            .builder()
            .link("x", hash.clone(), 1)
            .unwrap()
            .link("x", hash, 1)
            .unwrap_err();
        assert!(matches!(err, DagError::DuplicateLink(name) if name == "x"));
    }

    #[test]
    fn structured_values_use_the_codec() {
        let registry = Arc::new(unixfs::schema().unwrap());
        let codec = Arc::new(ProtobufCodec::new(registry, unixfs::DATA).unwrap());
        let dag = Merkledag::with_codec(Arc::new(InMemoryAccessor::new()), codec);

        let value = Value::Message(
            Record::new()
                .with("Type", Value::Enum("File".into()))
                .with("Data", b"hi".to_vec()),
        );
        let node = dag.builder().value(&value).unwrap().build().unwrap();
        assert_eq!(*node.value().unwrap(), value);
    }

    #[test]
    fn structured_values_need_a_codec() {
        let dag = Merkledag::new(Arc::new(InMemoryAccessor::new()));
        assert!(dag.builder().value(&Value::UInt(1)).is_err());
        assert!(dag
            .builder()
            .value(&Value::Bytes(Bytes::from_static(b"ok")))
            .is_ok());
    }
}
