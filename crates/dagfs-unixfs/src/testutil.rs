//! Builders for unixfs trees in an in-memory store.

use std::sync::Arc;

use dagfs_codec::{Record, Value};
use dagfs_dag::{InMemoryAccessor, Node, NodeBuilder};

use crate::fs::UnixFs;

pub(crate) struct Fixture {
    pub store: Arc<InMemoryAccessor>,
    pub fs: UnixFs,
}

fn payload(kind: &str) -> Record {
    Record::new().with("Type", Value::Enum(kind.to_string()))
}

impl Fixture {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryAccessor::new());
        let fs = UnixFs::new(store.clone()).unwrap();
        Self { store, fs }
    }

    fn builder(&self) -> NodeBuilder {
        self.fs.dag().builder()
    }

    fn build(&self, builder: NodeBuilder, record: Record) -> Node {
        builder
            .value(&Value::Message(record))
            .unwrap()
            .build()
            .unwrap()
    }

    /// A single-node file holding `data` inline.
    pub fn leaf(&self, data: &[u8]) -> Node {
        let record = payload("File")
            .with("Data", data.to_vec())
            .with("filesize", data.len() as u64);
        self.build(self.builder(), record)
    }

    /// A single-node file whose `filesize` claims `filesize` bytes.
    pub fn leaf_with_size(&self, data: &[u8], filesize: u64) -> Node {
        let record = payload("File")
            .with("Data", data.to_vec())
            .with("filesize", filesize);
        self.build(self.builder(), record)
    }

    /// A file made of one leaf per chunk.
    pub fn file(&self, chunks: &[&[u8]]) -> Node {
        self.file_with_inline(b"", chunks)
    }

    /// A file with `inline` data in the root followed by one leaf per chunk.
    pub fn file_with_inline(&self, inline: &[u8], chunks: &[&[u8]]) -> Node {
        let parts: Vec<(Node, u64)> = chunks
            .iter()
            .map(|c| (self.leaf(c), c.len() as u64))
            .collect();
        self.root(inline, &parts)
    }

    /// A file whose blocks are existing nodes with the given sizes.
    pub fn file_from_parts(&self, parts: &[(Node, u64)]) -> Node {
        self.root(b"", parts)
    }

    fn root(&self, inline: &[u8], parts: &[(Node, u64)]) -> Node {
        let total = parts
            .iter()
            .fold(inline.len() as u64, |acc, (_, size)| acc.saturating_add(*size));
        let mut record = payload("File")
            .with("filesize", total)
            .with(
                "blocksize",
                parts.iter().map(|(_, size)| Value::UInt(*size)).collect::<Vec<_>>(),
            );
        if !inline.is_empty() {
            record.insert("Data", inline.to_vec());
        }
        let mut builder = self.builder();
        for (i, (node, size)) in parts.iter().enumerate() {
            builder = builder.link(&i.to_string(), node.hash().clone(), *size).unwrap();
        }
        self.build(builder, record)
    }

    /// A file root declaring two block sizes but carrying one link.
    pub fn malformed_file(&self) -> Node {
        let leaf = self.leaf(b"x");
        let record = payload("File").with("blocksize", vec![Value::UInt(1), Value::UInt(1)]);
        let builder = self.builder().link_node("", &leaf, 1).unwrap();
        self.build(builder, record)
    }

    pub fn dir(&self, entries: &[(&str, &Node)]) -> Node {
        let mut builder = self.builder();
        for (name, node) in entries {
            builder = builder.link_node(name, node, 0).unwrap();
        }
        self.build(builder, payload("Directory"))
    }
}
