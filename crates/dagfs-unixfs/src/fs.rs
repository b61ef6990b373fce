use std::sync::Arc;

use dagfs_codec::proto::unixfs::{self, DataType};
use dagfs_codec::{CodecError, ProtobufCodec};
use dagfs_dag::{Merkledag, Node, ObjectAccessor};
use dagfs_types::ContentHash;

use crate::dir::Directory;
use crate::error::FsResult;
use crate::file::{payload_kind, unixfs_payload, File};
use crate::stream::FileStream;

/// Entry point for unixfs access.
///
/// ```text
/// let fs = UnixFs::new(accessor)?;
/// let mut f = fs.open("QmPZ9gcCEpqKTo6aq61g2nXGUhM4iCL3ewB6LDXZCtioEB", "r")?;
/// println!("{}", f.read_text()?);
/// ```
#[derive(Clone, Debug)]
pub struct UnixFs {
    dag: Merkledag,
}

/// Summary of a unixfs node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stat {
    pub hash: ContentHash,
    pub kind: DataType,
    /// Logical file size; zero for non-files.
    pub size: u64,
    /// `(offset, size)` of each block, for files.
    pub blocks: Vec<(u64, u64)>,
    pub links: usize,
}

impl UnixFs {
    /// A filesystem over `accessor`, decoding payloads as unixfs `Data`.
    pub fn new(accessor: Arc<dyn ObjectAccessor>) -> FsResult<Self> {
        let registry = unixfs::schema().map_err(CodecError::from)?;
        let codec = ProtobufCodec::new(Arc::new(registry), unixfs::DATA)
            .map_err(CodecError::from)?;
        Ok(Self {
            dag: Merkledag::with_codec(accessor, Arc::new(codec)),
        })
    }

    pub fn dag(&self) -> &Merkledag {
        &self.dag
    }

    /// Load the node named by `reference`: a bare hash, `/ipfs/…` or
    /// `/ipns/…` path.
    pub fn node(&self, reference: &str) -> FsResult<Node> {
        Ok(self.dag.get_str(reference)?)
    }

    pub fn file(&self, reference: &str) -> FsResult<File> {
        File::from_node(self.node(reference)?)
    }

    pub fn dir(&self, reference: &str) -> FsResult<Directory> {
        Directory::from_node(self.node(reference)?)
    }

    pub fn open(&self, reference: &str, mode: &str) -> FsResult<FileStream> {
        self.file(reference)?.open(mode)
    }

    pub fn stat(&self, reference: &str) -> FsResult<Stat> {
        let node = self.node(reference)?;
        let payload = unixfs_payload(&node)?;
        let kind = payload_kind(&node, &payload)?;
        let links = node.links()?.len();
        let hash = node.hash().clone();
        let (size, blocks) = match kind {
            DataType::File | DataType::Raw => {
                let file = File::from_node(node)?;
                let blocks = file
                    .block_index()
                    .blocks()
                    .iter()
                    .map(|b| (b.offset(), b.size()))
                    .collect();
                (file.size(), blocks)
            }
            _ => (0, Vec::new()),
        };
        Ok(Stat {
            hash,
            kind,
            size,
            blocks,
            links,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::Fixture;

    #[test]
    fn open_by_hash_and_path() {
        let fx = Fixture::new();
        let file = fx.file(&[b"ab", b"cd"]);
        let root = fx.dir(&[("f.txt", &file)]);

        let by_hash = fx.fs.open(file.hash().as_str(), "r").unwrap().read_text().unwrap();
        assert_eq!(by_hash, "abcd");

        let path = format!("/ipfs/{}/f.txt", root.hash());
        assert_eq!(fx.fs.open(&path, "r").unwrap().read_text().unwrap(), "abcd");
    }

    #[test]
    fn ipns_names_resolve() {
        let fx = Fixture::new();
        let file = fx.leaf(b"published");
        let root = fx.dir(&[("doc", &file)]);
        fx.store.publish("site", root.hash().clone());

        let dir = fx.fs.dir("/ipns/site").unwrap();
        assert_eq!(dir.node(), &root);
        assert_eq!(fx.fs.open("/ipns/site/doc", "r").unwrap().read_text().unwrap(), "published");
    }

    #[test]
    fn stat_reports_layout() {
        let fx = Fixture::new();
        let file = fx.file(&[b"abc", b"de"]);
        let stat = fx.fs.stat(file.hash().as_str()).unwrap();
        assert_eq!(stat.kind, DataType::File);
        assert_eq!(stat.size, 5);
        assert_eq!(stat.blocks, vec![(0, 3), (3, 2)]);
        assert_eq!(stat.links, 2);

        let dir = fx.dir(&[("x", &file)]);
        let stat = fx.fs.stat(dir.hash().as_str()).unwrap();
        assert_eq!(stat.kind, DataType::Directory);
        assert!(stat.blocks.is_empty());
    }

    #[test]
    fn bad_reference_is_an_error() {
        let fx = Fixture::new();
        assert!(fx.fs.file("not a hash").is_err());
        assert!(fx.fs.file("/bogus/path").is_err());
    }
}
