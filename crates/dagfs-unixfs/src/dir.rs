use std::fmt;

use dagfs_codec::proto::unixfs::DataType;
use dagfs_dag::{DagError, Node};

use crate::error::{FsError, FsResult};
use crate::file::{payload_kind, unixfs_payload, File};
use crate::stream::FileStream;

/// A unixfs directory. Entries are the node's links.
pub struct Directory {
    node: Node,
    path: String,
}

impl Directory {
    /// A directory rooted at `node`, with path `/ipfs/<hash>`.
    pub fn from_node(node: Node) -> FsResult<Self> {
        let path = node.reference().to_string();
        Self::with_path(node, path)
    }

    fn with_path(node: Node, path: String) -> FsResult<Self> {
        let payload = unixfs_payload(&node)?;
        let kind = payload_kind(&node, &payload)?;
        if kind != DataType::Directory {
            return Err(FsError::NotADirectory {
                hash: node.hash().clone(),
                kind: kind.to_string(),
            });
        }
        Ok(Self { node, path })
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    /// Path this directory was reached by, e.g. `/ipfs/<root>/static/img`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Entry names in stored order.
    pub fn listdir(&self) -> FsResult<Vec<String>> {
        Ok(self.node.link_names()?)
    }

    /// Walk `path` (slash-separated, relative) to a subdirectory.
    pub fn dir(&self, path: &str) -> FsResult<Directory> {
        let segments = split_path(path)?;
        let mut current = self.subdir(segments[0])?;
        for name in &segments[1..] {
            current = current.subdir(name)?;
        }
        Ok(current)
    }

    /// Walk `path` to a file.
    pub fn file(&self, path: &str) -> FsResult<File> {
        let segments = split_path(path)?;
        let (name, parents) = segments
            .split_last()
            .ok_or_else(|| FsError::InvalidPath(path.to_string()))?;
        let node = if parents.is_empty() {
            self.child(name)?
        } else {
            self.dir(&parents.join("/"))?.child(name)?
        };
        File::from_node(node)
    }

    /// Open the file at `path`.
    pub fn open(&self, path: &str, mode: &str) -> FsResult<FileStream> {
        self.file(path)?.open(mode)
    }

    fn child(&self, name: &str) -> FsResult<Node> {
        match self.node.get_node(name) {
            Ok(node) => Ok(node),
            Err(DagError::LinkNotFound { .. }) => {
                Err(FsError::NotFound(format!("{}/{}", self.path, name)))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn subdir(&self, name: &str) -> FsResult<Directory> {
        let node = self.child(name)?;
        Directory::with_path(node, format!("{}/{}", self.path, name))
    }
}

fn split_path(path: &str) -> FsResult<Vec<&str>> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return Err(FsError::InvalidPath(path.to_string()));
    }
    Ok(segments)
}

impl PartialEq for Directory {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl Eq for Directory {}

impl fmt::Debug for Directory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Directory {} @ {}>", self.path, self.node.hash())
    }
}
