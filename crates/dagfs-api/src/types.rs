//! JSON response bodies.

use std::collections::BTreeMap;

use dagfs_dag::LinkRecord;
use dagfs_types::ContentHash;
use serde::{Deserialize, Serialize};

/// `/id` response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PeerInfo {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(default)]
    pub public_key: String,
    #[serde(default)]
    pub addresses: Option<Vec<String>>,
    #[serde(default)]
    pub agent_version: String,
    #[serde(default)]
    pub protocol_version: String,
}

/// `/version` response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VersionInfo {
    pub version: String,
    #[serde(default)]
    pub commit: String,
    #[serde(default)]
    pub repo: String,
    #[serde(default)]
    pub system: String,
}

/// `/resolve` response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResolvedPath {
    pub path: String,
}

/// `/object/links` response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ObjectLinks {
    pub hash: ContentHash,
    #[serde(default)]
    pub links: Option<Vec<LinkRecord>>,
}

impl ObjectLinks {
    pub fn into_links(self) -> Vec<LinkRecord> {
        self.links.unwrap_or_default()
    }
}

/// `/object/stat` response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ObjectStat {
    pub hash: ContentHash,
    pub num_links: u64,
    pub block_size: u64,
    pub links_size: u64,
    pub data_size: u64,
    pub cumulative_size: u64,
}

/// `/block/stat` and `/block/put` response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BlockStat {
    pub key: String,
    pub size: u64,
}

/// `/add` response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddResult {
    #[serde(default)]
    pub name: String,
    pub hash: ContentHash,
    /// Reported as a decimal string by the daemon.
    #[serde(default)]
    pub size: String,
}

/// `/file/ls` response: the listed argument paths mapped to the hash of
/// the object each resolved to, and those objects by hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FileLs {
    #[serde(default)]
    pub arguments: BTreeMap<String, String>,
    #[serde(default)]
    pub objects: BTreeMap<String, FileObject>,
}

impl FileLs {
    /// The listing for `path`, following its entry in `arguments`.
    pub fn object(&self, path: &str) -> Option<&FileObject> {
        self.objects.get(self.arguments.get(path)?)
    }
}

/// One unixfs object in a [`FileLs`] response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FileObject {
    pub hash: ContentHash,
    #[serde(default)]
    pub size: u64,
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(default)]
    pub links: Option<Vec<FileLink>>,
}

impl FileObject {
    pub fn links(&self) -> &[FileLink] {
        self.links.as_deref().unwrap_or_default()
    }
}

/// A directory entry in a [`FileObject`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FileLink {
    pub name: String,
    pub hash: ContentHash,
    #[serde(default)]
    pub size: u64,
    #[serde(rename = "Type")]
    pub kind: String,
}
