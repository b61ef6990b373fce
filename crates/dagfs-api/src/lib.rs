//! Client for the object daemon's HTTP API.
//!
//! [`Client`] wraps a [`Transport`] and exposes the object, block and file
//! endpoints. It also implements [`ObjectAccessor`](dagfs_dag::ObjectAccessor),
//! so a `Merkledag` or `UnixFs` can load nodes straight from a daemon:
//!
//! ```text
//! let client = Client::from_config(&ApiConfig::default())?;
//! let fs = UnixFs::new(Arc::new(client))?;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod transport;
pub mod types;

#[cfg(test)]
mod mock;

pub use client::Client;
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use transport::{HttpTransport, Request, Transport};
pub use types::{
    AddResult, BlockStat, FileLink, FileLs, FileObject, ObjectLinks, ObjectStat, PeerInfo,
    ResolvedPath, VersionInfo,
};
