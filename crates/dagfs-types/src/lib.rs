//! Foundation types for dagfs.
//!
//! Every other dagfs crate depends on `dagfs-types`.
//!
//! # Key Types
//!
//! - [`ContentHash`]: Base58 multihash naming a merkledag node
//! - [`Reference`]: Either a bare hash or a namespaced `/ipfs/…` / `/ipns/…` path

pub mod error;
pub mod hash;
pub mod reference;

pub use error::TypeError;
pub use hash::ContentHash;
pub use reference::{Namespace, Reference};
