//! Content-addressed merkledag for dagfs.
//!
//! A [`Merkledag`] hands out [`Node`]s that fetch their payload and link
//! table from an [`ObjectAccessor`] on first use and cache the result until
//! [`Node::flush`]. Links resolve into fresh nodes with [`Link::follow`].

pub mod accessor;
pub mod builder;
pub mod cell;
pub mod dag;
pub mod error;
pub mod memory;
pub mod node;
pub mod object;

pub use accessor::ObjectAccessor;
pub use builder::NodeBuilder;
pub use cell::LazyCell;
pub use dag::Merkledag;
pub use error::{DagError, DagResult};
pub use memory::InMemoryAccessor;
pub use node::{Link, Node};
pub use object::{LinkRecord, ObjectRecord, PutResult};
