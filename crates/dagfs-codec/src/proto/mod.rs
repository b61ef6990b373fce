//! Schemas for the node formats dagfs reads.

pub mod merkledag;
pub mod unixfs;
