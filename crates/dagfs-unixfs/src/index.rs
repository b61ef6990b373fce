//! Offset index from a file's logical bytes to the blocks holding them.

use std::fmt;

use bytes::Bytes;
use dagfs_codec::Record;
use dagfs_dag::Node;
use tracing::debug;

use crate::error::{FsError, FsResult};

/// Where a block's bytes live.
pub enum BlockSource {
    /// Data embedded in the file node itself.
    Inline(Bytes),
    /// A separate node reached through one of the file node's links.
    Linked(Node),
}

/// A contiguous byte range `[offset, offset + size)` of a file.
pub struct FileBlock {
    offset: u64,
    size: u64,
    source: BlockSource,
}

impl FileBlock {
    pub fn inline(offset: u64, data: Bytes) -> Self {
        Self {
            offset,
            size: data.len() as u64,
            source: BlockSource::Inline(data),
        }
    }

    pub fn linked(offset: u64, size: u64, node: Node) -> Self {
        Self {
            offset,
            size,
            source: BlockSource::Linked(node),
        }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.size)
    }

    pub fn source(&self) -> &BlockSource {
        &self.source
    }

    /// The block's node, unless its data is inline.
    pub fn node(&self) -> Option<&Node> {
        match &self.source {
            BlockSource::Linked(node) => Some(node),
            BlockSource::Inline(_) => None,
        }
    }
}

impl fmt::Debug for FileBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match &self.source {
            BlockSource::Inline(_) => "inline".to_string(),
            BlockSource::Linked(node) => node.hash().to_string(),
        };
        write!(f, "<FileBlock {} [{} : {}]>", source, self.offset, self.end())
    }
}

/// The part of one block that overlaps a requested read.
#[derive(Clone, Copy, Debug)]
pub struct Chunk<'a> {
    /// Start of the overlap, relative to the block.
    pub offset: u64,
    /// Bytes in the overlap; never zero.
    pub size: u64,
    pub block: &'a FileBlock,
}

/// Blocks of a file ordered by offset. Blocks are contiguous and
/// non-overlapping.
#[derive(Debug, Default)]
pub struct BlockIndex {
    blocks: Vec<FileBlock>,
}

impl BlockIndex {
    /// Index already-ordered blocks. Each block must start where the
    /// previous one ends.
    pub fn from_blocks(blocks: Vec<FileBlock>) -> Self {
        debug_assert!(blocks.windows(2).all(|w| w[0].end() == w[1].offset));
        Self { blocks }
    }

    /// Build the index of a file node from its decoded unixfs payload.
    ///
    /// Inline `Data` becomes a leading block at offset 0. Each `blocksize`
    /// entry pairs with the link at the same position and starts where the
    /// previous block ends.
    pub fn from_node(node: &Node, payload: &Record) -> FsResult<Self> {
        let inline = payload.get_bytes("Data").cloned().unwrap_or_default();
        let sizes = payload
            .get_list("blocksize")
            .iter()
            .map(|v| {
                v.as_uint().ok_or_else(|| FsError::InvalidNode {
                    hash: node.hash().clone(),
                    reason: "non-integer blocksize".into(),
                })
            })
            .collect::<FsResult<Vec<u64>>>()?;

        let mut blocks = Vec::with_capacity(sizes.len() + 1);
        let mut offset = 0;
        if !inline.is_empty() || sizes.is_empty() {
            offset = inline.len() as u64;
            blocks.push(FileBlock::inline(0, inline));
        }
        if !sizes.is_empty() {
            let links = node.links()?;
            if links.len() != sizes.len() {
                return Err(FsError::MalformedFileNode {
                    hash: node.hash().clone(),
                    blocksizes: sizes.len(),
                    links: links.len(),
                });
            }
            for (link, size) in links.iter().zip(sizes) {
                let end = offset.checked_add(size).ok_or_else(|| FsError::InvalidNode {
                    hash: node.hash().clone(),
                    reason: "block sizes overflow the file length".into(),
                })?;
                blocks.push(FileBlock::linked(offset, size, link.follow()));
                offset = end;
            }
        }
        debug!(hash = %node.hash(), blocks = blocks.len(), size = offset, "built block index");
        Ok(Self { blocks })
    }

    pub fn blocks(&self) -> &[FileBlock] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Sum of all block sizes.
    pub fn total_size(&self) -> u64 {
        self.blocks.last().map_or(0, FileBlock::end)
    }

    /// Overlaps of `[offset, offset + length)` with each block, in order.
    /// Past the last block the iteration simply ends, so a read near the end
    /// of the file yields fewer bytes than requested.
    pub fn get_chunks(&self, offset: u64, length: u64) -> Chunks<'_> {
        let first = self.blocks.partition_point(|block| block.end() <= offset);
        Chunks {
            blocks: &self.blocks[first..],
            offset,
            remaining: length,
        }
    }
}

/// Iterator returned by [`BlockIndex::get_chunks`].
#[derive(Debug)]
pub struct Chunks<'a> {
    blocks: &'a [FileBlock],
    offset: u64,
    remaining: u64,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Chunk<'a>> {
        while self.remaining > 0 {
            let (block, rest) = self.blocks.split_first()?;
            self.blocks = rest;
            if block.offset > self.offset || self.offset >= block.end() {
                // Empty blocks, or a gap the index should never contain.
                continue;
            }
            let chunk_offset = self.offset - block.offset;
            let size = self.remaining.min(block.size - chunk_offset);
            self.offset += size;
            self.remaining -= size;
            return Some(Chunk {
                offset: chunk_offset,
                size,
                block,
            });
        }
        None
    }
}
