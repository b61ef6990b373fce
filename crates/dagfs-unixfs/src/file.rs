use std::fmt;
use std::io::Write;
use std::sync::Arc;

use dagfs_codec::proto::unixfs::DataType;
use dagfs_codec::{Record, Value};
use dagfs_dag::Node;

use crate::error::{FsError, FsResult};
use crate::index::{BlockIndex, BlockSource, FileBlock};
use crate::stream::FileStream;

/// A unixfs file: a root node plus the index of its blocks.
pub struct File {
    node: Node,
    size: u64,
    index: BlockIndex,
}

impl File {
    /// Wrap a node whose payload is a unixfs `File` (or `Raw`) message.
    pub fn from_node(node: Node) -> FsResult<Self> {
        let payload = unixfs_payload(&node)?;
        let kind = payload_kind(&node, &payload)?;
        if !matches!(kind, DataType::File | DataType::Raw) {
            return Err(FsError::NotAFile {
                hash: node.hash().clone(),
                kind: kind.to_string(),
            });
        }
        let record = payload_record(&node, &payload)?;
        let index = BlockIndex::from_node(&node, record)?;
        let size = record
            .get_uint("filesize")
            .unwrap_or_else(|| index.total_size());
        Ok(Self { node, size, index })
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    /// Logical length in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn block_index(&self) -> &BlockIndex {
        &self.index
    }

    /// Open a stream over this file. See [`OpenMode`](crate::OpenMode) for
    /// mode strings.
    pub fn open(self, mode: &str) -> FsResult<FileStream> {
        FileStream::new(self, mode.parse()?)
    }

    /// Copy up to `buf.len()` bytes starting at `offset`, returning the
    /// number copied. Each linked block visited is flushed afterwards.
    pub fn read_at(&self, offset: u64, buf: &mut [u8]) -> FsResult<usize> {
        let available = self.size.saturating_sub(offset);
        let length = (buf.len() as u64).min(available);
        read_chunks(&self.node, &self.index, offset, length, buf)
    }

    /// Write the whole file to `out`, returning the number of bytes written.
    ///
    /// Every block is fetched once and flushed as soon as it has been
    /// written, unlike a buffered loop over [`read_at`](File::read_at).
    pub fn copy_to(&self, out: &mut dyn Write) -> FsResult<u64> {
        copy_blocks(&self.node, &self.index, self.size, out)
    }
}

impl fmt::Debug for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("File")
            .field("hash", self.node.hash())
            .field("size", &self.size)
            .field("blocks", &self.index.len())
            .finish()
    }
}

/// Read through `index`, which belongs to `owner`.
fn read_chunks(
    owner: &Node,
    index: &BlockIndex,
    offset: u64,
    length: u64,
    buf: &mut [u8],
) -> FsResult<usize> {
    let mut written = 0;
    for chunk in index.get_chunks(offset, length) {
        let n = chunk.size as usize;
        read_block(owner, chunk.block, chunk.offset, &mut buf[written..written + n])?;
        written += n;
    }
    Ok(written)
}

/// Fill `out` from `block`, starting `offset` bytes into it.
fn read_block(owner: &Node, block: &FileBlock, offset: u64, out: &mut [u8]) -> FsResult<()> {
    match block.source() {
        BlockSource::Inline(data) => copy_range(data, offset, out).ok_or_else(|| short_block(owner)),
        BlockSource::Linked(node) => {
            let result = read_linked(node, offset, out);
            node.flush();
            result
        }
    }
}

fn read_linked(node: &Node, offset: u64, out: &mut [u8]) -> FsResult<()> {
    let payload = unixfs_payload(node)?;
    let record = payload_record(node, &payload)?;
    if !record.get_list("blocksize").is_empty() {
        // An intermediate node of a multi-level file.
        let nested = BlockIndex::from_node(node, record)?;
        let copied = read_chunks(node, &nested, offset, out.len() as u64, out)?;
        if copied != out.len() {
            return Err(short_block(node));
        }
        return Ok(());
    }
    let data = record.get_bytes("Data").cloned().unwrap_or_default();
    copy_range(&data, offset, out).ok_or_else(|| short_block(node))
}

/// Write at most `limit` bytes of `index`, in block order.
fn copy_blocks(owner: &Node, index: &BlockIndex, limit: u64, out: &mut dyn Write) -> FsResult<u64> {
    let mut written = 0;
    for block in index.blocks() {
        let want = block.size().min(limit - written);
        if want == 0 {
            break;
        }
        match block.source() {
            BlockSource::Inline(data) => {
                let src = usize::try_from(want)
                    .ok()
                    .and_then(|len| data.get(..len))
                    .ok_or_else(|| short_block(owner))?;
                out.write_all(src)?;
            }
            BlockSource::Linked(node) => {
                let result = copy_linked(node, want, out);
                node.flush();
                result?;
            }
        }
        written += want;
    }
    Ok(written)
}

fn copy_linked(node: &Node, want: u64, out: &mut dyn Write) -> FsResult<()> {
    let payload = unixfs_payload(node)?;
    let record = payload_record(node, &payload)?;
    if !record.get_list("blocksize").is_empty() {
        let nested = BlockIndex::from_node(node, record)?;
        if copy_blocks(node, &nested, want, out)? != want {
            return Err(short_block(node));
        }
        return Ok(());
    }
    let data = record.get_bytes("Data").cloned().unwrap_or_default();
    let src = usize::try_from(want)
        .ok()
        .and_then(|len| data.get(..len))
        .ok_or_else(|| short_block(node))?;
    out.write_all(src)?;
    Ok(())
}

fn copy_range(data: &[u8], offset: u64, out: &mut [u8]) -> Option<()> {
    let start = usize::try_from(offset).ok()?;
    let src = data.get(start..start.checked_add(out.len())?)?;
    out.copy_from_slice(src);
    Some(())
}

fn short_block(node: &Node) -> FsError {
    FsError::InvalidNode {
        hash: node.hash().clone(),
        reason: "block shorter than its declared size".into(),
    }
}

pub(crate) fn unixfs_payload(node: &Node) -> FsResult<Arc<Value>> {
    Ok(node.value()?)
}

pub(crate) fn payload_record<'a>(node: &Node, payload: &'a Value) -> FsResult<&'a Record> {
    payload.as_message().ok_or_else(|| FsError::InvalidNode {
        hash: node.hash().clone(),
        reason: format!("payload is {}, not a unixfs message", payload.kind_name()),
    })
}

pub(crate) fn payload_kind(node: &Node, payload: &Value) -> FsResult<DataType> {
    let record = payload_record(node, payload)?;
    record
        .get_enum("Type")
        .and_then(DataType::from_name)
        .ok_or_else(|| FsError::InvalidNode {
            hash: node.hash().clone(),
            reason: "missing unixfs type".into(),
        })
}
