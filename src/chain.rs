//! Block-index access: ancestors and median-time-past

use bitcoin_hashes::{sha256d, Hash as BitcoinHash};
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{ConsensusError, Result};
use crate::types::*;

/// A block on the active chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRef {
    pub height: i32,
    pub hash: Hash,
}

/// Read access to the chain of block headers.
///
/// Lookups are in-memory and never suspend.
pub trait BlockIndex {
    /// The block at `height` on the chain ending at `tip`, if any
    fn ancestor(&self, tip: &BlockRef, height: i32) -> Option<BlockRef>;

    /// Median timestamp of `block` and up to ten of its predecessors
    fn median_time_past(&self, block: &BlockRef) -> i64;

    /// The predecessor of `block`; `None` for genesis
    fn previous(&self, block: &BlockRef) -> Option<BlockRef> {
        if block.height <= 0 {
            return None;
        }
        self.ancestor(block, block.height - 1)
    }
}

/// In-memory linear chain of headers, indexed by height
#[derive(Debug, Clone, Default)]
pub struct HeaderChain {
    headers: Vec<BlockHeader>,
    hashes: Vec<Hash>,
}

impl HeaderChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header at the next height and return its reference
    pub fn push(&mut self, header: BlockHeader) -> BlockRef {
        let hash = header_hash(&header);
        self.headers.push(header);
        self.hashes.push(hash);
        BlockRef { height: (self.headers.len() - 1) as i32, hash }
    }

    pub fn tip(&self) -> Option<BlockRef> {
        self.block_at(self.headers.len() as i32 - 1)
    }

    pub fn block_at(&self, height: i32) -> Option<BlockRef> {
        let index = usize::try_from(height).ok()?;
        self.hashes.get(index).map(|hash| BlockRef { height, hash: *hash })
    }

    pub fn header(&self, block: &BlockRef) -> Option<&BlockHeader> {
        let index = usize::try_from(block.height).ok()?;
        self.headers.get(index)
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    fn contains(&self, block: &BlockRef) -> bool {
        self.block_at(block.height).as_ref() == Some(block)
    }
}

impl BlockIndex for HeaderChain {
    fn ancestor(&self, tip: &BlockRef, height: i32) -> Option<BlockRef> {
        if height < 0 || height > tip.height || !self.contains(tip) {
            return None;
        }
        self.block_at(height)
    }

    fn median_time_past(&self, block: &BlockRef) -> i64 {
        let end = (block.height.max(-1) + 1) as usize;
        let end = end.min(self.headers.len());
        let start = end.saturating_sub(MEDIAN_TIME_SPAN);
        let mut times: Vec<i64> = self.headers[start..end]
            .iter()
            .map(|h| h.timestamp as i64)
            .collect();
        if times.is_empty() {
            return 0;
        }
        times.sort_unstable();
        times[times.len() / 2]
    }
}

/// Look up `height` on the chain ending at `tip`, treating absence as a broken index
pub fn require_ancestor<B: BlockIndex + ?Sized>(
    chain: &B,
    tip: &BlockRef,
    height: i32,
) -> Result<BlockRef> {
    chain
        .ancestor(tip, height)
        .ok_or(ConsensusError::MissingAncestor(height))
}

/// Double-SHA256 of the 80-byte header serialization
pub fn header_hash(header: &BlockHeader) -> Hash {
    let mut bytes = Vec::with_capacity(80);
    bytes.extend_from_slice(&header.version.to_le_bytes());
    bytes.extend_from_slice(&header.prev_block_hash);
    bytes.extend_from_slice(&header.merkle_root);
    bytes.extend_from_slice(&header.timestamp.to_le_bytes());
    bytes.extend_from_slice(&header.bits.to_le_bytes());
    bytes.extend_from_slice(&header.nonce.to_le_bytes());
    sha256d::Hash::hash(&bytes).into_inner()
}
