//! In-memory permutation
//!
//! Same block layout as a permutation file, without the file. Used for
//! small indexes and tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Result, StoreError};

use super::{
    checksum, encode_block, BlockMetadata, BlockSource, RelationMetadata, RelationTracker, Row,
};

/// A permutation whose blocks live in memory
#[derive(Debug)]
pub struct MemoryPermutation {
    blocks: Vec<Vec<Row>>,
    metadata: Vec<BlockMetadata>,
    relations: Vec<RelationMetadata>,
    /// Number of `read_block` calls so far
    blocks_read: AtomicUsize,
}

impl MemoryPermutation {
    /// Sort and deduplicate `rows`, then cut them into blocks of `block_size` rows
    pub fn new(mut rows: Vec<Row>, block_size: usize) -> Result<Self> {
        if block_size == 0 {
            return Err(StoreError::Config("block_size must be at least 1".to_string()));
        }
        rows.sort_unstable();
        rows.dedup();
        let blocks = rows.chunks(block_size).map(|c| c.to_vec()).collect();
        Self::from_blocks(blocks)
    }

    /// Use the given blocks as they are
    ///
    /// The concatenation of all blocks must be strictly increasing and no
    /// block may be empty.
    pub fn from_blocks(blocks: Vec<Vec<Row>>) -> Result<Self> {
        let mut metadata = Vec::with_capacity(blocks.len());
        let mut tracker = RelationTracker::default();
        let mut previous: Option<Row> = None;
        let mut offset = 0u64;

        for (block_index, block) in blocks.iter().enumerate() {
            let (first, last) = match (block.first(), block.last()) {
                (Some(first), Some(last)) => (*first, *last),
                _ => {
                    return Err(StoreError::Storage(format!(
                        "Block {} is empty",
                        block_index
                    )))
                }
            };
            for row in block {
                if previous.map_or(false, |p| p >= *row) {
                    return Err(StoreError::Storage(format!(
                        "Rows are not strictly increasing at block {}",
                        block_index
                    )));
                }
                previous = Some(*row);
                tracker.observe(row[0], block_index);
            }

            let encoded = encode_block(block);
            metadata.push(BlockMetadata {
                first_triple: first,
                last_triple: last,
                num_rows: block.len() as u64,
                offset,
                compressed_size: encoded.len() as u64,
                crc: checksum(&encoded),
            });
            offset += encoded.len() as u64;
        }

        Ok(Self {
            blocks,
            metadata,
            relations: tracker.finish(),
            blocks_read: AtomicUsize::new(0),
        })
    }

    /// How many blocks have been read since construction
    pub fn blocks_read(&self) -> usize {
        self.blocks_read.load(Ordering::Relaxed)
    }
}

impl BlockSource for MemoryPermutation {
    fn block_metadata(&self) -> &[BlockMetadata] {
        &self.metadata
    }

    fn relations(&self) -> &[RelationMetadata] {
        &self.relations
    }

    fn read_block(&self, block_index: usize) -> Result<Vec<Row>> {
        self.blocks_read.fetch_add(1, Ordering::Relaxed);
        self.blocks.get(block_index).cloned().ok_or_else(|| {
            StoreError::Storage(format!(
                "Block index {} out of range ({} blocks)",
                block_index,
                self.blocks.len()
            ))
        })
    }
}
