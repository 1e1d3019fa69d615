//! Storage Module
//!
//! Immutable, sorted, block-chunked storage of one permutation's rows.
//!
//! ## Responsibilities
//! - Persist the sorted rows of a permutation as independently encoded blocks
//! - Keep per-block summaries (first/last row) for binary search without I/O
//! - Keep per-relation summaries (rows sharing the same first column)
//! - Read and decode exactly one block on request
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Header (16 bytes)                                       │
//! │   Magic: "TDLP" (4) | Version: u16 (2) | Perm: u8 (1)   │
//! │   Padding (1) | RowCount: u64 (8)                       │
//! ├─────────────────────────────────────────────────────────┤
//! │ Block Section (variable)                                │
//! │   per block: col0 values | col1 values | col2 values    │
//! │   (each value a little-endian u64)                      │
//! ├─────────────────────────────────────────────────────────┤
//! │ Metadata Section (variable)                             │
//! │   bincode(PermutationMetadata)                          │
//! ├─────────────────────────────────────────────────────────┤
//! │ Footer (16 bytes)                                       │
//! │   MetaOffset: u64 (8) | MetaCRC: u32 (4) | Padding (4)  │
//! └─────────────────────────────────────────────────────────┘
//! ```

mod block;
mod memory;
mod reader;
mod writer;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::Id;

pub use block::{checksum, decode_block, encode_block};
pub use memory::MemoryPermutation;
pub use reader::PermutationReader;
pub use writer::{PermutationFile, PermutationWriter};

// =============================================================================
// Shared Constants (used by writer and reader)
// =============================================================================

/// Magic bytes identifying a permutation file
pub(crate) const MAGIC: &[u8; 4] = b"TDLP";

/// Current permutation file format version
pub(crate) const VERSION: u16 = 1;

/// Header size: Magic (4) + Version (2) + Permutation (1) + Padding (1) + RowCount (8)
pub(crate) const HEADER_SIZE: u64 = 16;

/// Footer size: MetaOffset (8) + MetaCRC (4) + Padding (4)
pub(crate) const FOOTER_SIZE: u64 = 16;

/// One row of a permutation, in that permutation's column order
pub type Row = [Id; 3];

// =============================================================================
// Metadata
// =============================================================================

/// Summary of one block of a permutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMetadata {
    /// First row stored in the block
    pub first_triple: Row,
    /// Last row stored in the block
    pub last_triple: Row,
    /// Number of rows in the block
    pub num_rows: u64,
    /// Byte offset of the encoded block in its file
    pub offset: u64,
    /// Encoded size in bytes
    pub compressed_size: u64,
    /// CRC32 of the encoded bytes
    pub crc: u32,
}

/// Summary of one relation: all rows sharing the same first column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationMetadata {
    pub col0_id: Id,
    pub num_rows: u64,
    /// Index of the block holding the relation's first row
    pub first_block: usize,
    /// Index of the block holding the relation's last row
    pub last_block: usize,
}

/// Everything about a permutation that is kept in memory after open
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PermutationMetadata {
    pub blocks: Vec<BlockMetadata>,
    pub relations: Vec<RelationMetadata>,
}

/// Builds `RelationMetadata` from rows observed in sorted order
#[derive(Debug, Default)]
pub(crate) struct RelationTracker {
    relations: Vec<RelationMetadata>,
}

impl RelationTracker {
    pub(crate) fn observe(&mut self, col0: Id, block_index: usize) {
        match self.relations.last_mut() {
            Some(current) if current.col0_id == col0 => {
                current.num_rows += 1;
                current.last_block = block_index;
            }
            _ => self.relations.push(RelationMetadata {
                col0_id: col0,
                num_rows: 1,
                first_block: block_index,
                last_block: block_index,
            }),
        }
    }

    pub(crate) fn finish(self) -> Vec<RelationMetadata> {
        self.relations
    }
}

// =============================================================================
// Block Source
// =============================================================================

/// Read access to one permutation of the base index
///
/// Implementations are read-only after construction and may be shared
/// between threads.
pub trait BlockSource: Send + Sync {
    /// Block summaries, sorted by `last_triple`, non-overlapping
    fn block_metadata(&self) -> &[BlockMetadata];

    /// Relation summaries, sorted by `col0_id`
    fn relations(&self) -> &[RelationMetadata];

    /// Read and decode one block
    fn read_block(&self, block_index: usize) -> Result<Vec<Row>>;

    /// First relation whose key is `>= col0`
    fn relation_lower_bound(&self, col0: Id) -> Option<&RelationMetadata> {
        let relations = self.relations();
        let index = relations.partition_point(|r| r.col0_id < col0);
        relations.get(index)
    }

    /// Total number of rows
    fn num_rows(&self) -> u64 {
        self.block_metadata().iter().map(|b| b.num_rows).sum()
    }

    /// Read every block in order
    fn scan(&self) -> Result<Vec<Row>> {
        let mut rows = Vec::with_capacity(self.num_rows() as usize);
        for block_index in 0..self.block_metadata().len() {
            rows.extend(self.read_block(block_index)?);
        }
        Ok(rows)
    }
}
