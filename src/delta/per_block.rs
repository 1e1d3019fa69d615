//! Located triples grouped by block
//!
//! One `LocatedTriplesPerBlock` per permutation maps a block index to the
//! ordered set of pending changes located in that block. Entries are
//! ordered by row, then delete before insert, then by ids.

use std::collections::{BTreeMap, BTreeSet};

use crate::storage::{BlockMetadata, Row};
use crate::types::{IdTriple, Permutation};

use super::located::{LocatedTriple, UpdateKind};

/// Token for exactly one entry of a `LocatedTriplesPerBlock`
///
/// Handles are neither `Clone` nor `Copy`: `erase` consumes the handle, so
/// an entry cannot be erased twice through the same token. An entry is
/// identified by its value, which stays valid however many other entries
/// are added to or erased from the same block.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "dropping a handle makes its entry impossible to erase individually"]
pub struct LocatedTripleHandle {
    permutation: Permutation,
    entry: LocatedTriple,
}

impl LocatedTripleHandle {
    pub fn permutation(&self) -> Permutation {
        self.permutation
    }

    pub fn located_triple(&self) -> &LocatedTriple {
        &self.entry
    }
}

/// Counts of the pending inserts and deletes in one block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NumAddedAndDeleted {
    pub num_added: usize,
    pub num_deleted: usize,
}

/// Pending changes of one permutation, grouped by block
#[derive(Debug, Clone)]
pub struct LocatedTriplesPerBlock {
    permutation: Permutation,
    map: BTreeMap<usize, BTreeSet<LocatedTriple>>,
    num_triples: usize,
}

impl LocatedTriplesPerBlock {
    pub fn new(permutation: Permutation) -> Self {
        Self {
            permutation,
            map: BTreeMap::new(),
            num_triples: 0,
        }
    }

    pub fn permutation(&self) -> Permutation {
        self.permutation
    }

    /// Add an entry to its block and return the handle to erase it with
    pub fn add(&mut self, located_triple: LocatedTriple) -> LocatedTripleHandle {
        let inserted = self
            .map
            .entry(located_triple.block_index)
            .or_default()
            .insert(located_triple);
        if inserted {
            self.num_triples += 1;
        } else {
            tracing::warn!(
                permutation = %self.permutation,
                %located_triple,
                "Located triple added twice"
            );
        }
        LocatedTripleHandle {
            permutation: self.permutation,
            entry: located_triple,
        }
    }

    /// Remove the entry `handle` refers to
    ///
    /// A block whose last entry is erased is dropped from the map.
    pub fn erase(&mut self, handle: LocatedTripleHandle) {
        debug_assert_eq!(
            handle.permutation, self.permutation,
            "handle belongs to another permutation"
        );
        let block_index = handle.entry.block_index;
        let Some(entries) = self.map.get_mut(&block_index) else {
            tracing::warn!(permutation = %self.permutation, block_index, "Erase from unknown block");
            return;
        };
        if entries.remove(&handle.entry) {
            self.num_triples -= 1;
        }
        if entries.is_empty() {
            self.map.remove(&block_index);
        }
    }

    /// Remove all entries
    pub fn clear(&mut self) {
        self.map.clear();
        self.num_triples = 0;
    }

    /// Number of blocks with at least one entry
    pub fn num_blocks(&self) -> usize {
        self.map.len()
    }

    /// Number of entries over all blocks
    pub fn num_triples(&self) -> usize {
        self.num_triples
    }

    pub fn is_empty(&self) -> bool {
        self.num_triples == 0
    }

    pub fn has_updates(&self, block_index: usize) -> bool {
        self.map.contains_key(&block_index)
    }

    pub fn num_triples_in_block(&self, block_index: usize) -> NumAddedAndDeleted {
        let mut counts = NumAddedAndDeleted::default();
        for entry in self.iter_block(block_index) {
            match entry.kind() {
                UpdateKind::Insert => counts.num_added += 1,
                UpdateKind::Delete => counts.num_deleted += 1,
            }
        }
        counts
    }

    /// Entries of one block in merge order
    pub fn iter_block(&self, block_index: usize) -> impl Iterator<Item = &LocatedTriple> {
        self.map.get(&block_index).into_iter().flatten()
    }

    /// All blocks with entries, in block order
    pub fn blocks(&self) -> impl Iterator<Item = (usize, &BTreeSet<LocatedTriple>)> {
        self.map.iter().map(|(&index, entries)| (index, entries))
    }

    pub fn contains(&self, located_triple: &LocatedTriple) -> bool {
        self.map
            .get(&located_triple.block_index)
            .map_or(false, |entries| entries.contains(located_triple))
    }

    /// Whether `triple` is pending insertion (`is_insertion`) or deletion
    pub fn is_located_triple(&self, triple: &IdTriple, is_insertion: bool) -> bool {
        let ids = triple.permute(self.permutation);
        let kind = if is_insertion {
            UpdateKind::Insert
        } else {
            UpdateKind::Delete
        };
        self.map
            .values()
            .flatten()
            .any(|entry| entry.ids() == ids && entry.kind() == kind)
    }

    /// Merge the rows of block `block_index` with the block's entries
    ///
    /// Inserted triples are emitted in front of the row they were located
    /// at, deleted triples drop the row they were located at. Entries past
    /// the end of `block` (including those of the past-the-last block, where
    /// `block` is empty) are emitted at the end if they are inserts.
    pub fn merge_triples(&self, block_index: usize, block: &[Row]) -> Vec<Row> {
        let counts = self.num_triples_in_block(block_index);
        let mut result = Vec::with_capacity(block.len() + counts.num_added);
        let mut entries = self.iter_block(block_index).peekable();

        for (row_index, row) in block.iter().enumerate() {
            let mut deleted = false;
            while let Some(entry) = entries.next_if(|e| e.row_index_in_block == row_index) {
                match entry.kind() {
                    UpdateKind::Delete => {
                        debug_assert_eq!(entry.ids(), *row, "deleted triple differs from its row");
                        deleted = true;
                    }
                    UpdateKind::Insert => result.push(entry.ids()),
                }
            }
            if !deleted {
                result.push(*row);
            }
        }

        result.extend(
            entries
                .filter(|e| e.kind() == UpdateKind::Insert)
                .map(|e| e.ids()),
        );
        result
    }

    /// Block metadata widened to cover the pending changes
    ///
    /// Each block with entries gets its first/last triple extended to the
    /// smallest/largest entry. Entries past the last block produce one
    /// extra, empty block at the end.
    pub fn augmented_metadata(&self, original: &[BlockMetadata]) -> Vec<BlockMetadata> {
        let mut augmented = original.to_vec();
        for (block_index, entries) in self.blocks() {
            let (Some(smallest), Some(largest)) = (
                entries.iter().map(LocatedTriple::ids).min(),
                entries.iter().map(LocatedTriple::ids).max(),
            ) else {
                continue;
            };
            match augmented.get_mut(block_index) {
                Some(block) => {
                    block.first_triple = block.first_triple.min(smallest);
                    block.last_triple = block.last_triple.max(largest);
                }
                None if block_index == original.len() => augmented.push(BlockMetadata {
                    first_triple: smallest,
                    last_triple: largest,
                    num_rows: 0,
                    offset: 0,
                    compressed_size: 0,
                    crc: 0,
                }),
                None => tracing::warn!(
                    permutation = %self.permutation,
                    block_index,
                    num_blocks = original.len(),
                    "Located triples beyond the past-the-last block"
                ),
            }
        }
        augmented
    }
}
