//! Located triples
//!
//! Finding the position of a triple inside one permutation of the base
//! index: the block it belongs to and the row inside that block where it
//! either already is or would have to be inserted.

use std::cmp::Ordering;
use std::fmt;

use crate::error::{Result, StoreError};
use crate::storage::BlockSource;
use crate::types::{Id, IdTriple, Permutation};

/// Whether an overlay entry adds or removes a triple
///
/// At equal row position a delete orders before an insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UpdateKind {
    Delete,
    Insert,
}

/// Position of one triple within one permutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocatedTriple {
    /// Index of the block the triple belongs to; equal to the number of
    /// blocks when the triple is larger than everything in the permutation
    pub block_index: usize,
    /// Row inside the block: the triple's row if it exists, otherwise the
    /// row it would be inserted before
    pub row_index_in_block: usize,
    /// The triple's ids in the permutation's column order
    pub id1: Id,
    pub id2: Id,
    pub id3: Id,
    /// Whether the base index already contains the triple
    pub exists_in_index: bool,
}

impl LocatedTriple {
    /// Row index of triples located past the last block
    pub const NO_ROW_INDEX: usize = usize::MAX;

    pub fn ids(&self) -> [Id; 3] {
        [self.id1, self.id2, self.id3]
    }

    /// Pending changes never insert what exists nor delete what doesn't,
    /// so the existence flag alone decides the kind of an overlay entry.
    pub fn kind(&self) -> UpdateKind {
        if self.exists_in_index {
            UpdateKind::Delete
        } else {
            UpdateKind::Insert
        }
    }

    pub fn is_past_the_end(&self) -> bool {
        self.row_index_in_block == Self::NO_ROW_INDEX
    }

    /// Locate `triple` in `source`, which stores `permutation`
    pub fn locate_triple(
        triple: &IdTriple,
        permutation: Permutation,
        source: &dyn BlockSource,
    ) -> Result<Self> {
        let [id1, id2, id3] = triple.permute(permutation);
        Self::locate(id1, id2, id3, source)
    }

    /// Locate the permuted triple `(id1, id2, id3)` in `source`
    ///
    /// Searches the block metadata, then reads at most one block. Fails only
    /// if that block cannot be read or the relation metadata is inconsistent
    /// with the block metadata.
    pub fn locate(id1: Id, id2: Id, id3: Id, source: &dyn BlockSource) -> Result<Self> {
        let key = [id1, id2, id3];
        let blocks = source.block_metadata();

        // The triple belongs to the first block whose last row is >= it.
        let block_index = blocks.partition_point(|b| b.last_triple < key);
        let Some(block) = blocks.get(block_index) else {
            tracing::trace!(?key, block_index, "Located past the last block");
            return Ok(Self {
                block_index,
                row_index_in_block: Self::NO_ROW_INDEX,
                id1,
                id2,
                id3,
                exists_in_index: false,
            });
        };

        let rows = source.read_block(block_index)?;

        // If the block starts with a larger key than id1, the relation of id1
        // (if any) ended with the previous block and every row of it is
        // smaller than the triple. Searching for id1 would then find that
        // relation instead of the one the triple must be inserted before.
        let first_key = block.first_triple[0];
        let search_key = if first_key > id1 { first_key } else { id1 };

        let relation = source.relation_lower_bound(search_key).ok_or_else(|| {
            StoreError::Storage(format!(
                "No relation with key >= {} although block {} ends with {:?}",
                search_key, block_index, block.last_triple
            ))
        })?;
        let relation_key = relation.col0_id;

        let relation_start = rows.partition_point(|r| r[0] < relation_key);
        let relation_end = rows.partition_point(|r| r[0] <= relation_key);
        let relation_rows = &rows[relation_start..relation_end];

        let (row_index_in_block, exists_in_index) = if relation_key == id1 {
            let offset = relation_rows.partition_point(|r| (r[1], r[2]) < (id2, id3));
            let exists = relation_rows
                .get(offset)
                .map_or(false, |r| r[1] == id2 && r[2] == id3);
            (relation_start + offset, exists)
        } else {
            // id1 does not occur in the permutation; the triple goes in front
            // of the next larger relation.
            (relation_start, false)
        };

        tracing::trace!(
            ?key,
            block_index,
            row_index_in_block,
            exists_in_index,
            "Located triple"
        );

        Ok(Self {
            block_index,
            row_index_in_block,
            id1,
            id2,
            id3,
            exists_in_index,
        })
    }
}

impl Ord for LocatedTriple {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.block_index, self.row_index_in_block, self.kind(), self.ids()).cmp(&(
            other.block_index,
            other.row_index_in_block,
            other.kind(),
            other.ids(),
        ))
    }
}

impl PartialOrd for LocatedTriple {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for LocatedTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let row = if self.is_past_the_end() {
            "end".to_string()
        } else {
            self.row_index_in_block.to_string()
        };
        write!(
            f,
            "LT({} {} {} {} {} {})",
            self.block_index, row, self.id1, self.id2, self.id3, self.exists_in_index
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryPermutation, Row};

    fn row(a: u64, b: u64, c: u64) -> Row {
        [Id::new(a), Id::new(b), Id::new(c)]
    }

    fn locate(source: &MemoryPermutation, a: u64, b: u64, c: u64) -> LocatedTriple {
        LocatedTriple::locate(Id::new(a), Id::new(b), Id::new(c), source).unwrap()
    }

    fn two_blocks() -> MemoryPermutation {
        MemoryPermutation::from_blocks(vec![
            vec![row(1, 1, 1), row(2, 2, 2), row(3, 3, 3), row(4, 4, 4), row(5, 5, 5)],
            vec![row(6, 1, 1), row(6, 2, 2), row(7, 1, 1)],
        ])
        .unwrap()
    }

    #[test]
    fn test_triple_after_relation_ending_a_block_goes_to_next_block() {
        let source = two_blocks();
        let located = locate(&source, 5, 9, 9);

        assert_eq!(located.block_index, 1);
        assert_eq!(located.row_index_in_block, 0);
        assert!(!located.exists_in_index);
        assert_eq!(source.blocks_read(), 1);
    }

    #[test]
    fn test_exact_match_and_insert_position() {
        let source =
            MemoryPermutation::from_blocks(vec![vec![row(3, 1, 1), row(3, 2, 2), row(3, 3, 3)]])
                .unwrap();

        let found = locate(&source, 3, 2, 2);
        assert_eq!((found.block_index, found.row_index_in_block), (0, 1));
        assert!(found.exists_in_index);

        let missing = locate(&source, 3, 2, 5);
        assert_eq!((missing.block_index, missing.row_index_in_block), (0, 2));
        assert!(!missing.exists_in_index);
    }

    #[test]
    fn test_past_the_end_reads_no_block() {
        let source = two_blocks();
        let located = locate(&source, 7, 1, 2);

        assert_eq!(located.block_index, 2);
        assert!(located.is_past_the_end());
        assert!(!located.exists_in_index);
        assert_eq!(source.blocks_read(), 0);
    }

    #[test]
    fn test_absent_key_goes_before_next_relation() {
        let source = MemoryPermutation::from_blocks(vec![vec![
            row(2, 1, 1),
            row(2, 5, 5),
            row(4, 0, 0),
            row(4, 1, 1),
        ]])
        .unwrap();

        let located = locate(&source, 3, 9, 9);
        assert_eq!(located.row_index_in_block, 2);
        assert!(!located.exists_in_index);

        let before_all = locate(&source, 1, 0, 0);
        assert_eq!(before_all.row_index_in_block, 0);
        assert!(!before_all.exists_in_index);
    }

    #[test]
    fn test_relation_spanning_blocks() {
        let source = MemoryPermutation::from_blocks(vec![
            vec![row(1, 1, 1), row(2, 1, 1), row(2, 2, 2)],
            vec![row(2, 4, 4), row(2, 6, 6), row(3, 1, 1)],
        ])
        .unwrap();

        let in_first = locate(&source, 2, 2, 2);
        assert_eq!((in_first.block_index, in_first.row_index_in_block), (0, 2));
        assert!(in_first.exists_in_index);

        let in_second = locate(&source, 2, 5, 0);
        assert_eq!((in_second.block_index, in_second.row_index_in_block), (1, 1));
        assert!(!in_second.exists_in_index);

        let between = locate(&source, 2, 3, 0);
        assert_eq!((between.block_index, between.row_index_in_block), (1, 0));
        assert!(!between.exists_in_index);
    }

    #[test]
    fn test_every_row_is_found_where_it_is() {
        let rows: Vec<Row> = (0..50u64).map(|i| row(i / 7, i % 7, i)).collect();
        let source = MemoryPermutation::new(rows.clone(), 4).unwrap();

        for (i, r) in rows.iter().enumerate() {
            let located = LocatedTriple::locate(r[0], r[1], r[2], &source).unwrap();
            assert!(located.exists_in_index, "row {:?}", r);
            assert_eq!(located.block_index, i / 4);
            assert_eq!(located.row_index_in_block, i % 4);
        }
    }

    #[test]
    fn test_empty_permutation() {
        let source = MemoryPermutation::new(Vec::new(), 4).unwrap();
        let located = locate(&source, 1, 2, 3);
        assert_eq!(located.block_index, 0);
        assert!(located.is_past_the_end());
    }

    #[test]
    fn test_ordering_puts_delete_before_insert() {
        let delete = LocatedTriple {
            block_index: 0,
            row_index_in_block: 3,
            id1: Id::new(9),
            id2: Id::new(9),
            id3: Id::new(9),
            exists_in_index: true,
        };
        let insert = LocatedTriple {
            id1: Id::new(1),
            exists_in_index: false,
            ..delete
        };
        assert!(delete < insert);
        assert_eq!(delete.kind(), UpdateKind::Delete);
        assert_eq!(insert.kind(), UpdateKind::Insert);
    }
}
