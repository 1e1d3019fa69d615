//! Delta triples
//!
//! The pending inserts and deletes of one writer session, kept consistent
//! across all six permutations.
//!
//! Every triple is in one of three states: absent from both sets, pending
//! insert, or pending delete. Inserting a pending delete (or deleting a
//! pending insert) cancels the earlier change and returns the triple to
//! the first state; there is no direct transition between the two pending
//! states.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Result, StoreError};
use crate::index::{Index, LocalVocab};
use crate::types::{Id, IdTriple, PerPermutation, Permutation, Triple};

use super::located::LocatedTriple;
use super::per_block::{LocatedTripleHandle, LocatedTriplesPerBlock};

/// Permutation used to decide whether a triple exists in the base index
const EXISTENCE_CHECK_PERMUTATION: Permutation = Permutation::Pso;

/// One handle per permutation for the same pending triple
#[derive(Debug)]
pub struct LocatedTripleHandles(PerPermutation<LocatedTripleHandle>);

impl LocatedTripleHandles {
    pub fn get(&self, permutation: Permutation) -> &LocatedTripleHandle {
        &self.0[permutation]
    }
}

/// Number of pending inserts and deletes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeltaCounts {
    pub triples_inserted: usize,
    pub triples_deleted: usize,
}

impl DeltaCounts {
    /// Change in the number of triples once the deltas are applied
    pub fn net(&self) -> i64 {
        self.triples_inserted as i64 - self.triples_deleted as i64
    }
}

/// What a successful insert or delete did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaChange {
    /// The triple became a pending insert
    Inserted,
    /// The triple became a pending delete
    Deleted,
    /// An insert cancelled a pending delete
    DeleteCancelled,
    /// A delete cancelled a pending insert
    InsertCancelled,
}

/// Receives notifications about successful changes
pub trait DeltaObserver: Send + Sync {
    fn on_change(&self, change: DeltaChange, triple: &IdTriple);

    fn on_clear(&self, _discarded: DeltaCounts) {}
}

impl<F> DeltaObserver for F
where
    F: Fn(DeltaChange, &IdTriple) + Send + Sync,
{
    fn on_change(&self, change: DeltaChange, triple: &IdTriple) {
        self(change, triple)
    }
}

/// Pending changes on top of an immutable `Index`
pub struct DeltaTriples {
    index: Arc<Index>,
    local_vocab: LocalVocab,
    inserted: HashMap<IdTriple, LocatedTripleHandles>,
    deleted: HashMap<IdTriple, LocatedTripleHandles>,
    located: PerPermutation<LocatedTriplesPerBlock>,
    observer: Option<Box<dyn DeltaObserver>>,
}

impl DeltaTriples {
    pub fn new(index: Arc<Index>) -> Self {
        Self {
            index,
            local_vocab: LocalVocab::new(),
            inserted: HashMap::new(),
            deleted: HashMap::new(),
            located: PerPermutation::from_fn(LocatedTriplesPerBlock::new),
            observer: None,
        }
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn local_vocab(&self) -> &LocalVocab {
        &self.local_vocab
    }

    pub fn set_observer(&mut self, observer: impl DeltaObserver + 'static) {
        self.observer = Some(Box::new(observer));
    }

    // =========================================================================
    // Updates
    // =========================================================================

    /// Insert a text triple, adding unknown terms to the local vocabulary
    pub fn insert_triple(&mut self, triple: &Triple) -> Result<()> {
        let id_triple = match self.resolve_existing(triple) {
            Some(id_triple) => id_triple,
            None => {
                let [s, p, o] = triple.terms().map(|term| self.id_or_insert(term));
                IdTriple::new(s, p, o)
            }
        };
        self.insert_id_triple(id_triple)
    }

    /// Delete a text triple; a triple with an unknown term cannot exist
    pub fn delete_triple(&mut self, triple: &Triple) -> Result<()> {
        match self.resolve_existing(triple) {
            Some(id_triple) => self.delete_id_triple(id_triple),
            None => Err(StoreError::DoesNotExist(triple.to_string())),
        }
    }

    pub fn insert_id_triple(&mut self, triple: IdTriple) -> Result<()> {
        if self.inserted.contains_key(&triple) {
            return Err(StoreError::AlreadyInserted(triple.to_string()));
        }

        if let Some(handles) = self.deleted.remove(&triple) {
            self.erase_handles(handles);
            tracing::debug!(%triple, "Insert cancelled pending delete");
            self.notify(DeltaChange::DeleteCancelled, &triple);
            return Ok(());
        }

        let check = self.locate(&triple, EXISTENCE_CHECK_PERMUTATION)?;
        if check.exists_in_index {
            return Err(StoreError::AlreadyExistsInIndex(triple.to_string()));
        }

        let handles = self.locate_and_add(&triple, check)?;
        self.inserted.insert(triple, handles);
        tracing::debug!(%triple, "Triple pending insert");
        self.notify(DeltaChange::Inserted, &triple);
        Ok(())
    }

    pub fn delete_id_triple(&mut self, triple: IdTriple) -> Result<()> {
        if self.deleted.contains_key(&triple) {
            return Err(StoreError::AlreadyDeleted(triple.to_string()));
        }

        if let Some(handles) = self.inserted.remove(&triple) {
            self.erase_handles(handles);
            tracing::debug!(%triple, "Delete cancelled pending insert");
            self.notify(DeltaChange::InsertCancelled, &triple);
            return Ok(());
        }

        let check = self.locate(&triple, EXISTENCE_CHECK_PERMUTATION)?;
        if !check.exists_in_index {
            return Err(StoreError::DoesNotExist(triple.to_string()));
        }

        let handles = self.locate_and_add(&triple, check)?;
        self.deleted.insert(triple, handles);
        tracing::debug!(%triple, "Triple pending delete");
        self.notify(DeltaChange::Deleted, &triple);
        Ok(())
    }

    /// Discard all pending changes and the local vocabulary
    pub fn clear(&mut self) {
        let discarded = self.counts();
        self.inserted.clear();
        self.deleted.clear();
        self.located
            .for_each_permutation_mut(|_, located| located.clear());
        self.local_vocab.clear();
        tracing::debug!(
            inserted = discarded.triples_inserted,
            deleted = discarded.triples_deleted,
            "Cleared delta triples"
        );
        if let Some(observer) = &self.observer {
            observer.on_clear(discarded);
        }
    }

    // =========================================================================
    // Read Access
    // =========================================================================

    /// The pending changes of `permutation`, grouped by block
    pub fn triples_with_positions_per_block(
        &self,
        permutation: Permutation,
    ) -> &LocatedTriplesPerBlock {
        &self.located[permutation]
    }

    pub fn located_triples(&self) -> &PerPermutation<LocatedTriplesPerBlock> {
        &self.located
    }

    pub fn num_inserted(&self) -> usize {
        self.inserted.len()
    }

    pub fn num_deleted(&self) -> usize {
        self.deleted.len()
    }

    pub fn counts(&self) -> DeltaCounts {
        DeltaCounts {
            triples_inserted: self.inserted.len(),
            triples_deleted: self.deleted.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.deleted.is_empty()
    }

    pub fn contains_inserted(&self, triple: &IdTriple) -> bool {
        self.inserted.contains_key(triple)
    }

    pub fn contains_deleted(&self, triple: &IdTriple) -> bool {
        self.deleted.contains_key(triple)
    }

    pub fn inserted_triples(&self) -> impl Iterator<Item = &IdTriple> {
        self.inserted.keys()
    }

    pub fn deleted_triples(&self) -> impl Iterator<Item = &IdTriple> {
        self.deleted.keys()
    }

    pub fn handles_of(&self, triple: &IdTriple) -> Option<&LocatedTripleHandles> {
        self.inserted.get(triple).or_else(|| self.deleted.get(triple))
    }

    /// Check that every pending triple has exactly its entries in all six
    /// registries and nothing else is there
    pub fn is_consistent(&self) -> bool {
        let expected = self.inserted.len() + self.deleted.len();
        let sizes_match = self
            .located
            .iter()
            .all(|(_, located)| located.num_triples() == expected);

        let entries_match = self
            .inserted
            .iter()
            .map(|(triple, handles)| (triple, handles, false))
            .chain(self.deleted.iter().map(|(triple, handles)| (triple, handles, true)))
            .all(|(triple, handles, exists)| {
                self.located.iter().all(|(permutation, located)| {
                    let entry = handles.get(permutation).located_triple();
                    located.contains(entry)
                        && entry.ids() == triple.permute(permutation)
                        && entry.exists_in_index == exists
                })
            });

        sizes_match && entries_match
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn locate(&self, triple: &IdTriple, permutation: Permutation) -> Result<LocatedTriple> {
        LocatedTriple::locate_triple(triple, permutation, self.index.permutation(permutation))
    }

    /// Locate `triple` in every permutation, then add it to every registry
    ///
    /// All locating happens before the first `add`, so a failed block read
    /// leaves the registries untouched.
    fn locate_and_add(
        &mut self,
        triple: &IdTriple,
        check: LocatedTriple,
    ) -> Result<LocatedTripleHandles> {
        let located = PerPermutation::try_from_fn(|permutation| {
            if permutation == EXISTENCE_CHECK_PERMUTATION {
                Ok(check)
            } else {
                self.locate(triple, permutation)
            }
        })?;

        located.for_each_permutation(|permutation, located_triple| {
            if located_triple.exists_in_index != check.exists_in_index {
                tracing::warn!(
                    %triple,
                    %permutation,
                    "Permutations disagree on whether the triple exists"
                );
            }
        });

        let handles = located.map(|permutation, located_triple| {
            self.located[permutation].add(located_triple)
        });
        Ok(LocatedTripleHandles(handles))
    }

    fn erase_handles(&mut self, handles: LocatedTripleHandles) {
        for (permutation, handle) in handles.0 {
            self.located[permutation].erase(handle);
        }
    }

    fn resolve_existing(&self, triple: &Triple) -> Option<IdTriple> {
        let [s, p, o] = triple.terms().map(|term| {
            self.index
                .vocabulary()
                .id_of(term)
                .or_else(|| self.local_vocab.id_of(term))
        });
        Some(IdTriple::new(s?, p?, o?))
    }

    fn id_or_insert(&mut self, term: &str) -> Id {
        match self.index.vocabulary().id_of(term) {
            Some(id) => id,
            None => self.local_vocab.get_or_insert(term),
        }
    }

    fn notify(&self, change: DeltaChange, triple: &IdTriple) {
        if let Some(observer) = &self.observer {
            observer.on_change(change, triple);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn index() -> Arc<Index> {
        let triples = vec![
            Triple::new("<a>", "<p>", "<b>"),
            Triple::new("<a>", "<p>", "<c>"),
            Triple::new("<b>", "<q>", "<c>"),
            Triple::new("<c>", "<p>", "<a>"),
        ];
        Arc::new(Index::from_triples(&triples, 2).unwrap())
    }

    #[test]
    fn test_insert_new_terms_uses_local_vocab() {
        let mut delta = DeltaTriples::new(index());
        delta.insert_triple(&Triple::new("<a>", "<p>", "<new>")).unwrap();

        assert_eq!(delta.local_vocab().len(), 1);
        let new_id = delta.local_vocab().id_of("<new>").unwrap();
        assert!(new_id.is_local());
        assert_eq!(delta.num_inserted(), 1);
        assert!(delta.is_consistent());
    }

    #[test]
    fn test_delete_with_unknown_term_changes_nothing() {
        let mut delta = DeltaTriples::new(index());
        let result = delta.delete_triple(&Triple::new("<a>", "<p>", "<zzz>"));

        assert!(matches!(result, Err(StoreError::DoesNotExist(_))));
        assert!(delta.local_vocab().is_empty());
        assert!(delta.is_empty());
    }

    #[test]
    fn test_observer_sees_changes() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let mut delta = DeltaTriples::new(index());
        delta.set_observer(move |change: DeltaChange, _: &IdTriple| {
            sink.lock().unwrap().push(change);
        });

        let existing = Triple::new("<a>", "<p>", "<b>");
        let fresh = Triple::new("<b>", "<p>", "<a>");
        delta.delete_triple(&existing).unwrap();
        delta.insert_triple(&fresh).unwrap();
        delta.insert_triple(&existing).unwrap();
        delta.delete_triple(&fresh).unwrap();
        assert!(delta.insert_triple(&Triple::new("<a>", "<p>", "<c>")).is_err());

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                DeltaChange::Deleted,
                DeltaChange::Inserted,
                DeltaChange::DeleteCancelled,
                DeltaChange::InsertCancelled,
            ]
        );
    }

    #[test]
    fn test_counts_net() {
        let counts = DeltaCounts {
            triples_inserted: 2,
            triples_deleted: 5,
        };
        assert_eq!(counts.net(), -3);
    }
}
