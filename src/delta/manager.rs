//! Delta triples manager
//!
//! Serializes writers on a `DeltaTriples` and publishes an immutable
//! snapshot of the six overlays after every modification. Readers clone
//! the `Arc` of the current snapshot and never wait for a writer that is
//! still locating triples.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::error::Result;
use crate::index::Index;
use crate::types::{PerPermutation, Permutation};

use super::per_block::LocatedTriplesPerBlock;
use super::triples::{DeltaCounts, DeltaTriples};

/// The overlay as it was after one modification
#[derive(Debug, Clone)]
pub struct LocatedTriplesSnapshot {
    located: PerPermutation<LocatedTriplesPerBlock>,
    counts: DeltaCounts,
    version: u64,
}

impl LocatedTriplesSnapshot {
    fn capture(delta: &DeltaTriples, version: u64) -> Self {
        Self {
            located: delta.located_triples().clone(),
            counts: delta.counts(),
            version,
        }
    }

    pub fn located_triples(&self, permutation: Permutation) -> &LocatedTriplesPerBlock {
        &self.located[permutation]
    }

    pub fn counts(&self) -> DeltaCounts {
        self.counts
    }

    /// Number of modifications published before this snapshot
    pub fn version(&self) -> u64 {
        self.version
    }
}

/// Shared owner of the single `DeltaTriples` of an index
pub struct DeltaTriplesManager {
    delta: Mutex<DeltaTriples>,
    snapshot: RwLock<Arc<LocatedTriplesSnapshot>>,
}

impl DeltaTriplesManager {
    pub fn new(index: Arc<Index>) -> Self {
        let delta = DeltaTriples::new(index);
        let snapshot = Arc::new(LocatedTriplesSnapshot::capture(&delta, 0));
        Self {
            delta: Mutex::new(delta),
            snapshot: RwLock::new(snapshot),
        }
    }

    /// Run `f` with exclusive access and publish the resulting overlay
    ///
    /// The snapshot is republished even if `f` fails, since it may have
    /// applied some changes before the error.
    pub fn modify<T>(&self, f: impl FnOnce(&mut DeltaTriples) -> Result<T>) -> Result<T> {
        let mut delta = self.delta.lock();
        let result = f(&mut delta);
        self.publish(&delta);
        result
    }

    /// Discard all pending changes
    pub fn clear(&self) {
        let mut delta = self.delta.lock();
        delta.clear();
        self.publish(&delta);
    }

    pub fn current_snapshot(&self) -> Arc<LocatedTriplesSnapshot> {
        self.snapshot.read().clone()
    }

    fn publish(&self, delta: &DeltaTriples) {
        let mut current = self.snapshot.write();
        let version = current.version + 1;
        *current = Arc::new(LocatedTriplesSnapshot::capture(delta, version));
        tracing::debug!(
            version,
            inserted = delta.num_inserted(),
            deleted = delta.num_deleted(),
            "Published located triples snapshot"
        );
    }
}
