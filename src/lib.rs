//! # tripledelta
//!
//! A triple index over six sorted permutations with an in-memory overlay of
//! pending inserts and deletes:
//! - Block-oriented permutation files with per-block metadata and checksums
//! - Locating a triple with one metadata search and at most one block read
//! - Per-permutation overlays grouped by block and ordered by row
//! - Single-writer manager publishing immutable overlay snapshots
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                DeltaTriplesManager (Mutex)                   │
//! │          modify(..) ──▶ publish Arc<Snapshot>               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                     DeltaTriples                             │
//! │      inserted / deleted ──▶ handles in all six overlays     │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ locate
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │ Vocabulary  │          │ Permutation │
//!   │ + LocalVocab│          │  ×6 blocks  │
//!   └─────────────┘          └──────┬──────┘
//!                                   │
//!                                   ▼
//!                           ┌─────────────┐
//!                           │   Storage   │
//!                           │ (index.pso) │
//!                           └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod delta;
pub mod index;
pub mod storage;
pub mod types;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::IndexConfig;
pub use delta::{
    DeltaChange, DeltaCounts, DeltaObserver, DeltaTriples, DeltaTriplesManager, LocatedTriple,
    LocatedTripleHandle, LocatedTriplesPerBlock, LocatedTriplesSnapshot, NumAddedAndDeleted,
    UpdateKind,
};
pub use error::{Result, StoreError};
pub use index::{BuildSummary, Index, IndexBuilder, LocalVocab, Vocabulary};
pub use types::{Id, IdTriple, PerPermutation, Permutation, Triple};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of tripledelta
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
