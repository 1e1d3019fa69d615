//! Delta triples
//!
//! Pending inserts and deletes on top of the immutable base index, kept as
//! one sorted overlay per permutation.
//!
//! ```text
//!   insert_triple / delete_triple
//!              │
//!              ▼
//!   ┌─────────────────────┐     locate (1 block read)    ┌──────────────┐
//!   │    DeltaTriples     │ ───────────────────────────▶ │  Index (×6)  │
//!   │ inserted / deleted  │                              └──────────────┘
//!   └──────────┬──────────┘
//!              │ one handle per permutation
//!              ▼
//!   ┌─────────────────────────────────────────────┐
//!   │ LocatedTriplesPerBlock  PSO POS SPO SOP ... │
//!   │   block -> { (row, kind, ids) sorted }      │
//!   └─────────────────────────────────────────────┘
//! ```

mod located;
mod manager;
mod per_block;
mod triples;

pub use located::{LocatedTriple, UpdateKind};
pub use manager::{DeltaTriplesManager, LocatedTriplesSnapshot};
pub use per_block::{LocatedTripleHandle, LocatedTriplesPerBlock, NumAddedAndDeleted};
pub use triples::{
    DeltaChange, DeltaCounts, DeltaObserver, DeltaTriples, LocatedTripleHandles,
};
