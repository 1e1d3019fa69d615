//! Core value types
//!
//! Identifiers, triples and the six permutations of a triple's columns.

mod id;
mod permutation;

pub use id::{Id, IdTriple, Triple};
pub use permutation::{PerPermutation, Permutation};
