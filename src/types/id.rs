//! Identifiers and triples
//!
//! An `Id` is an opaque, totally ordered identifier produced by the
//! vocabulary. Base-vocabulary ids are dense indexes into the sorted term
//! list; ids with the top bit set belong to the session-local vocabulary.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Permutation;
use crate::error::{Result, StoreError};

/// An opaque identifier of an RDF term
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Id(u64);

impl Id {
    /// Marks ids handed out by a local vocabulary
    const LOCAL_BIT: u64 = 1 << 63;

    /// Create an id from its raw bits
    pub const fn new(bits: u64) -> Self {
        Self(bits)
    }

    /// Create the id of the `index`-th entry of a local vocabulary
    pub const fn from_local_index(index: u64) -> Self {
        Self(index | Self::LOCAL_BIT)
    }

    /// Raw bits
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Whether this id was allocated by a local vocabulary
    pub const fn is_local(self) -> bool {
        self.0 & Self::LOCAL_BIT != 0
    }

    /// Index into the base vocabulary, if this is a base id
    pub fn vocab_index(self) -> Option<usize> {
        (!self.is_local()).then_some(self.0 as usize)
    }

    /// Index into the local vocabulary, if this is a local id
    pub fn local_index(self) -> Option<usize> {
        self.is_local().then_some((self.0 & !Self::LOCAL_BIT) as usize)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.local_index() {
            Some(index) => write!(f, "L{}", index),
            None => write!(f, "{}", self.0),
        }
    }
}

/// A triple of resolved ids in (subject, predicate, object) order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IdTriple {
    ids: [Id; 3],
}

impl IdTriple {
    pub fn new(subject: Id, predicate: Id, object: Id) -> Self {
        Self {
            ids: [subject, predicate, object],
        }
    }

    /// Rebuild the triple from ids given in `permutation`'s column order
    pub fn from_permuted(permuted: [Id; 3], permutation: Permutation) -> Self {
        let mut ids = permuted;
        for (column, &position) in permutation.key_order().iter().enumerate() {
            ids[position] = permuted[column];
        }
        Self { ids }
    }

    pub fn subject(&self) -> Id {
        self.ids[0]
    }

    pub fn predicate(&self) -> Id {
        self.ids[1]
    }

    pub fn object(&self) -> Id {
        self.ids[2]
    }

    pub fn ids(&self) -> [Id; 3] {
        self.ids
    }

    /// The ids in `permutation`'s column order
    pub fn permute(&self, permutation: Permutation) -> [Id; 3] {
        permutation.key_order().map(|position| self.ids[position])
    }
}

impl From<[u64; 3]> for IdTriple {
    fn from(bits: [u64; 3]) -> Self {
        Self {
            ids: bits.map(Id::new),
        }
    }
}

impl fmt::Display for IdTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.ids[0], self.ids[1], self.ids[2])
    }
}

/// A triple of external RDF terms (IRIs, literals, blank nodes) as text
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Triple {
    pub subject: String,
    pub predicate: String,
    pub object: String,
}

impl Triple {
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }

    pub fn terms(&self) -> [&str; 3] {
        [&self.subject, &self.predicate, &self.object]
    }

    /// Parse `S P O` or `S P O .` with whitespace-free terms
    ///
    /// Blank lines and lines starting with `#` yield `Ok(None)`.
    pub fn parse_line(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        let mut terms: Vec<&str> = line.split_whitespace().collect();
        if terms.last() == Some(&".") {
            terms.pop();
        }
        match terms.as_slice() {
            [s, p, o] => Ok(Some(Self::new(*s, *p, *o))),
            _ => Err(StoreError::Parse(format!(
                "Expected three terms, got {}: {}",
                terms.len(),
                line
            ))),
        }
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)
    }
}
