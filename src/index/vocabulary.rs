//! Vocabularies
//!
//! `Vocabulary` is the sorted, immutable term list of the base index; the
//! id of a term is its position. `LocalVocab` holds terms that only occur
//! in pending updates and hands out local ids for them.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::Id;

/// Sorted term list of the base index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    terms: Vec<String>,
}

impl Vocabulary {
    /// Build from arbitrary terms (sorted and deduplicated here)
    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut terms: Vec<String> = terms.into_iter().map(Into::into).collect();
        terms.sort_unstable();
        terms.dedup();
        Self { terms }
    }

    pub fn id_of(&self, term: &str) -> Option<Id> {
        self.terms
            .binary_search_by(|t| t.as_str().cmp(term))
            .ok()
            .map(|index| Id::new(index as u64))
    }

    pub fn term_of(&self, id: Id) -> Option<&str> {
        self.terms.get(id.vocab_index()?).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(bincode::deserialize_from(reader)?)
    }
}

/// Terms introduced by pending updates that the base vocabulary lacks
///
/// Local ids are stable for the lifetime of the vocabulary (until `clear`).
#[derive(Debug, Clone, Default)]
pub struct LocalVocab {
    terms: Vec<String>,
    ids: HashMap<String, Id>,
}

impl LocalVocab {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of `term`, allocating a new local id on first use
    pub fn get_or_insert(&mut self, term: &str) -> Id {
        if let Some(&id) = self.ids.get(term) {
            return id;
        }
        let id = Id::from_local_index(self.terms.len() as u64);
        self.terms.push(term.to_string());
        self.ids.insert(term.to_string(), id);
        id
    }

    pub fn id_of(&self, term: &str) -> Option<Id> {
        self.ids.get(term).copied()
    }

    pub fn term_of(&self, id: Id) -> Option<&str> {
        self.terms.get(id.local_index()?).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn clear(&mut self) {
        self.terms.clear();
        self.ids.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabulary_ids_follow_sort_order() {
        let vocab = Vocabulary::from_terms(["<c>", "<a>", "<b>", "<a>"]);
        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.id_of("<a>"), Some(Id::new(0)));
        assert_eq!(vocab.id_of("<c>"), Some(Id::new(2)));
        assert_eq!(vocab.id_of("<d>"), None);
        assert_eq!(vocab.term_of(Id::new(1)), Some("<b>"));
        assert_eq!(vocab.term_of(Id::from_local_index(1)), None);
    }

    #[test]
    fn test_local_vocab_is_stable() {
        let mut local = LocalVocab::new();
        let x = local.get_or_insert("<x>");
        let y = local.get_or_insert("<y>");
        assert_ne!(x, y);
        assert_eq!(local.get_or_insert("<x>"), x);
        assert!(x.is_local());
        assert_eq!(local.term_of(y), Some("<y>"));
        assert_eq!(local.len(), 2);

        local.clear();
        assert!(local.is_empty());
        assert_eq!(local.id_of("<x>"), None);
    }
}
