//! Index Module
//!
//! The immutable base index: a vocabulary plus all six permutations of the
//! triples, each stored as sorted blocks.
//!
//! ## Layout on disk
//! ```text
//! {index_dir}/
//!   ├── vocabulary.bin
//!   ├── index.pso
//!   ├── index.pos
//!   ├── index.spo
//!   ├── index.sop
//!   ├── index.osp
//!   └── index.ops
//! ```

mod builder;
mod vocabulary;

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::IndexConfig;
use crate::error::{Result, StoreError};
use crate::storage::{BlockSource, MemoryPermutation, PermutationReader};
use crate::types::{Id, IdTriple, PerPermutation, Permutation, Triple};

pub use builder::{BuildSummary, IndexBuilder};
pub use vocabulary::{LocalVocab, Vocabulary};

/// File name of the vocabulary inside the index directory
pub(crate) const VOCABULARY_FILENAME: &str = "vocabulary.bin";

/// Path of one permutation file inside the index directory
pub(crate) fn permutation_path(dir: &Path, permutation: Permutation) -> PathBuf {
    dir.join(format!("index.{}", permutation.file_suffix()))
}

/// The base index the overlay is located against
pub struct Index {
    vocabulary: Vocabulary,
    permutations: PerPermutation<Box<dyn BlockSource>>,
}

impl Index {
    /// Open an index previously written by `IndexBuilder`
    pub fn open(config: &IndexConfig) -> Result<Self> {
        config.validate()?;
        let dir = &config.index_dir;
        if !dir.is_dir() {
            return Err(StoreError::Config(format!(
                "Index directory {} does not exist",
                dir.display()
            )));
        }

        let vocabulary = Vocabulary::load(&dir.join(VOCABULARY_FILENAME))?;
        let permutations = PerPermutation::try_from_fn(|permutation| {
            let reader =
                PermutationReader::open(&permutation_path(dir, permutation), config.verify_checksums)?;
            if reader.permutation() != permutation {
                return Err(StoreError::Storage(format!(
                    "{} holds {} instead of {}",
                    reader.path().display(),
                    reader.permutation(),
                    permutation
                )));
            }
            Ok(Box::new(reader) as Box<dyn BlockSource>)
        })?;

        let index = Self::from_parts(vocabulary, permutations);
        tracing::info!(
            dir = %dir.display(),
            terms = index.vocabulary.len(),
            triples = index.num_triples(),
            "Opened index"
        );
        Ok(index)
    }

    /// Build an in-memory index from text triples
    pub fn from_triples(triples: &[Triple], block_size: usize) -> Result<Self> {
        let vocabulary = Vocabulary::from_terms(triples.iter().flat_map(|t| t.terms()));
        let id_triples = triples
            .iter()
            .map(|t| builder::resolve_in(&vocabulary, t))
            .collect::<Result<Vec<_>>>()?;
        Self::from_id_triples(vocabulary, &id_triples, block_size)
    }

    /// Build an in-memory index from already resolved triples
    pub fn from_id_triples(
        vocabulary: Vocabulary,
        triples: &[IdTriple],
        block_size: usize,
    ) -> Result<Self> {
        let permutations = PerPermutation::try_from_fn(|permutation| {
            let rows = triples.iter().map(|t| t.permute(permutation)).collect();
            Ok::<_, StoreError>(
                Box::new(MemoryPermutation::new(rows, block_size)?) as Box<dyn BlockSource>
            )
        })?;
        Ok(Self::from_parts(vocabulary, permutations))
    }

    /// Assemble an index from a vocabulary and six block sources
    pub fn from_parts(
        vocabulary: Vocabulary,
        permutations: PerPermutation<Box<dyn BlockSource>>,
    ) -> Self {
        Self {
            vocabulary,
            permutations,
        }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn permutation(&self, permutation: Permutation) -> &dyn BlockSource {
        self.permutations[permutation].as_ref()
    }

    /// Number of distinct triples
    pub fn num_triples(&self) -> u64 {
        self.permutation(Permutation::Spo).num_rows()
    }

    /// Term for `id`, looking in the base vocabulary or in `local_vocab`
    pub fn term_of<'a>(&'a self, id: Id, local_vocab: &'a LocalVocab) -> Option<&'a str> {
        if id.is_local() {
            local_vocab.term_of(id)
        } else {
            self.vocabulary.term_of(id)
        }
    }
}

impl fmt::Debug for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Index")
            .field("terms", &self.vocabulary.len())
            .field("triples", &self.num_triples())
            .finish()
    }
}
