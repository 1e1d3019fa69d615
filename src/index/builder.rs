//! Index Builder
//!
//! Writes the vocabulary and all six permutation files for a set of text
//! triples. The permutations are sorted and written in parallel, one scoped
//! thread each.

use std::fs;
use std::path::Path;

use crate::config::IndexConfig;
use crate::error::{Result, StoreError};
use crate::storage::{PermutationFile, PermutationWriter};
use crate::types::{IdTriple, Permutation, Triple};

use super::{permutation_path, Vocabulary, VOCABULARY_FILENAME};

/// What `IndexBuilder::build` wrote
#[derive(Debug, Clone)]
pub struct BuildSummary {
    pub num_triples: u64,
    pub num_terms: usize,
    pub files: Vec<PermutationFile>,
}

/// Builds an on-disk index in `config.index_dir`
pub struct IndexBuilder {
    config: IndexConfig,
}

impl IndexBuilder {
    pub fn new(config: IndexConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Build the index; duplicate input triples are stored once
    pub fn build<I>(&self, triples: I) -> Result<BuildSummary>
    where
        I: IntoIterator<Item = Triple>,
    {
        let triples: Vec<Triple> = triples.into_iter().collect();
        let dir = self.config.index_dir.as_path();
        fs::create_dir_all(dir)?;

        let vocabulary = Vocabulary::from_terms(triples.iter().flat_map(|t| t.terms()));
        vocabulary.save(&dir.join(VOCABULARY_FILENAME))?;

        let mut id_triples = triples
            .iter()
            .map(|t| resolve_in(&vocabulary, t))
            .collect::<Result<Vec<_>>>()?;
        id_triples.sort_unstable();
        id_triples.dedup();

        let block_size = self.config.block_size;
        let files = crossbeam::scope(|scope| {
            let handles: Vec<_> = Permutation::ALL
                .into_iter()
                .map(|permutation| {
                    let id_triples = &id_triples;
                    scope.spawn(move |_| {
                        write_permutation(dir, permutation, id_triples, block_size)
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| {
                    handle.join().map_err(|_| {
                        StoreError::Storage("Permutation writer thread panicked".to_string())
                    })?
                })
                .collect::<Result<Vec<_>>>()
        })
        .map_err(|_| StoreError::Storage("Permutation writer scope panicked".to_string()))??;

        tracing::info!(
            dir = %dir.display(),
            triples = id_triples.len(),
            terms = vocabulary.len(),
            "Built index"
        );

        Ok(BuildSummary {
            num_triples: id_triples.len() as u64,
            num_terms: vocabulary.len(),
            files,
        })
    }
}

/// Sort the triples in `permutation`'s order and write them out
fn write_permutation(
    dir: &Path,
    permutation: Permutation,
    triples: &[IdTriple],
    block_size: usize,
) -> Result<PermutationFile> {
    let mut rows: Vec<_> = triples.iter().map(|t| t.permute(permutation)).collect();
    rows.sort_unstable();

    let mut writer = PermutationWriter::new(&permutation_path(dir, permutation), permutation, block_size)?;
    for row in rows {
        writer.add(row)?;
    }
    writer.finish()
}

/// Resolve a triple whose terms are all in `vocabulary`
pub(super) fn resolve_in(vocabulary: &Vocabulary, triple: &Triple) -> Result<IdTriple> {
    let [s, p, o] = triple.terms().map(|term| vocabulary.id_of(term));
    match (s, p, o) {
        (Some(s), Some(p), Some(o)) => Ok(IdTriple::new(s, p, o)),
        _ => Err(StoreError::Storage(format!(
            "Triple {} has a term missing from the vocabulary",
            triple
        ))),
    }
}
