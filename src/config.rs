//! Configuration for tripledelta
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{Result, StoreError};

/// Configuration for building and opening an index
#[derive(Debug, Clone)]
pub struct IndexConfig {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all index files
    /// Internal structure:
    ///   {index_dir}/
    ///     ├── vocabulary.bin     (sorted term list)
    ///     ├── index.pso          (one file per permutation)
    ///     ├── ...
    ///     └── index.ops
    pub index_dir: PathBuf,

    /// Rows per block when writing a permutation
    pub block_size: usize,

    // -------------------------------------------------------------------------
    // Read Configuration
    // -------------------------------------------------------------------------
    /// Validate the per-block CRC32 on every block read
    pub verify_checksums: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            index_dir: PathBuf::from("./tripledelta_index"),
            block_size: 4096,
            verify_checksums: true,
        }
    }
}

impl IndexConfig {
    /// Create a new config builder
    pub fn builder() -> IndexConfigBuilder {
        IndexConfigBuilder::default()
    }

    /// Reject configurations no index can be built with
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(StoreError::Config(
                "block_size must be at least 1".to_string(),
            ));
        }
        if self.index_dir.as_os_str().is_empty() {
            return Err(StoreError::Config("index_dir must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Builder for IndexConfig
#[derive(Default)]
pub struct IndexConfigBuilder {
    config: IndexConfig,
}

impl IndexConfigBuilder {
    /// Set the index directory
    pub fn index_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.index_dir = path.into();
        self
    }

    /// Set the number of rows per block
    pub fn block_size(mut self, rows: usize) -> Self {
        self.config.block_size = rows;
        self
    }

    /// Enable or disable block checksum validation
    pub fn verify_checksums(mut self, verify: bool) -> Self {
        self.config.verify_checksums = verify;
        self
    }

    pub fn build(self) -> IndexConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(IndexConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_block_size_is_rejected() {
        let config = IndexConfig::builder().block_size(0).build();
        assert!(matches!(config.validate(), Err(StoreError::Config(_))));
    }

    #[test]
    fn test_builder_sets_fields() {
        let config = IndexConfig::builder()
            .index_dir("/tmp/x")
            .block_size(16)
            .verify_checksums(false)
            .build();
        assert_eq!(config.index_dir, PathBuf::from("/tmp/x"));
        assert_eq!(config.block_size, 16);
        assert!(!config.verify_checksums);
    }
}
