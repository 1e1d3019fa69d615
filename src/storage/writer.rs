//! Permutation Writer
//!
//! Writes the sorted rows of one permutation to a new permutation file.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, StoreError};
use crate::types::Permutation;

use super::{
    checksum, encode_block, BlockMetadata, PermutationMetadata, RelationTracker, Row, HEADER_SIZE,
    MAGIC, VERSION,
};

/// Summary of a finished permutation file
#[derive(Debug, Clone)]
pub struct PermutationFile {
    /// Path to the file
    pub path: PathBuf,
    pub permutation: Permutation,
    pub num_rows: u64,
    pub num_blocks: usize,
    /// File size in bytes
    pub file_size: u64,
}

/// Builder for a permutation file from rows in sorted order
pub struct PermutationWriter {
    /// Output file path
    path: PathBuf,
    permutation: Permutation,
    /// Buffered writer for performance
    writer: BufWriter<File>,
    block_size: usize,
    /// Rows of the block being filled
    pending: Vec<Row>,
    /// Last row added, to enforce strict ordering
    last_row: Option<Row>,
    num_rows: u64,
    /// Current write position (start of the next block)
    current_offset: u64,
    blocks: Vec<BlockMetadata>,
    relations: RelationTracker,
}

impl PermutationWriter {
    /// Create a new permutation file
    ///
    /// Writes the header immediately; call `add()` in strictly increasing
    /// row order, then `finish()` to write metadata and footer.
    pub fn new(path: &Path, permutation: Permutation, block_size: usize) -> Result<Self> {
        if block_size == 0 {
            return Err(StoreError::Config("block_size must be at least 1".to_string()));
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut writer = BufWriter::new(file);

        // Row count is a placeholder, patched in finish()
        writer.write_all(MAGIC)?;
        writer.write_all(&VERSION.to_le_bytes())?;
        writer.write_all(&[permutation.index() as u8, 0])?;
        writer.write_all(&0u64.to_le_bytes())?;

        Ok(Self {
            path: path.to_path_buf(),
            permutation,
            writer,
            block_size,
            pending: Vec::with_capacity(block_size),
            last_row: None,
            num_rows: 0,
            current_offset: HEADER_SIZE,
            blocks: Vec::new(),
            relations: RelationTracker::default(),
        })
    }

    /// Add a row (rows must be strictly increasing)
    pub fn add(&mut self, row: Row) -> Result<()> {
        if let Some(last) = self.last_row {
            if row <= last {
                return Err(StoreError::Storage(format!(
                    "Rows must be strictly increasing: {:?} after {:?}",
                    row, last
                )));
            }
        }
        self.last_row = Some(row);
        self.relations.observe(row[0], self.blocks.len());
        self.pending.push(row);
        self.num_rows += 1;

        if self.pending.len() == self.block_size {
            self.flush_block()?;
        }
        Ok(())
    }

    /// Encode and write the pending rows as one block
    fn flush_block(&mut self) -> Result<()> {
        let (first, last) = match (self.pending.first(), self.pending.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Ok(()),
        };

        let encoded = encode_block(&self.pending);
        self.writer.write_all(&encoded)?;

        self.blocks.push(BlockMetadata {
            first_triple: first,
            last_triple: last,
            num_rows: self.pending.len() as u64,
            offset: self.current_offset,
            compressed_size: encoded.len() as u64,
            crc: checksum(&encoded),
        });
        self.current_offset += encoded.len() as u64;
        self.pending.clear();
        Ok(())
    }

    /// Finish building: write metadata section, footer, and return a summary
    pub fn finish(mut self) -> Result<PermutationFile> {
        self.flush_block()?;

        let metadata = PermutationMetadata {
            blocks: std::mem::take(&mut self.blocks),
            relations: std::mem::take(&mut self.relations).finish(),
        };
        let num_blocks = metadata.blocks.len();
        let metadata_bytes = bincode::serialize(&metadata)?;
        let metadata_offset = self.current_offset;

        self.writer.write_all(&metadata_bytes)?;

        // Footer: metadata offset (8) + metadata crc (4) + padding (4)
        self.writer.write_all(&metadata_offset.to_le_bytes())?;
        self.writer.write_all(&checksum(&metadata_bytes).to_le_bytes())?;
        self.writer.write_all(&[0u8; 4])?;

        self.writer.flush()?;

        // Seek back and update row count in header
        let mut file = self.writer.into_inner().map_err(|e| {
            StoreError::Storage(format!("Failed to flush permutation file: {}", e))
        })?;
        file.seek(SeekFrom::Start(8))?; // After magic + version + permutation + padding
        file.write_all(&self.num_rows.to_le_bytes())?;
        file.sync_all()?;

        let file_size = file.metadata()?.len();

        tracing::debug!(
            permutation = %self.permutation,
            rows = self.num_rows,
            blocks = num_blocks,
            bytes = file_size,
            "Wrote permutation file"
        );

        Ok(PermutationFile {
            path: self.path,
            permutation: self.permutation,
            num_rows: self.num_rows,
            num_blocks,
            file_size,
        })
    }
}
