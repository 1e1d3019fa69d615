//! Permutation Reader
//!
//! Opens a permutation file, keeps its block and relation metadata in
//! memory and reads one block per request.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::{Result, StoreError};
use crate::types::Permutation;

use super::{
    checksum, decode_block, BlockMetadata, BlockSource, PermutationMetadata, RelationMetadata,
    Row, FOOTER_SIZE, HEADER_SIZE, MAGIC, VERSION,
};

/// Reader for permutation files with in-memory metadata
///
/// The file handle sits behind a mutex so that `read_block` works through
/// `&self` and the reader can be shared between scans.
pub struct PermutationReader {
    path: PathBuf,
    permutation: Permutation,
    file: Mutex<File>,
    metadata: PermutationMetadata,
    num_rows: u64,
    verify_checksums: bool,
}

impl PermutationReader {
    /// Open a permutation file for reading
    ///
    /// Loads all block and relation metadata into memory.
    pub fn open(path: &Path, verify_checksums: bool) -> Result<Self> {
        let mut file = File::open(path)?;
        let file_size = file.metadata()?.len();

        if file_size < HEADER_SIZE + FOOTER_SIZE {
            return Err(StoreError::Storage(format!(
                "Permutation file too small: {} bytes",
                file_size
            )));
        }

        // Read and validate header
        let mut header = [0u8; HEADER_SIZE as usize];
        file.read_exact(&mut header)?;

        if &header[0..4] != MAGIC {
            return Err(StoreError::Storage(format!(
                "Invalid permutation file magic: expected TDLP, got {:?}",
                &header[0..4]
            )));
        }

        let version = u16::from_le_bytes([header[4], header[5]]);
        if version != VERSION {
            return Err(StoreError::Storage(format!(
                "Unsupported permutation file version: {}",
                version
            )));
        }

        let permutation = Permutation::ALL
            .get(header[6] as usize)
            .copied()
            .ok_or_else(|| {
                StoreError::Storage(format!("Invalid permutation tag: {}", header[6]))
            })?;
        let num_rows = u64::from_le_bytes(array8(&header[8..16]));

        // Read footer to locate the metadata section
        file.seek(SeekFrom::End(-(FOOTER_SIZE as i64)))?;
        let mut footer = [0u8; FOOTER_SIZE as usize];
        file.read_exact(&mut footer)?;

        let metadata_offset = u64::from_le_bytes(array8(&footer[0..8]));
        let metadata_crc = u32::from_le_bytes([footer[8], footer[9], footer[10], footer[11]]);

        if metadata_offset < HEADER_SIZE || metadata_offset > file_size - FOOTER_SIZE {
            return Err(StoreError::Storage(format!(
                "Metadata offset {} outside of file",
                metadata_offset
            )));
        }

        // Metadata section size = file_size - footer_size - metadata_offset
        let metadata_size = file_size - FOOTER_SIZE - metadata_offset;
        let mut metadata_bytes = vec![0u8; metadata_size as usize];
        file.seek(SeekFrom::Start(metadata_offset))?;
        file.read_exact(&mut metadata_bytes)?;

        if checksum(&metadata_bytes) != metadata_crc {
            return Err(StoreError::Storage(format!(
                "Metadata checksum mismatch in {}",
                path.display()
            )));
        }

        let metadata: PermutationMetadata = bincode::deserialize(&metadata_bytes)?;

        tracing::debug!(
            permutation = %permutation,
            rows = num_rows,
            blocks = metadata.blocks.len(),
            relations = metadata.relations.len(),
            "Opened permutation file"
        );

        Ok(Self {
            path: path.to_path_buf(),
            permutation,
            file: Mutex::new(file),
            metadata,
            num_rows,
            verify_checksums,
        })
    }

    /// The permutation stored in this file
    pub fn permutation(&self) -> Permutation {
        self.permutation
    }

    /// Path of the underlying file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BlockSource for PermutationReader {
    fn block_metadata(&self) -> &[BlockMetadata] {
        &self.metadata.blocks
    }

    fn relations(&self) -> &[RelationMetadata] {
        &self.metadata.relations
    }

    fn read_block(&self, block_index: usize) -> Result<Vec<Row>> {
        let block = self.metadata.blocks.get(block_index).ok_or_else(|| {
            StoreError::Storage(format!(
                "Block index {} out of range ({} blocks)",
                block_index,
                self.metadata.blocks.len()
            ))
        })?;

        let mut data = vec![0u8; block.compressed_size as usize];
        {
            let mut file = self.file.lock();
            file.seek(SeekFrom::Start(block.offset))?;
            file.read_exact(&mut data)?;
        }

        if self.verify_checksums && checksum(&data) != block.crc {
            return Err(StoreError::Storage(format!(
                "Checksum mismatch in block {} of {}",
                block_index, self.permutation
            )));
        }

        decode_block(&data, block.num_rows as usize)
    }

    fn num_rows(&self) -> u64 {
        self.num_rows
    }
}

fn array8(bytes: &[u8]) -> [u8; 8] {
    let mut out = [0u8; 8];
    out.copy_from_slice(bytes);
    out
}
