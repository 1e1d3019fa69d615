//! Tests for permutation files
//!
//! These tests verify:
//! - Writing and reading back blocks and metadata
//! - Relation metadata across block boundaries
//! - Rejection of unsorted input
//! - Detection of corrupted files and blocks

use std::fs::{self, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::PathBuf;

use tempfile::TempDir;
use tripledelta::storage::{BlockSource, PermutationReader, PermutationWriter, Row};
use tripledelta::{Id, Permutation, StoreError};

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_file() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("index.spo");
    (temp_dir, path)
}

fn row(a: u64, b: u64, c: u64) -> Row {
    [Id::new(a), Id::new(b), Id::new(c)]
}

/// Rows of five relations (0, 10, .., 40) with `per_relation` rows each
fn sample_rows(per_relation: u64) -> Vec<Row> {
    (0..5)
        .flat_map(|s| (0..per_relation).map(move |i| row(s * 10, i, i * 2)))
        .collect()
}

fn write_rows(path: &PathBuf, rows: &[Row], block_size: usize) {
    let mut writer = PermutationWriter::new(path, Permutation::Spo, block_size).unwrap();
    for r in rows {
        writer.add(*r).unwrap();
    }
    writer.finish().unwrap();
}

// =============================================================================
// Writer Tests
// =============================================================================

#[test]
fn test_writer_summary() {
    let (_temp, path) = setup_temp_file();
    let rows = sample_rows(7);

    let mut writer = PermutationWriter::new(&path, Permutation::Spo, 4).unwrap();
    for r in &rows {
        writer.add(*r).unwrap();
    }
    let file = writer.finish().unwrap();

    assert!(path.exists());
    assert_eq!(file.num_rows, 35);
    assert_eq!(file.num_blocks, 9);
    assert_eq!(file.permutation, Permutation::Spo);
    assert_eq!(file.file_size, fs::metadata(&path).unwrap().len());
}

#[test]
fn test_writer_rejects_unsorted_rows() {
    let (_temp, path) = setup_temp_file();
    let mut writer = PermutationWriter::new(&path, Permutation::Pso, 4).unwrap();

    writer.add(row(1, 2, 3)).unwrap();
    assert!(matches!(writer.add(row(1, 2, 3)), Err(StoreError::Storage(_))));
    assert!(matches!(writer.add(row(1, 1, 9)), Err(StoreError::Storage(_))));
}

#[test]
fn test_writer_rejects_zero_block_size() {
    let (_temp, path) = setup_temp_file();
    let result = PermutationWriter::new(&path, Permutation::Spo, 0);
    assert!(matches!(result, Err(StoreError::Config(_))));
}

// =============================================================================
// Reader Tests
// =============================================================================

#[test]
fn test_roundtrip_blocks_and_metadata() {
    let (_temp, path) = setup_temp_file();
    let rows = sample_rows(7);
    write_rows(&path, &rows, 4);

    let reader = PermutationReader::open(&path, true).unwrap();
    assert_eq!(reader.permutation(), Permutation::Spo);
    assert_eq!(reader.num_rows(), 35);
    assert_eq!(reader.block_metadata().len(), 9);
    assert_eq!(reader.scan().unwrap(), rows);

    for (i, block) in reader.block_metadata().iter().enumerate() {
        let decoded = reader.read_block(i).unwrap();
        assert_eq!(decoded.len() as u64, block.num_rows);
        assert_eq!(decoded.first(), Some(&block.first_triple));
        assert_eq!(decoded.last(), Some(&block.last_triple));
    }
}

#[test]
fn test_relation_metadata_spans_blocks() {
    let (_temp, path) = setup_temp_file();
    write_rows(&path, &sample_rows(7), 4);
    let reader = PermutationReader::open(&path, true).unwrap();

    let relations = reader.relations();
    assert_eq!(relations.len(), 5);

    // Relation 10 holds rows 7..14, which lie in blocks 1 to 3.
    let second = &relations[1];
    assert_eq!(second.col0_id, Id::new(10));
    assert_eq!(second.num_rows, 7);
    assert_eq!((second.first_block, second.last_block), (1, 3));

    assert_eq!(reader.relation_lower_bound(Id::new(11)).unwrap().col0_id, Id::new(20));
    assert_eq!(reader.relation_lower_bound(Id::new(0)).unwrap().col0_id, Id::new(0));
    assert!(reader.relation_lower_bound(Id::new(41)).is_none());
}

#[test]
fn test_empty_permutation_file() {
    let (_temp, path) = setup_temp_file();
    write_rows(&path, &[], 4);

    let reader = PermutationReader::open(&path, true).unwrap();
    assert_eq!(reader.num_rows(), 0);
    assert!(reader.block_metadata().is_empty());
    assert!(reader.relations().is_empty());
    assert!(reader.read_block(0).is_err());
}

#[test]
fn test_invalid_magic() {
    let (_temp, path) = setup_temp_file();
    fs::write(&path, vec![0u8; 64]).unwrap();

    let result = PermutationReader::open(&path, true);
    assert!(matches!(result, Err(StoreError::Storage(_))));
}

#[test]
fn test_file_too_small() {
    let (_temp, path) = setup_temp_file();
    fs::write(&path, b"TDLP").unwrap();

    assert!(PermutationReader::open(&path, true).is_err());
}

#[test]
fn test_corrupted_block_detected() {
    let (_temp, path) = setup_temp_file();
    write_rows(&path, &sample_rows(7), 4);

    let offset = {
        let reader = PermutationReader::open(&path, true).unwrap();
        reader.block_metadata()[2].offset
    };
    let mut file = OpenOptions::new().write(true).open(&path).unwrap();
    file.seek(SeekFrom::Start(offset)).unwrap();
    file.write_all(&[0xFF; 8]).unwrap();
    drop(file);

    let verified = PermutationReader::open(&path, true).unwrap();
    assert!(verified.read_block(1).is_ok());
    assert!(matches!(verified.read_block(2), Err(StoreError::Storage(_))));

    let unverified = PermutationReader::open(&path, false).unwrap();
    assert!(unverified.read_block(2).is_ok());
}

#[test]
fn test_corrupted_metadata_detected() {
    let (_temp, path) = setup_temp_file();
    write_rows(&path, &sample_rows(3), 4);

    // The byte just before the 16 byte footer is the last metadata byte.
    let len = fs::metadata(&path).unwrap().len();
    let mut file = OpenOptions::new().write(true).open(&path).unwrap();
    file.seek(SeekFrom::Start(len - 17)).unwrap();
    file.write_all(&[0xAB]).unwrap();
    drop(file);

    assert!(matches!(
        PermutationReader::open(&path, true),
        Err(StoreError::Storage(_))
    ));
}
