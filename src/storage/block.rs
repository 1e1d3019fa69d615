//! Block encoding
//!
//! A block stores its rows column by column, each value as a little-endian
//! u64. Decoding checks that the byte length matches the row count.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Result, StoreError};
use crate::types::Id;

use super::Row;

/// Bytes per encoded row (three u64 values)
const ROW_SIZE: usize = 24;

/// Encode sorted rows into one block
pub fn encode_block(rows: &[Row]) -> Bytes {
    let mut buf = BytesMut::with_capacity(rows.len() * ROW_SIZE);
    for column in 0..3 {
        for row in rows {
            buf.put_u64_le(row[column].bits());
        }
    }
    buf.freeze()
}

/// Decode a block of `num_rows` rows
pub fn decode_block(mut data: &[u8], num_rows: usize) -> Result<Vec<Row>> {
    if data.len() != num_rows * ROW_SIZE {
        return Err(StoreError::Storage(format!(
            "Block size mismatch: {} bytes for {} rows",
            data.len(),
            num_rows
        )));
    }

    let mut rows = vec![[Id::new(0); 3]; num_rows];
    for column in 0..3 {
        for row in rows.iter_mut() {
            row[column] = Id::new(data.get_u64_le());
        }
    }
    Ok(rows)
}

/// CRC32 of an encoded block
pub fn checksum(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(a: u64, b: u64, c: u64) -> Row {
        [Id::new(a), Id::new(b), Id::new(c)]
    }

    #[test]
    fn test_encode_is_column_major() {
        let data = encode_block(&[row(1, 2, 3), row(4, 5, 6)]);
        assert_eq!(data.len(), 2 * ROW_SIZE);
        assert_eq!(&data[0..8], &1u64.to_le_bytes());
        assert_eq!(&data[8..16], &4u64.to_le_bytes());
        assert_eq!(&data[16..24], &2u64.to_le_bytes());
    }

    #[test]
    fn test_decode_restores_rows() {
        let rows = vec![row(1, 1, 1), row(1, 2, 9), row(7, 0, u64::MAX)];
        let data = encode_block(&rows);
        assert_eq!(decode_block(&data, rows.len()).unwrap(), rows);
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        let data = encode_block(&[row(1, 2, 3)]);
        let result = decode_block(&data[..20], 1);
        assert!(matches!(result, Err(StoreError::Storage(_))));
    }

    #[test]
    fn test_checksum_detects_flip() {
        let data = encode_block(&[row(1, 2, 3)]);
        let mut flipped = data.to_vec();
        flipped[3] ^= 0x10;
        assert_ne!(checksum(&data), checksum(&flipped));
    }
}
