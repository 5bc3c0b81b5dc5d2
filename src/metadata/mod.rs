//! Footer location and parsing (spec section 4.3): verifying the trailing
//! magic, reading the metadata length, and translating the Thrift
//! `FileMetaData` struct into this crate's typed metadata tree.
//!
//! Fetching the bytes themselves (the suffix prefetch and, if the metadata
//! doesn't fit, the follow-up range fetch) is the `AsyncSource` caller's
//! job; this module only consumes whatever byte slice it is handed.

mod column_chunk_metadata;
mod column_descriptor;
mod file_metadata;
mod index;
mod row_metadata;
mod schema_descriptor;
mod statistics;

pub use column_chunk_metadata::ColumnChunkMetaData;
pub use column_descriptor::ColumnDescriptor;
pub use file_metadata::{FileMetaData, KeyValue};
pub use index::{BoundaryOrder, ColumnIndex, OffsetIndex, PageIndexEntry, PageLocation};
pub use row_metadata::RowGroupMetaData;
pub use schema_descriptor::SchemaDescriptor;
pub use statistics::Statistics;

use crate::error::Result;
use crate::thrift::reader::CompactProtocolReader;
use crate::{FOOTER_SIZE, PARQUET_MAGIC};

/// Validates the trailing magic and reads the little-endian `u32` metadata
/// length at `file_length - 8` (spec section 4.3, steps 2-3).
///
/// `footer_bytes` must be the tail of the file ending at `file_length`
/// (the suffix prefetch). Returns the metadata length; callers compare it
/// against `footer_bytes.len() - 8` to decide whether a second, wider fetch
/// is needed.
pub fn read_metadata_length(footer_bytes: &[u8], file_length: u64) -> Result<u32> {
    if (footer_bytes.len() as u64) < FOOTER_SIZE {
        return Err(crate::error::ParquetError::InvalidFile(
            "file is smaller than the 8-byte footer".to_owned(),
        ));
    }
    let tail = &footer_bytes[footer_bytes.len() - 4..];
    if tail != PARQUET_MAGIC {
        return Err(crate::error::ParquetError::InvalidFile(
            "trailing 4 bytes are not the PAR1 magic".to_owned(),
        ));
    }
    let length_bytes = &footer_bytes[footer_bytes.len() - 8..footer_bytes.len() - 4];
    let metadata_length = u32::from_le_bytes(length_bytes.try_into().unwrap());
    if (metadata_length as u64) > file_length.saturating_sub(FOOTER_SIZE) {
        return Err(crate::error::ParquetError::InvalidFile(format!(
            "metadata length {} exceeds the {}-byte file",
            metadata_length, file_length
        )));
    }
    Ok(metadata_length)
}

/// Decodes `metadata_bytes` (exactly `metadata_length` bytes, already
/// spliced if the suffix prefetch didn't cover them) as a Thrift compact
/// `FileMetaData` struct and translates it (spec section 4.3, steps 5-6).
pub fn parse_file_metadata(metadata_bytes: &[u8]) -> Result<FileMetaData> {
    let mut reader = CompactProtocolReader::new(metadata_bytes);
    let root = reader.read_struct()?;
    FileMetaData::try_from_thrift(&root)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn footer_with(metadata_length: u32) -> Vec<u8> {
        let mut v = vec![0u8; 20];
        v.extend_from_slice(&metadata_length.to_le_bytes());
        v.extend_from_slice(&PARQUET_MAGIC);
        v
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = footer_with(4);
        let last = bytes.len() - 1;
        bytes[last] = b'X';
        assert!(read_metadata_length(&bytes, bytes.len() as u64).is_err());
    }

    #[test]
    fn rejects_oversized_metadata_length() {
        let bytes = footer_with(10_000);
        assert!(read_metadata_length(&bytes, bytes.len() as u64).is_err());
    }

    #[test]
    fn reads_a_valid_metadata_length() {
        let bytes = footer_with(12);
        let length = read_metadata_length(&bytes, bytes.len() as u64).unwrap();
        assert_eq!(length, 12);
    }
}
