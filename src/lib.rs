#![forbid(unsafe_code)]
//! A read-only decoder for the Apache Parquet columnar file format.
//!
//! This crate parses the Thrift-encoded footer, plans the minimal set of
//! byte ranges a query needs, decodes pages across the encodings Parquet
//! uses, and reassembles nested records from the flat (value, definition
//! level, repetition level) triples the Dremel model stores them as.
//! Writing Parquet is out of scope.

#[macro_use]
pub mod error;
pub mod api;
pub mod assemble;
pub mod bloom;
pub mod compression;
pub mod encoding;
pub mod filter;
pub mod geometry;
pub mod logical;
pub mod metadata;
pub mod page;
pub mod read;
pub mod row;
pub mod schema;
pub mod source;
pub mod thrift;
pub mod types;
pub mod variant;

pub use api::{cached_source, read_metadata, read_objects, read_rows, schema_tree};
pub use error::{ParquetError, Result};

/// Every Parquet file begins and ends with these four bytes.
pub(crate) const PARQUET_MAGIC: [u8; 4] = [b'P', b'A', b'R', b'1'];
/// Trailing magic (4 bytes) plus the little-endian `u32` metadata length.
pub(crate) const FOOTER_SIZE: u64 = 8;
/// Suffix prefetch size for the footer (spec section 4.3, step 1).
pub(crate) const DEFAULT_FOOTER_READ_SIZE: u64 = 512 * 1024;
/// Column chunks whose compressed size exceeds this are skipped with a
/// warning rather than read (spec section 4.9, step 4; section 7).
pub(crate) const MAX_COLUMN_CHUNK_BYTES: u64 = 1024 * 1024 * 1024;
/// Row groups whose combined chunk ranges fit under this threshold are
/// fetched with a single `slice` call instead of one per column chunk
/// (spec section 4.9, read path step 1).
pub(crate) const COALESCE_THRESHOLD_BYTES: u64 = 32 * 1024 * 1024;
