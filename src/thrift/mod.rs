//! A hand-rolled decoder for the subset of Thrift's compact binary protocol
//! that Parquet footers and page headers use (spec section 4.2).
//!
//! Parquet does not ship a `.thrift` IDL compiler step for this crate;
//! instead, each metadata record (`FileMetaData`, `ColumnChunk`,
//! `PageHeader`, ...) is translated by hand from a generic
//! [`ThriftStruct`] — a field-id-indexed map, matching the wire model the
//! spec describes rather than a statically generated type per struct.

mod reader;
mod value;

pub use reader::CompactProtocolReader;
pub use value::{ThriftStruct, ThriftValue};
