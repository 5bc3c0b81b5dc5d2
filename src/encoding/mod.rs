//! Value encodings used inside data pages (spec section 4.5).

pub mod alp;
pub mod bitpacked;
pub mod byte_stream_split;
pub mod delta_bitpacked;
pub mod delta_byte_array;
pub mod delta_length_byte_array;
pub mod hybrid_rle;
pub mod plain;
pub mod uleb128;
pub mod zigzag_leb128;

/// The encodings a data or dictionary page may declare, as they appear on
/// the wire (`Encoding` in the Thrift schema).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Plain,
    PlainDictionary,
    Rle,
    BitPacked,
    DeltaBinaryPacked,
    DeltaLengthByteArray,
    DeltaByteArray,
    RleDictionary,
    ByteStreamSplit,
    /// Not part of the canonical Parquet Thrift `Encoding` enum as of this
    /// writing; assigned the next free id (10) so ALP-encoded columns
    /// round-trip through the same `Encoding::from_thrift_id`/dispatch path
    /// as every other encoding, per spec section 4.5's `ALP` entry.
    Alp,
}

impl Encoding {
    pub fn from_thrift_id(id: i32) -> crate::error::Result<Self> {
        Ok(match id {
            0 => Encoding::Plain,
            2 => Encoding::PlainDictionary,
            3 => Encoding::Rle,
            4 => Encoding::BitPacked,
            5 => Encoding::DeltaBinaryPacked,
            6 => Encoding::DeltaLengthByteArray,
            7 => Encoding::DeltaByteArray,
            8 => Encoding::RleDictionary,
            9 => Encoding::ByteStreamSplit,
            10 => Encoding::Alp,
            other => return Err(out_of_spec_err!("unknown encoding id {}", other)),
        })
    }

    pub fn is_dictionary(&self) -> bool {
        matches!(self, Encoding::PlainDictionary | Encoding::RleDictionary)
    }
}

/// `u32` little-endian length prefix shared by several byte-array framings.
///
/// # Panics
/// Panics if `values.len() < 4`.
pub fn get_length(values: &[u8]) -> u32 {
    u32::from_le_bytes(values[0..4].try_into().unwrap())
}
