//! Page pipeline (spec section 4.6): parse a page header, decompress its
//! body, split the repetition/definition level streams off the front, and
//! decode the remaining value stream per the page's declared encoding.
//!
//! The row-group reader in [`crate::read`] drives this module page by page:
//! it parses each page header, decompresses the body, splits off the level
//! streams, and decodes the remaining value stream per the page's declared
//! encoding -- dereferencing dictionary indices once it has the chunk's
//! dictionary page in hand.

use crate::compression::{create_codec, CodecRegistry, Compression};
use crate::encoding::{self, bitpacked, hybrid_rle, Encoding};
use crate::error::Result;
use crate::schema::PhysicalType;
use crate::thrift::reader::CompactProtocolReader;
use crate::thrift::value::ThriftStruct;

/// `PageHeader.type` (spec section 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    Data,
    Index,
    Dictionary,
    DataV2,
}

impl PageType {
    fn from_thrift_id(id: i32) -> Result<Self> {
        Ok(match id {
            0 => PageType::Data,
            1 => PageType::Index,
            2 => PageType::Dictionary,
            3 => PageType::DataV2,
            other => return Err(crate::error::ParquetError::UnsupportedPageType(format!(
                "unknown page type id {}",
                other
            ))),
        })
    }
}

#[derive(Debug, Clone)]
pub struct DataPageHeaderV1 {
    pub num_values: i32,
    pub encoding: Encoding,
    pub definition_level_encoding: Encoding,
    pub repetition_level_encoding: Encoding,
}

#[derive(Debug, Clone)]
pub struct DataPageHeaderV2 {
    pub num_values: i32,
    pub num_nulls: i32,
    pub num_rows: i32,
    pub encoding: Encoding,
    pub definition_levels_byte_length: i32,
    pub repetition_levels_byte_length: i32,
    /// Defaults to `true` when absent on the wire (spec section 9, open
    /// question (iii)): honoured explicitly rather than assumed, since some
    /// writers omit it while actually leaving the value stream uncompressed.
    pub is_compressed: bool,
}

#[derive(Debug, Clone)]
pub struct DictionaryPageHeader {
    pub num_values: i32,
    pub encoding: Encoding,
    pub is_sorted: bool,
}

#[derive(Debug, Clone)]
pub enum PageHeader {
    Data(DataPageHeaderV1),
    DataV2(DataPageHeaderV2),
    Dictionary(DictionaryPageHeader),
    /// Present on the wire but never decoded by this crate (spec section
    /// 4.6's failure modes: "INDEX_PAGE is skipped with a warning").
    Index,
}

#[derive(Debug, Clone)]
pub struct ParsedPageHeader {
    pub header: PageHeader,
    pub uncompressed_page_size: i32,
    pub compressed_page_size: i32,
}

/// Parses one `PageHeader` Thrift struct (field ids: 1 `type`, 2
/// `uncompressed_page_size`, 3 `compressed_page_size`, 5
/// `data_page_header`, 7 `dictionary_page_header`, 8
/// `data_page_header_v2`) and returns it along with the number of bytes
/// consumed, so the caller can slice the page body immediately after.
pub fn parse_page_header(data: &[u8]) -> Result<(ParsedPageHeader, usize)> {
    let mut reader = CompactProtocolReader::new(data);
    let s = reader.read_struct()?;
    let page_type = PageType::from_thrift_id(s.i32(1)?)?;
    let header = match page_type {
        PageType::Data => {
            let h = s.struct_(5)?;
            PageHeader::Data(parse_data_page_header_v1(h)?)
        }
        PageType::Dictionary => {
            let h = s.struct_(7)?;
            PageHeader::Dictionary(DictionaryPageHeader {
                num_values: h.i32(1)?,
                encoding: Encoding::from_thrift_id(h.i32(2)?)?,
                is_sorted: h.opt_bool(3).unwrap_or(false),
            })
        }
        PageType::DataV2 => {
            let h = s.struct_(8)?;
            PageHeader::DataV2(DataPageHeaderV2 {
                num_values: h.i32(1)?,
                num_nulls: h.i32(2)?,
                num_rows: h.i32(3)?,
                encoding: Encoding::from_thrift_id(h.i32(4)?)?,
                definition_levels_byte_length: h.i32(5)?,
                repetition_levels_byte_length: h.i32(6)?,
                is_compressed: h.opt_bool(7).unwrap_or(true),
            })
        }
        PageType::Index => PageHeader::Index,
    };
    Ok((
        ParsedPageHeader {
            header,
            uncompressed_page_size: s.i32(2)?,
            compressed_page_size: s.i32(3)?,
        },
        reader.consumed(),
    ))
}

fn parse_data_page_header_v1(h: &ThriftStruct) -> Result<DataPageHeaderV1> {
    Ok(DataPageHeaderV1 {
        num_values: h.i32(1)?,
        encoding: Encoding::from_thrift_id(h.i32(2)?)?,
        definition_level_encoding: Encoding::from_thrift_id(h.i32(3)?)?,
        repetition_level_encoding: Encoding::from_thrift_id(h.i32(4)?)?,
    })
}

/// Decompresses `compressed` to exactly `uncompressed_size` bytes.
/// `UNCOMPRESSED` is a no-op copy. When `overrides` has a codec registered
/// under `codec.name()`, that function runs instead of the built-in table.
pub fn decompress(
    compressed: &[u8],
    uncompressed_size: usize,
    codec: Compression,
    overrides: &CodecRegistry,
) -> Result<Vec<u8>> {
    if let Some(f) = overrides.get(codec.name()) {
        return f(compressed, uncompressed_size);
    }
    match create_codec(codec)? {
        None => Ok(compressed.to_vec()),
        Some(mut c) => {
            let mut out = vec![0u8; uncompressed_size];
            c.decompress(compressed, &mut out)?;
            Ok(out)
        }
    }
}

/// A typed, flat array of physically decoded values -- the dictionary
/// page's contents, or one data page's non-null value stream after
/// dictionary dereference (spec section 3, `DecodedArray`).
#[derive(Debug, Clone)]
pub enum DecodedArray {
    Boolean(Vec<bool>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Int96(Vec<[u8; 12]>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    ByteArray(Vec<Vec<u8>>),
    FixedLenByteArray(Vec<Vec<u8>>),
}

impl DecodedArray {
    pub fn len(&self) -> usize {
        match self {
            DecodedArray::Boolean(v) => v.len(),
            DecodedArray::Int32(v) => v.len(),
            DecodedArray::Int64(v) => v.len(),
            DecodedArray::Int96(v) => v.len(),
            DecodedArray::Float(v) => v.len(),
            DecodedArray::Double(v) => v.len(),
            DecodedArray::ByteArray(v) => v.len(),
            DecodedArray::FixedLenByteArray(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Produces this array's logically converted values, in order (spec
    /// section 4.7).
    pub fn to_logical(
        &self,
        converted: Option<crate::schema::ConvertedType>,
        logical: Option<&crate::schema::LogicalType>,
        parsers: Option<&crate::logical::ParserOverrides>,
    ) -> Result<Vec<crate::logical::LogicalValue>> {
        use crate::logical::{convert, RawValue};
        match self {
            DecodedArray::Boolean(v) => v
                .iter()
                .map(|b| convert(RawValue::Boolean(*b), converted, logical, parsers))
                .collect(),
            DecodedArray::Int32(v) => v
                .iter()
                .map(|x| convert(RawValue::Int32(*x), converted, logical, parsers))
                .collect(),
            DecodedArray::Int64(v) => v
                .iter()
                .map(|x| convert(RawValue::Int64(*x), converted, logical, parsers))
                .collect(),
            DecodedArray::Int96(v) => v
                .iter()
                .map(|x| convert(RawValue::Int96(*x), converted, logical, parsers))
                .collect(),
            DecodedArray::Float(v) => v
                .iter()
                .map(|x| convert(RawValue::Float(*x), converted, logical, parsers))
                .collect(),
            DecodedArray::Double(v) => v
                .iter()
                .map(|x| convert(RawValue::Double(*x), converted, logical, parsers))
                .collect(),
            DecodedArray::ByteArray(v) => v
                .iter()
                .map(|b| convert(RawValue::ByteArray(b), converted, logical, parsers))
                .collect(),
            DecodedArray::FixedLenByteArray(v) => v
                .iter()
                .map(|b| convert(RawValue::FixedLenByteArray(b), converted, logical, parsers))
                .collect(),
        }
    }

    /// Clones the entry at `index`, for dictionary dereference.
    fn clone_at(&self, index: usize) -> Result<DecodedArray> {
        Ok(match self {
            DecodedArray::Boolean(v) => DecodedArray::Boolean(vec![*v
                .get(index)
                .ok_or_else(|| dict_index_oob(index, v.len()))?]),
            DecodedArray::Int32(v) => DecodedArray::Int32(vec![*v
                .get(index)
                .ok_or_else(|| dict_index_oob(index, v.len()))?]),
            DecodedArray::Int64(v) => DecodedArray::Int64(vec![*v
                .get(index)
                .ok_or_else(|| dict_index_oob(index, v.len()))?]),
            DecodedArray::Int96(v) => DecodedArray::Int96(vec![*v
                .get(index)
                .ok_or_else(|| dict_index_oob(index, v.len()))?]),
            DecodedArray::Float(v) => DecodedArray::Float(vec![*v
                .get(index)
                .ok_or_else(|| dict_index_oob(index, v.len()))?]),
            DecodedArray::Double(v) => DecodedArray::Double(vec![*v
                .get(index)
                .ok_or_else(|| dict_index_oob(index, v.len()))?]),
            DecodedArray::ByteArray(v) => DecodedArray::ByteArray(vec![v
                .get(index)
                .ok_or_else(|| dict_index_oob(index, v.len()))?
                .clone()]),
            DecodedArray::FixedLenByteArray(v) => DecodedArray::FixedLenByteArray(vec![v
                .get(index)
                .ok_or_else(|| dict_index_oob(index, v.len()))?
                .clone()]),
        })
    }

    fn extend_with(&mut self, other: DecodedArray) -> Result<()> {
        match (self, other) {
            (DecodedArray::Boolean(a), DecodedArray::Boolean(b)) => a.extend(b),
            (DecodedArray::Int32(a), DecodedArray::Int32(b)) => a.extend(b),
            (DecodedArray::Int64(a), DecodedArray::Int64(b)) => a.extend(b),
            (DecodedArray::Int96(a), DecodedArray::Int96(b)) => a.extend(b),
            (DecodedArray::Float(a), DecodedArray::Float(b)) => a.extend(b),
            (DecodedArray::Double(a), DecodedArray::Double(b)) => a.extend(b),
            (DecodedArray::ByteArray(a), DecodedArray::ByteArray(b)) => a.extend(b),
            (DecodedArray::FixedLenByteArray(a), DecodedArray::FixedLenByteArray(b)) => a.extend(b),
            _ => return Err(out_of_spec_err!("dictionary dereference type mismatch")),
        }
        Ok(())
    }

    fn empty_like(&self) -> DecodedArray {
        match self {
            DecodedArray::Boolean(_) => DecodedArray::Boolean(vec![]),
            DecodedArray::Int32(_) => DecodedArray::Int32(vec![]),
            DecodedArray::Int64(_) => DecodedArray::Int64(vec![]),
            DecodedArray::Int96(_) => DecodedArray::Int96(vec![]),
            DecodedArray::Float(_) => DecodedArray::Float(vec![]),
            DecodedArray::Double(_) => DecodedArray::Double(vec![]),
            DecodedArray::ByteArray(_) => DecodedArray::ByteArray(vec![]),
            DecodedArray::FixedLenByteArray(_) => DecodedArray::FixedLenByteArray(vec![]),
        }
    }
}

fn dict_index_oob(index: usize, len: usize) -> crate::error::ParquetError {
    out_of_spec_err!(
        "dictionary index {} out of range for a dictionary of {} entries",
        index,
        len
    )
}

/// Dereferences `indices` against `dictionary`, cloning each looked-up
/// value into the output (spec section 9, "Dictionary sharing": the
/// dictionary itself never outlives its column reader, but dereferenced
/// values do, since they are handed to the assembler).
pub fn dereference_dictionary(indices: &[u32], dictionary: &DecodedArray) -> Result<DecodedArray> {
    let mut out = dictionary.empty_like();
    for &i in indices {
        out.extend_with(dictionary.clone_at(i as usize)?)?;
    }
    Ok(out)
}

/// Decodes a dictionary page's body (always `PLAIN`-encoded regardless of
/// its declared `encoding`, per spec section 4.6 step 6) into a
/// [`DecodedArray`].
pub fn decode_dictionary_page(
    header: &DictionaryPageHeader,
    data: &[u8],
    physical: PhysicalType,
    type_length: Option<i32>,
) -> Result<DecodedArray> {
    decode_plain(data, physical, type_length, header.num_values as usize)
}

fn decode_plain(
    data: &[u8],
    physical: PhysicalType,
    type_length: Option<i32>,
    count: usize,
) -> Result<DecodedArray> {
    use crate::encoding::plain;
    Ok(match physical {
        PhysicalType::Boolean => DecodedArray::Boolean(plain::decode_boolean(data, count)?),
        PhysicalType::Int32 => DecodedArray::Int32(plain::decode_native(data, count)?),
        PhysicalType::Int64 => DecodedArray::Int64(plain::decode_native(data, count)?),
        PhysicalType::Int96 => DecodedArray::Int96(plain::decode_int96(data, count)?),
        PhysicalType::Float => DecodedArray::Float(plain::decode_native(data, count)?),
        PhysicalType::Double => DecodedArray::Double(plain::decode_native(data, count)?),
        PhysicalType::ByteArray => DecodedArray::ByteArray(
            plain::decode_byte_array(data, count)?
                .0
                .into_iter()
                .map(|s| s.to_vec())
                .collect(),
        ),
        PhysicalType::FixedLenByteArray => {
            let len = type_length
                .ok_or_else(|| out_of_spec_err!("FIXED_LEN_BYTE_ARRAY column missing type_length"))?
                as usize;
            DecodedArray::FixedLenByteArray(
                plain::decode_fixed_len_byte_array(data, len, count)?
                    .into_iter()
                    .map(|s| s.to_vec())
                    .collect(),
            )
        }
    })
}

/// The result of decoding one data page's value stream: either fully
/// materialised values, or raw dictionary indices still awaiting
/// dereference against the chunk's dictionary page.
pub enum PageValues {
    Values(DecodedArray),
    DictionaryIndices(Vec<u32>),
}

/// Decodes the value stream of one data page (spec section 4.6 step 6 and
/// section 4.5's per-encoding rules). `data` is exactly the value region:
/// level streams have already been stripped by [`split_v1`]/[`split_v2`].
pub fn decode_values(
    encoding: Encoding,
    physical: PhysicalType,
    type_length: Option<i32>,
    data: &[u8],
    count: usize,
) -> Result<PageValues> {
    use crate::encoding::{alp, byte_stream_split, delta_bitpacked, delta_byte_array, delta_length_byte_array};

    match encoding {
        Encoding::Plain => Ok(PageValues::Values(decode_plain(data, physical, type_length, count)?)),
        Encoding::PlainDictionary | Encoding::RleDictionary => {
            if data.is_empty() {
                return Ok(PageValues::DictionaryIndices(vec![]));
            }
            let bit_width = data[0];
            let rest = &data[1..];
            let indices = hybrid_rle::decode(rest, bit_width, count, Some(rest.len() as u32))?;
            Ok(PageValues::DictionaryIndices(indices))
        }
        Encoding::Rle => {
            if physical != PhysicalType::Boolean {
                return Err(crate::error::ParquetError::UnsupportedEncoding(
                    "RLE value encoding is only defined for BOOLEAN columns".to_owned(),
                ));
            }
            let bits = hybrid_rle::decode(data, 1, count, None)?;
            Ok(PageValues::Values(DecodedArray::Boolean(
                bits.into_iter().map(|b| b != 0).collect(),
            )))
        }
        Encoding::DeltaBinaryPacked => {
            let (values, _) = delta_bitpacked::decode(data, count)?;
            Ok(PageValues::Values(match physical {
                PhysicalType::Int32 => DecodedArray::Int32(values.into_iter().map(|v| v as i32).collect()),
                PhysicalType::Int64 => DecodedArray::Int64(values),
                other => {
                    return Err(out_of_spec_err!(
                        "DELTA_BINARY_PACKED applied to non-integer physical type {:?}",
                        other
                    ))
                }
            }))
        }
        Encoding::DeltaLengthByteArray => {
            let (values, _) = delta_length_byte_array::decode(data, count)?;
            Ok(PageValues::Values(DecodedArray::ByteArray(
                values.into_iter().map(|s| s.to_vec()).collect(),
            )))
        }
        Encoding::DeltaByteArray => {
            let values = delta_byte_array::decode(data, count)?;
            Ok(PageValues::Values(DecodedArray::ByteArray(values)))
        }
        Encoding::ByteStreamSplit => {
            let width = match physical {
                PhysicalType::Float | PhysicalType::Int32 => 4,
                PhysicalType::Double | PhysicalType::Int64 => 8,
                PhysicalType::FixedLenByteArray => type_length.ok_or_else(|| {
                    out_of_spec_err!("BYTE_STREAM_SPLIT on FIXED_LEN_BYTE_ARRAY missing type_length")
                })? as usize,
                other => {
                    return Err(out_of_spec_err!(
                        "BYTE_STREAM_SPLIT applied to unsupported physical type {:?}",
                        other
                    ))
                }
            };
            let bytes = byte_stream_split::decode(data, width, count)?;
            Ok(PageValues::Values(match physical {
                PhysicalType::Float => DecodedArray::Float(
                    bytes
                        .chunks_exact(4)
                        .map(|c| f32::from_le_bytes(c.try_into().unwrap()))
                        .collect(),
                ),
                PhysicalType::Double => DecodedArray::Double(
                    bytes
                        .chunks_exact(8)
                        .map(|c| f64::from_le_bytes(c.try_into().unwrap()))
                        .collect(),
                ),
                PhysicalType::Int32 => DecodedArray::Int32(
                    bytes
                        .chunks_exact(4)
                        .map(|c| i32::from_le_bytes(c.try_into().unwrap()))
                        .collect(),
                ),
                PhysicalType::Int64 => DecodedArray::Int64(
                    bytes
                        .chunks_exact(8)
                        .map(|c| i64::from_le_bytes(c.try_into().unwrap()))
                        .collect(),
                ),
                PhysicalType::FixedLenByteArray => {
                    DecodedArray::FixedLenByteArray(bytes.chunks_exact(width).map(|c| c.to_vec()).collect())
                }
                _ => unreachable!(),
            }))
        }
        Encoding::Alp => Ok(PageValues::Values(match physical {
            PhysicalType::Float => DecodedArray::Float(alp::decode_f32(data)?),
            PhysicalType::Double => DecodedArray::Double(alp::decode_f64(data)?),
            other => {
                return Err(out_of_spec_err!("ALP applied to unsupported physical type {:?}", other))
            }
        })),
        Encoding::BitPacked => Err(crate::error::ParquetError::UnsupportedEncoding(
            "legacy BIT_PACKED value encoding (pre-RLE-hybrid) is not produced by any writer this decoder targets".to_owned(),
        )),
    }
}

/// One page's level streams plus its still-encoded value region (spec
/// section 4.6 steps 3-4).
pub struct SplitPage<'a> {
    pub rep_levels: Vec<i16>,
    pub def_levels: Vec<i16>,
    pub values: &'a [u8],
    pub value_count: usize,
}

/// Splits a decompressed `DATA_PAGE` (V1) body into its level streams and
/// value region (spec section 4.6 step 3).
pub fn split_v1<'a>(
    header: &DataPageHeaderV1,
    body: &'a [u8],
    max_rep: i16,
    max_def: i16,
) -> Result<SplitPage<'a>> {
    let count = header.num_values as usize;
    let mut pos = 0usize;
    let rep_levels = if max_rep > 0 {
        let bw = bitpacked::bit_width(max_rep as u64);
        let (levels, consumed) = decode_levels_with_prefix(&body[pos..], bw, count)?;
        pos += consumed;
        levels
    } else {
        vec![]
    };
    let def_levels = if max_def > 0 {
        let bw = bitpacked::bit_width(max_def as u64);
        let (levels, consumed) = decode_levels_with_prefix(&body[pos..], bw, count)?;
        pos += consumed;
        levels
    } else {
        vec![]
    };
    Ok(SplitPage {
        rep_levels,
        def_levels,
        values: &body[pos..],
        value_count: count,
    })
}

/// Decodes one 4-byte-length-prefixed hybrid RLE level stream and returns
/// `(levels, total bytes consumed including the prefix)`.
fn decode_levels_with_prefix(data: &[u8], bit_width: u8, count: usize) -> Result<(Vec<i16>, usize)> {
    if data.len() < 4 {
        return Err(truncated_err!("level stream missing 4-byte length prefix"));
    }
    let byte_length = u32::from_le_bytes(data[0..4].try_into().unwrap());
    let levels = hybrid_rle::decode(&data[4..], bit_width, count, Some(byte_length))?;
    Ok((
        levels.into_iter().map(|v| v as i16).collect(),
        4 + byte_length as usize,
    ))
}

/// Splits a `DATA_PAGE_V2` body into its level streams (always
/// uncompressed, lengths from the header) and decompressed value region
/// (spec section 4.6 step 4). `raw_page` is the page's
/// `compressed_page_size` bytes, i.e. levels followed by a value region
/// that is compressed only when `header.is_compressed`.
pub fn split_v2<'a>(
    header: &DataPageHeaderV2,
    raw_page: &'a [u8],
    uncompressed_page_size: usize,
    compression: Compression,
    max_rep: i16,
    max_def: i16,
    scratch: &'a mut Vec<u8>,
    overrides: &CodecRegistry,
) -> Result<SplitPage<'a>> {
    let count = header.num_values as usize;
    let rep_len = header.repetition_levels_byte_length as usize;
    let def_len = header.definition_levels_byte_length as usize;
    if raw_page.len() < rep_len + def_len {
        return Err(truncated_err!(
            "DATA_PAGE_V2: level byte lengths {}+{} exceed the page body of {} bytes",
            rep_len,
            def_len,
            raw_page.len()
        ));
    }

    let rep_levels_raw = &raw_page[..rep_len];
    let def_levels_raw = &raw_page[rep_len..rep_len + def_len];
    let value_region = &raw_page[rep_len + def_len..];

    let value_uncompressed_len = uncompressed_page_size.saturating_sub(rep_len + def_len);
    let values: &'a [u8] = if header.is_compressed {
        *scratch = decompress(value_region, value_uncompressed_len, compression, overrides)?;
        scratch.as_slice()
    } else {
        value_region
    };

    Ok(SplitPage {
        rep_levels: decode_v2_levels(rep_levels_raw, max_rep, count)?,
        def_levels: decode_v2_levels(def_levels_raw, max_def, count)?,
        values,
        value_count: count,
    })
}

/// V2 level streams carry no 4-byte length prefix (the header already
/// names their exact byte length) and no leading bit-width byte: the bit
/// width is implied by the column's max repetition/definition level.
fn decode_v2_levels(data: &[u8], max_level: i16, count: usize) -> Result<Vec<i16>> {
    if max_level <= 0 {
        return Ok(vec![]);
    }
    let bit_width = bitpacked::bit_width(max_level as u64);
    let levels = hybrid_rle::decode(data, bit_width, count, Some(data.len() as u32))?;
    Ok(levels.into_iter().map(|v| v as i16).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_header_bytes(uncompressed: i32, compressed: i32, num_values: i32) -> Vec<u8> {
        // PageHeader{type=0 (DATA_PAGE), uncompressed_page_size, compressed_page_size, data_page_header}
        // Thrift compact struct: field headers use delta nibble + type.
        let mut out = vec![];
        // field 1 (i32, delta=1) = type (0, DATA_PAGE) -> zigzag(0) = 0
        out.push(0x15);
        out.push(0x00);
        // field 2 (i32, delta=1) = uncompressed_page_size
        out.push(0x15);
        push_zigzag(&mut out, uncompressed as i64);
        // field 3 (i32, delta=1) = compressed_page_size
        out.push(0x15);
        push_zigzag(&mut out, compressed as i64);
        // field 5 (i32->struct, delta=2) = data_page_header
        out.push(0x2C);
        // data_page_header: field1 num_values i32 delta=1, field2 encoding i32 delta=1 (PLAIN=0),
        // field3 def_level_encoding delta=1 (RLE=3), field4 rep_level_encoding delta=1 (RLE=3), STOP
        out.push(0x15);
        push_zigzag(&mut out, num_values as i64);
        out.push(0x15);
        push_zigzag(&mut out, 0); // PLAIN
        out.push(0x15);
        push_zigzag(&mut out, 3); // RLE
        out.push(0x15);
        push_zigzag(&mut out, 3); // RLE
        out.push(0x00); // STOP inner struct
        out.push(0x00); // STOP outer struct
        out
    }

    fn push_zigzag(buf: &mut Vec<u8>, v: i64) {
        let mut u = ((v << 1) ^ (v >> 63)) as u64;
        loop {
            let mut byte = (u & 0x7f) as u8;
            u >>= 7;
            if u != 0 {
                byte |= 0x80;
            }
            buf.push(byte);
            if u == 0 {
                break;
            }
        }
    }

    #[test]
    fn parses_a_v1_data_page_header() {
        let bytes = page_header_bytes(100, 80, 10);
        let (parsed, consumed) = parse_page_header(&bytes).unwrap();
        assert_eq!(consumed, bytes.len());
        assert_eq!(parsed.uncompressed_page_size, 100);
        assert_eq!(parsed.compressed_page_size, 80);
        match parsed.header {
            PageHeader::Data(d) => {
                assert_eq!(d.num_values, 10);
                assert_eq!(d.encoding, Encoding::Plain);
            }
            other => panic!("expected Data header, got {:?}", other_debug(&other)),
        }
    }

    fn other_debug(_: &PageHeader) -> &'static str {
        "non-data"
    }

    #[test]
    fn splits_v1_page_with_no_levels() {
        let header = DataPageHeaderV1 {
            num_values: 3,
            encoding: Encoding::Plain,
            definition_level_encoding: Encoding::Rle,
            repetition_level_encoding: Encoding::Rle,
        };
        let body = [1i32.to_le_bytes(), 2i32.to_le_bytes(), 3i32.to_le_bytes()].concat();
        let split = split_v1(&header, &body, 0, 0).unwrap();
        assert!(split.rep_levels.is_empty());
        assert!(split.def_levels.is_empty());
        assert_eq!(split.values, body.as_slice());
    }

    #[test]
    fn dereferences_dictionary_indices() {
        let dict = DecodedArray::ByteArray(vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
        let out = dereference_dictionary(&[2, 0, 1], &dict).unwrap();
        match out {
            DecodedArray::ByteArray(v) => assert_eq!(v, vec![b"c".to_vec(), b"a".to_vec(), b"b".to_vec()]),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn decodes_plain_dictionary_indices() {
        // bit_width byte = 2, then RLE-hybrid indices [0,1,2,1] bit-packed
        let mut data = vec![2u8];
        // bit-packed run of 4 values at 2 bits: indicator = (1 group of 8 << 1)|1 = 3
        data.push(0b0000_0011);
        // values 0,1,2,1,0,0,0,0 packed LSB-first at 2 bits each
        // byte0: v0(00) v1(01) v2(10) v3(01) -> bits: 00 01 10 01 => 0b01_10_01_00 = 0x64
        data.push(0b01_10_01_00);
        data.push(0u8);
        let values = decode_values(Encoding::PlainDictionary, PhysicalType::ByteArray, None, &data, 4).unwrap();
        match values {
            PageValues::DictionaryIndices(idx) => assert_eq!(idx, vec![0, 1, 2, 1]),
            _ => panic!("expected dictionary indices"),
        }
    }
}
