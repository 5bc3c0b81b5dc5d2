//! Variant decoding (spec section 4.10): a self-describing, schemaless
//! nested value encoded as a `(metadata, value)` pair of byte strings.
//!
//! `metadata` is a small string dictionary: a header byte (version in the
//! low nibble, a sorted/unique-keys flag, and an offset width), a
//! dictionary size, that many+1 offsets, then the concatenated UTF-8 bytes
//! the offsets slice into dictionary entries.
//!
//! `value` is a tagged tree: each node starts with a header byte whose low
//! 2 bits select a basic type (`primitive`, `short_string`, `object`,
//! `array`) and whose remaining bits select a sub-type or carry an inline
//! length.

use crate::error::Result;
use serde_json::{Map, Value};

pub struct VariantMetadata {
    dictionary: Vec<String>,
}

impl VariantMetadata {
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(truncated_err!("Variant metadata is empty"));
        }
        let header = data[0];
        let offset_size = ((header >> 6) & 0x3) as usize + 1;
        let mut pos = 1usize;
        let dictionary_size = read_sized_uint(data, &mut pos, offset_size)?;
        let mut offsets = Vec::with_capacity(dictionary_size + 1);
        for _ in 0..=dictionary_size {
            offsets.push(read_sized_uint(data, &mut pos, offset_size)?);
        }
        let bytes_start = pos;
        let mut dictionary = Vec::with_capacity(dictionary_size);
        for w in offsets.windows(2) {
            let start = bytes_start + w[0];
            let end = bytes_start + w[1];
            let slice = data
                .get(start..end)
                .ok_or_else(|| truncated_err!("Variant metadata dictionary entry out of range"))?;
            dictionary.push(String::from_utf8(slice.to_vec())?);
        }
        Ok(VariantMetadata { dictionary })
    }

    fn key(&self, id: usize) -> Result<&str> {
        self.dictionary
            .get(id)
            .map(|s| s.as_str())
            .ok_or_else(|| out_of_spec_err!("Variant dictionary id {} out of range", id))
    }
}

fn read_sized_uint(data: &[u8], pos: &mut usize, width: usize) -> Result<usize> {
    let slice = data
        .get(*pos..*pos + width)
        .ok_or_else(|| truncated_err!("Variant: truncated sized integer"))?;
    let mut value = 0usize;
    for (i, b) in slice.iter().enumerate() {
        value |= (*b as usize) << (8 * i);
    }
    *pos += width;
    Ok(value)
}

/// Decodes a Variant `(metadata, value)` pair into a `serde_json::Value`
/// (dates/times/timestamps are rendered as their string form, matching how
/// the logical-type converter renders DATE/TIME/TIMESTAMP elsewhere).
pub fn decode(metadata: &[u8], value: &[u8]) -> Result<Value> {
    let metadata = VariantMetadata::parse(metadata)?;
    decode_value(&metadata, value, &mut 0)
}

fn decode_value(metadata: &VariantMetadata, data: &[u8], pos: &mut usize) -> Result<Value> {
    let header = *data
        .get(*pos)
        .ok_or_else(|| truncated_err!("Variant: truncated value header"))?;
    *pos += 1;
    let basic_type = header & 0x3;
    let type_info = header >> 2;
    match basic_type {
        0 => decode_primitive(type_info, data, pos),
        1 => {
            let len = type_info as usize;
            let bytes = take(data, pos, len)?;
            Ok(Value::String(String::from_utf8(bytes.to_vec())?))
        }
        2 => decode_object(metadata, type_info, data, pos),
        3 => decode_array(metadata, type_info, data, pos),
        _ => unreachable!("basic_type is 2 bits"),
    }
}

fn take<'a>(data: &'a [u8], pos: &mut usize, len: usize) -> Result<&'a [u8]> {
    let slice = data
        .get(*pos..*pos + len)
        .ok_or_else(|| truncated_err!("Variant: value overruns its buffer"))?;
    *pos += len;
    Ok(slice)
}

fn decode_primitive(type_info: u8, data: &[u8], pos: &mut usize) -> Result<Value> {
    Ok(match type_info {
        0 => Value::Null,
        1 => Value::Bool(true),
        2 => Value::Bool(false),
        3 => Value::from(take(data, pos, 1)?[0] as i8),
        4 => Value::from(i16::from_le_bytes(take(data, pos, 2)?.try_into().unwrap())),
        5 => Value::from(i32::from_le_bytes(take(data, pos, 4)?.try_into().unwrap())),
        6 => Value::from(i64::from_le_bytes(take(data, pos, 8)?.try_into().unwrap())),
        7 => {
            let bits = f64::from_le_bytes(take(data, pos, 8)?.try_into().unwrap());
            serde_json::Number::from_f64(bits)
                .map(Value::Number)
                .unwrap_or(Value::Null)
        }
        11 => {
            let days = i32::from_le_bytes(take(data, pos, 4)?.try_into().unwrap());
            Value::String(format!("date:{}", days))
        }
        12 | 13 => {
            let micros = i64::from_le_bytes(take(data, pos, 8)?.try_into().unwrap());
            Value::String(format!("timestamp_micros:{}", micros))
        }
        14 => Value::from(f32::from_le_bytes(take(data, pos, 4)?.try_into().unwrap())),
        15 => {
            let len = read_sized_uint(data, pos, 4)?;
            let bytes = take(data, pos, len)?;
            Value::Array(bytes.iter().map(|b| Value::from(*b)).collect())
        }
        16 => {
            let len = read_sized_uint(data, pos, 4)?;
            let bytes = take(data, pos, len)?;
            Value::String(String::from_utf8(bytes.to_vec())?)
        }
        other => {
            return Err(out_of_spec_err!(
                "Variant: unknown primitive type_info {}",
                other
            ))
        }
    })
}

fn decode_object(
    metadata: &VariantMetadata,
    type_info: u8,
    data: &[u8],
    pos: &mut usize,
) -> Result<Value> {
    let field_id_size = ((type_info & 0x3) + 1) as usize;
    let offset_size = (((type_info >> 2) & 0x3) + 1) as usize;
    let large = type_info & 0x10 != 0;
    let num_elements = if large {
        read_sized_uint(data, pos, 4)?
    } else {
        read_sized_uint(data, pos, 1)?
    };
    let field_ids: Vec<usize> = (0..num_elements)
        .map(|_| read_sized_uint(data, pos, field_id_size))
        .collect::<Result<_>>()?;
    let offsets: Vec<usize> = (0..=num_elements)
        .map(|_| read_sized_uint(data, pos, offset_size))
        .collect::<Result<_>>()?;
    let values_start = *pos;
    let mut map = Map::new();
    for i in 0..num_elements {
        let key = metadata.key(field_ids[i])?.to_owned();
        let mut value_pos = values_start + offsets[i];
        let value = decode_value(metadata, data, &mut value_pos)?;
        map.insert(key, value);
    }
    *pos = values_start + offsets[num_elements];
    Ok(Value::Object(map))
}

fn decode_array(
    metadata: &VariantMetadata,
    type_info: u8,
    data: &[u8],
    pos: &mut usize,
) -> Result<Value> {
    let offset_size = ((type_info & 0x3) + 1) as usize;
    let large = type_info & 0x4 != 0;
    let num_elements = if large {
        read_sized_uint(data, pos, 4)?
    } else {
        read_sized_uint(data, pos, 1)?
    };
    let offsets: Vec<usize> = (0..=num_elements)
        .map(|_| read_sized_uint(data, pos, offset_size))
        .collect::<Result<_>>()?;
    let values_start = *pos;
    let mut out = Vec::with_capacity(num_elements);
    for i in 0..num_elements {
        let mut value_pos = values_start + offsets[i];
        out.push(decode_value(metadata, data, &mut value_pos)?);
    }
    *pos = values_start + offsets[num_elements];
    Ok(Value::Array(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple_metadata() -> Vec<u8> {
        // version 1, offset_size = 1, dictionary = ["a"]
        let mut m = vec![0b0000_0001];
        m.push(1); // dictionary_size
        m.push(0); // offset[0]
        m.push(1); // offset[1]
        m.push(b'a');
        m
    }

    #[test]
    fn decodes_null() {
        let value = [0b0000_0000u8]; // primitive, type_info=0 (null)
        let decoded = decode(&simple_metadata(), &value).unwrap();
        assert_eq!(decoded, Value::Null);
    }

    #[test]
    fn decodes_short_string() {
        // basic_type=1 (short_string), type_info=len=5
        let mut value = vec![(5u8 << 2) | 1];
        value.extend_from_slice(b"hello");
        let decoded = decode(&simple_metadata(), &value).unwrap();
        assert_eq!(decoded, Value::String("hello".to_owned()));
    }

    #[test]
    fn decodes_int32_primitive() {
        let mut value = vec![(5u8 << 2) | 0]; // primitive, type_info=5 (int32)
        value.extend_from_slice(&42i32.to_le_bytes());
        let decoded = decode(&simple_metadata(), &value).unwrap();
        assert_eq!(decoded, Value::from(42));
    }
}
