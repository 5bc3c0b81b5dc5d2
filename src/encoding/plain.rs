//! `PLAIN` encoding (spec section 4.5): values are stored back to back with
//! no framing beyond what each physical type needs.
//!
//! - `BOOLEAN`: one bit per value, LSB-first within each byte.
//! - `INT32`/`INT64`/`FLOAT`/`DOUBLE`: fixed-width little-endian.
//! - `INT96`: 12 raw bytes, left for [`crate::types::int96_to_i64`] to
//!   interpret.
//! - `BYTE_ARRAY`: a `u32` little-endian length followed by that many bytes,
//!   repeated.
//! - `FIXED_LEN_BYTE_ARRAY`: `type_length` raw bytes, repeated.

use crate::error::Result;
use crate::types::NativeType;

/// Decodes `count` fixed-width native values (`INT32`, `INT64`, `FLOAT`,
/// `DOUBLE`) from a `PLAIN` stream.
pub fn decode_native<T: NativeType>(data: &[u8], count: usize) -> Result<Vec<T>> {
    let width = std::mem::size_of::<T::Bytes>();
    let needed = width
        .checked_mul(count)
        .ok_or_else(|| out_of_spec_err!("PLAIN: count * width overflow"))?;
    if data.len() < needed {
        return Err(truncated_err!(
            "PLAIN: need {} bytes for {} values, only {} available",
            needed,
            count,
            data.len()
        ));
    }
    let mut out = Vec::with_capacity(count);
    for chunk in data[..needed].chunks_exact(width) {
        out.push(T::from_le_bytes(copy_into(chunk)));
    }
    Ok(out)
}

fn copy_into<B: Default + AsMut<[u8]>>(src: &[u8]) -> B {
    let mut b = B::default();
    b.as_mut().copy_from_slice(src);
    b
}

/// Decodes `count` booleans, one bit per value, LSB-first.
pub fn decode_boolean(data: &[u8], count: usize) -> Result<Vec<bool>> {
    let needed_bytes = (count + 7) / 8;
    if data.len() < needed_bytes {
        return Err(truncated_err!(
            "PLAIN: need {} bytes for {} booleans, only {} available",
            needed_bytes,
            count,
            data.len()
        ));
    }
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let byte = data[i / 8];
        out.push((byte >> (i % 8)) & 1 == 1);
    }
    Ok(out)
}

/// Decodes `count` length-prefixed `BYTE_ARRAY` values, returning slices
/// into `data` and the number of bytes consumed.
pub fn decode_byte_array(data: &[u8], count: usize) -> Result<(Vec<&[u8]>, usize)> {
    let mut pos = 0usize;
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        if pos + 4 > data.len() {
            return Err(truncated_err!("PLAIN: truncated BYTE_ARRAY length"));
        }
        let len = u32::from_le_bytes(data[pos..pos + 4].try_into().unwrap()) as usize;
        pos += 4;
        if pos + len > data.len() {
            return Err(truncated_err!("PLAIN: BYTE_ARRAY value overruns its stream"));
        }
        out.push(&data[pos..pos + len]);
        pos += len;
    }
    Ok((out, pos))
}

/// Decodes `count` fixed-length byte arrays of `type_length` bytes each.
pub fn decode_fixed_len_byte_array(
    data: &[u8],
    type_length: usize,
    count: usize,
) -> Result<Vec<&[u8]>> {
    let needed = type_length
        .checked_mul(count)
        .ok_or_else(|| out_of_spec_err!("PLAIN: type_length * count overflow"))?;
    if data.len() < needed {
        return Err(truncated_err!(
            "PLAIN: need {} bytes for {} FIXED_LEN_BYTE_ARRAY values, only {} available",
            needed,
            count,
            data.len()
        ));
    }
    Ok(data[..needed].chunks_exact(type_length).collect())
}

/// Decodes `count` raw `INT96` 12-byte blocks.
pub fn decode_int96(data: &[u8], count: usize) -> Result<Vec<[u8; 12]>> {
    let needed = count
        .checked_mul(12)
        .ok_or_else(|| out_of_spec_err!("PLAIN: count * 12 overflow"))?;
    if data.len() < needed {
        return Err(truncated_err!(
            "PLAIN: need {} bytes for {} INT96 values, only {} available",
            needed,
            count,
            data.len()
        ));
    }
    Ok(data[..needed]
        .chunks_exact(12)
        .map(|c| c.try_into().unwrap())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_i32_values() {
        let mut data = vec![];
        data.extend_from_slice(&1i32.to_le_bytes());
        data.extend_from_slice(&(-7i32).to_le_bytes());
        let out: Vec<i32> = decode_native(&data, 2).unwrap();
        assert_eq!(out, vec![1, -7]);
    }

    #[test]
    fn decodes_booleans_lsb_first() {
        let data = [0b0000_0101u8];
        let out = decode_boolean(&data, 4).unwrap();
        assert_eq!(out, vec![true, false, true, false]);
    }

    #[test]
    fn decodes_byte_arrays() {
        let mut data = vec![];
        data.extend_from_slice(&3u32.to_le_bytes());
        data.extend_from_slice(b"abc");
        data.extend_from_slice(&2u32.to_le_bytes());
        data.extend_from_slice(b"xy");
        let (values, consumed) = decode_byte_array(&data, 2).unwrap();
        assert_eq!(values, vec![b"abc".as_slice(), b"xy".as_slice()]);
        assert_eq!(consumed, data.len());
    }

    #[test]
    fn decodes_fixed_len_byte_arrays() {
        let data = [1u8, 2, 3, 4, 5, 6];
        let values = decode_fixed_len_byte_array(&data, 3, 2).unwrap();
        assert_eq!(values, vec![&[1, 2, 3][..], &[4, 5, 6][..]]);
    }

    #[test]
    fn truncated_byte_array_length_errors() {
        let data = [0u8, 0, 0];
        assert!(decode_byte_array(&data, 1).is_err());
    }
}
