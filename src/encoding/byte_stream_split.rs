//! `BYTE_STREAM_SPLIT` (spec section 4.5): values are stored byte-plane by
//! byte-plane instead of value by value. With width `w` (4 for `f32`/`i32`,
//! 8 for `f64`/`i64`, or `type_length` for `FIXED_LEN_BYTE_ARRAY`), the
//! stream holds `w` planes of `count` bytes each; output byte `j` of value
//! `i` is `planes[j][i]`.

use crate::error::Result;

/// Reconstructs `count` values of `width` bytes each from their
/// byte-stream-split planes, writing each value little-endian-contiguous
/// into the returned buffer (ready for `NativeType::from_le_bytes`-style
/// reinterpretation).
pub fn decode(data: &[u8], width: usize, count: usize) -> Result<Vec<u8>> {
    let needed = width
        .checked_mul(count)
        .ok_or_else(|| out_of_spec_err!("BYTE_STREAM_SPLIT: width * count overflow"))?;
    if data.len() < needed {
        return Err(truncated_err!(
            "BYTE_STREAM_SPLIT: need {} bytes, only {} available",
            needed,
            data.len()
        ));
    }
    let mut out = vec![0u8; needed];
    for plane in 0..width {
        let plane_start = plane * count;
        for i in 0..count {
            out[i * width + plane] = data[plane_start + i];
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconstructs_f32_planes() {
        let values = [1.0f32, -2.5f32];
        let bytes: Vec<[u8; 4]> = values.iter().map(|v| v.to_le_bytes()).collect();
        let mut planes = vec![0u8; 4 * values.len()];
        for (i, b) in bytes.iter().enumerate() {
            for (plane, byte) in b.iter().enumerate() {
                planes[plane * values.len() + i] = *byte;
            }
        }
        let out = decode(&planes, 4, values.len()).unwrap();
        let got = [
            f32::from_le_bytes(out[0..4].try_into().unwrap()),
            f32::from_le_bytes(out[4..8].try_into().unwrap()),
        ];
        assert_eq!(got, values);
    }
}
