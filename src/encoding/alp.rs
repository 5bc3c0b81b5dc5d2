//! ALP (Adaptive Lossless floating-Point), spec section 4.5.
//!
//! Layout: an 8-byte header (`version: u8`, `compression_mode: u8`,
//! `integer_encoding: u8`, `log2(vector_size): u8`, `num_elements: i32 LE`),
//! followed by `ceil(num_elements / vector_size)` vectors. Each vector is
//! `AlpInfo { exponent: u8, factor: u8, num_exceptions: u16 LE }`, then
//! `ForInfo { frame_of_reference: i32|i64 LE, bit_width: u8 }`, then a
//! bit-packed stream of `vector_size` (clamped to the remaining element
//! count) deltas, then `num_exceptions` `u16 LE` positions and that many
//! raw `f32`/`f64` exception values which overwrite the decoded output at
//! those positions.
//!
//! `value = (delta + frame_of_reference) * 10^(factor - exponent)`.

use super::bitpacked;
use crate::error::Result;

const SUPPORTED_VERSION: u8 = 1;
const SUPPORTED_COMPRESSION_MODE: u8 = 0;
const SUPPORTED_INTEGER_ENCODING: u8 = 0;

struct Header {
    vector_size: usize,
    num_elements: usize,
}

fn read_header(data: &[u8]) -> Result<(Header, usize)> {
    if data.len() < 8 {
        return Err(truncated_err!("ALP: header shorter than 8 bytes"));
    }
    let version = data[0];
    let compression_mode = data[1];
    let integer_encoding = data[2];
    let log2_vector_size = data[3];
    let num_elements = i32::from_le_bytes(data[4..8].try_into().unwrap());
    if version != SUPPORTED_VERSION {
        return Err(out_of_spec_err!("ALP: unknown version {}", version));
    }
    if compression_mode != SUPPORTED_COMPRESSION_MODE {
        return Err(out_of_spec_err!(
            "ALP: unknown compression mode {}",
            compression_mode
        ));
    }
    if integer_encoding != SUPPORTED_INTEGER_ENCODING {
        return Err(out_of_spec_err!(
            "ALP: unknown integer encoding {}",
            integer_encoding
        ));
    }
    if num_elements < 0 {
        return Err(out_of_spec_err!("ALP: negative num_elements"));
    }
    Ok((
        Header {
            vector_size: 1usize << log2_vector_size,
            num_elements: num_elements as usize,
        },
        8,
    ))
}

macro_rules! impl_alp_decode {
    ($name:ident, $ty:ty, $for_bytes:expr) => {
        /// Decodes an ALP stream into `$ty` values.
        pub fn $name(data: &[u8]) -> Result<Vec<$ty>> {
            let (header, mut pos) = read_header(data)?;
            let mut out = Vec::with_capacity(header.num_elements);
            let mut remaining = header.num_elements;
            while remaining > 0 {
                let this_vector = remaining.min(header.vector_size);
                if pos + 2 + 2 > data.len() {
                    return Err(truncated_err!("ALP: truncated vector info"));
                }
                let exponent = data[pos];
                let factor = data[pos + 1];
                let num_exceptions =
                    u16::from_le_bytes(data[pos + 2..pos + 4].try_into().unwrap()) as usize;
                pos += 4;

                if pos + $for_bytes + 1 > data.len() {
                    return Err(truncated_err!("ALP: truncated frame-of-reference info"));
                }
                let for_bytes: [u8; $for_bytes] = data[pos..pos + $for_bytes].try_into().unwrap();
                let frame_of_reference = i128::from_le_bytes({
                    let mut buf = [0u8; 16];
                    buf[..$for_bytes].copy_from_slice(&for_bytes);
                    // sign-extend
                    if for_bytes[$for_bytes - 1] & 0x80 != 0 {
                        for b in buf.iter_mut().skip($for_bytes) {
                            *b = 0xFF;
                        }
                    }
                    buf
                });
                pos += $for_bytes;
                let bit_width = data[pos];
                pos += 1;

                let packed_len = bitpacked::packed_byte_len(this_vector, bit_width);
                if pos + packed_len > data.len() {
                    return Err(truncated_err!("ALP: truncated delta stream"));
                }
                let deltas = &data[pos..pos + packed_len];
                pos += packed_len;

                let scale = 10f64.powi(factor as i32 - exponent as i32);
                for packed in bitpacked::Decoder::new(deltas, bit_width, this_vector) {
                    let value = (packed as i128 + frame_of_reference) as f64 * scale;
                    out.push(value as $ty);
                }

                if pos + num_exceptions * 2 > data.len() {
                    return Err(truncated_err!("ALP: truncated exception positions"));
                }
                let positions_start = pos;
                pos += num_exceptions * 2;
                let value_bytes = std::mem::size_of::<$ty>();
                if pos + num_exceptions * value_bytes > data.len() {
                    return Err(truncated_err!("ALP: truncated exception values"));
                }
                for i in 0..num_exceptions {
                    let position = u16::from_le_bytes(
                        data[positions_start + i * 2..positions_start + i * 2 + 2]
                            .try_into()
                            .unwrap(),
                    ) as usize;
                    let value_start = pos + i * value_bytes;
                    let mut buf = [0u8; 8];
                    buf[..value_bytes]
                        .copy_from_slice(&data[value_start..value_start + value_bytes]);
                    let base = out.len() - this_vector;
                    if position < this_vector {
                        out[base + position] = if value_bytes == 4 {
                            f32::from_le_bytes(buf[..4].try_into().unwrap()) as $ty
                        } else {
                            f64::from_le_bytes(buf) as $ty
                        };
                    }
                }
                pos += num_exceptions * value_bytes;

                remaining -= this_vector;
            }
            Ok(out)
        }
    };
}

impl_alp_decode!(decode_f32, f32, 4);
impl_alp_decode!(decode_f64, f64, 8);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_version() {
        let mut header = vec![2u8, 0, 0, 0];
        header.extend_from_slice(&0i32.to_le_bytes());
        assert!(decode_f32(&header).is_err());
    }

    #[test]
    fn decodes_single_vector_without_exceptions() {
        // vector_size = 1 << 1 = 2, num_elements = 2
        let mut data = vec![1u8, 0, 0, 1];
        data.extend_from_slice(&2i32.to_le_bytes());
        // vector: exponent=0, factor=0, num_exceptions=0
        data.push(0); // exponent
        data.push(0); // factor
        data.extend_from_slice(&0u16.to_le_bytes()); // num_exceptions
        // frame_of_reference (i32) = 10, bit_width = 2
        data.extend_from_slice(&10i32.to_le_bytes());
        data.push(2);
        // two 2-bit deltas: 1, 3 packed LSB first into one byte: 0b00001101? value0=1(01), value1=3(11)
        // bit0: value0 bits [0,1] = 01 ; value1 bits [2,3] = 11 => byte = 0b1101 = 0x0D
        data.push(0b0000_1101);
        let out = decode_f32(&data).unwrap();
        assert_eq!(out, vec![11.0, 13.0]);
    }
}
