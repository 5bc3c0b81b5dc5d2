//! The RLE / bit-packed hybrid stream (spec section 4.5): alternating runs
//! of `2n` (RLE, `n` copies of one fixed-width little-endian value) or
//! `2n+1` (bit-packed, `8n` LSB-first values).

use super::bitpacked;
use super::uleb128;
use crate::error::Result;

/// One run decoded from the hybrid stream.
#[derive(Debug, PartialEq, Eq)]
pub enum HybridEncoded<'a> {
    Bitpacked {
        compressed: &'a [u8],
        num_bits: usize,
        run_length: usize,
    },
    Rle {
        value: u32,
        run_length: usize,
    },
}

/// Decodes a full hybrid stream into `u32` values.
///
/// `byte_length` mirrors spec section 4.5: when the caller already knows
/// how many bytes the stream occupies (V2 pages, explicit-length callers)
/// pass `Some(len)`; otherwise the first four bytes are read as a
/// little-endian `u32` byte-length prefix (V1 definition/repetition level
/// streams).
pub fn decode(
    data: &[u8],
    bit_width: u8,
    count: usize,
    byte_length: Option<u32>,
) -> Result<Vec<u32>> {
    let (body, byte_length) = match byte_length {
        Some(len) => (data, len as usize),
        None => {
            if data.len() < 4 {
                return Err(truncated_err!(
                    "hybrid RLE stream missing 4-byte length prefix"
                ));
            }
            let len = u32::from_le_bytes(data[0..4].try_into().unwrap());
            (&data[4..], len as usize)
        }
    };
    if body.len() < byte_length {
        return Err(truncated_err!(
            "hybrid RLE stream: declared {} bytes, only {} available",
            byte_length,
            body.len()
        ));
    }
    let body = &body[..byte_length];

    let mut out = Vec::with_capacity(count);
    let mut pos = 0usize;
    while out.len() < count && pos < body.len() {
        let (indicator, consumed) = uleb128::decode(&body[pos..]);
        pos += consumed;
        if indicator & 1 == 1 {
            // bit-packed run: `n` groups of 8 values
            let groups = (indicator >> 1) as usize;
            let run_length = (groups * 8).min(count - out.len());
            let packed_bytes = bitpacked::packed_byte_len(groups * 8, bit_width);
            if pos + packed_bytes > body.len() {
                return Err(truncated_err!(
                    "hybrid RLE bit-packed run overruns its stream"
                ));
            }
            let chunk = &body[pos..pos + packed_bytes];
            pos += packed_bytes;
            out.extend(bitpacked::Decoder::new(chunk, bit_width, run_length));
        } else {
            // RLE run: `n` copies of a ceil(bit_width/8)-byte LE value
            let run_length = (indicator >> 1) as usize;
            let value_bytes = ((bit_width as usize) + 7) / 8;
            if pos + value_bytes > body.len() {
                return Err(truncated_err!("hybrid RLE run overruns its stream"));
            }
            let mut value = 0u32;
            for (i, b) in body[pos..pos + value_bytes].iter().enumerate() {
                value |= (*b as u32) << (8 * i);
            }
            pos += value_bytes;
            out.extend(std::iter::repeat(value).take(run_length));
        }
    }
    out.truncate(count);
    Ok(out)
}

/// A lazy iterator over hybrid-encoded runs, used when the caller wants to
/// drive decoding one run at a time (e.g. dictionary index streams that
/// may be much longer than the values actually needed).
pub struct Decoder<'a> {
    data: &'a [u8],
    num_bits: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8], num_bits: u32) -> Self {
        Self {
            data,
            num_bits: num_bits as usize,
        }
    }
}

impl<'a> Iterator for Decoder<'a> {
    type Item = HybridEncoded<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.data.is_empty() {
            return None;
        }
        let (indicator, consumed) = uleb128::decode(self.data);
        self.data = &self.data[consumed..];
        if indicator & 1 == 1 {
            let run_length = (indicator as usize >> 1) * 8;
            let bytes = bitpacked::packed_byte_len(run_length, self.num_bits as u8).min(self.data.len());
            let compressed = &self.data[..bytes];
            self.data = &self.data[bytes..];
            Some(HybridEncoded::Bitpacked {
                compressed,
                num_bits: self.num_bits,
                run_length,
            })
        } else {
            let run_length = indicator as usize >> 1;
            let value_bytes = (self.num_bits + 7) / 8;
            let mut value = 0u32;
            for (i, b) in self.data[..value_bytes.min(self.data.len())].iter().enumerate() {
                value |= (*b as u32) << (8 * i);
            }
            self.data = &self.data[value_bytes.min(self.data.len())..];
            Some(HybridEncoded::Rle { value, run_length })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_rle_run() {
        // length prefix(4) + [2, 5] => RLE header 2 (n=1 copy), value=5
        let data = [2u8, 0, 0, 0, 0b00000010, 5];
        let out = decode(&data, 8, 1, None).unwrap();
        assert_eq!(out, vec![5]);
    }

    #[test]
    fn decodes_bitpacked_run() {
        let bit_width = 3;
        let payload = [0b10001000u8, 0b11000110, 0b11111010];
        // indicator = (1 groups of 8 << 1) | 1 = 3
        let mut data = vec![3u8];
        data.extend_from_slice(&payload);
        let len = data.len() as u32;
        let mut framed = len.to_le_bytes().to_vec();
        framed.extend_from_slice(&data);
        let out = decode(&framed, bit_width, 8, None).unwrap();
        assert_eq!(out, vec![0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn explicit_byte_length_skips_prefix() {
        let payload = [0b00000010u8, 5];
        let out = decode(&payload, 8, 1, Some(payload.len() as u32)).unwrap();
        assert_eq!(out, vec![5]);
    }
}
