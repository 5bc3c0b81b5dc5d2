//! `DELTA_LENGTH_BYTE_ARRAY` (spec section 4.5): a `DELTA_BINARY_PACKED`
//! stream of lengths, followed by the concatenated bytes those lengths
//! slice into individual values.

use super::delta_bitpacked;
use crate::error::Result;

pub fn decode<'a>(data: &'a [u8], count: usize) -> Result<(Vec<&'a [u8]>, usize)> {
    let (lengths, consumed) = delta_bitpacked::decode(data, count)?;
    let mut pos = consumed;
    let mut out = Vec::with_capacity(lengths.len());
    for len in lengths {
        let len = len as usize;
        if pos + len > data.len() {
            return Err(truncated_err!(
                "DELTA_LENGTH_BYTE_ARRAY: value overruns its stream"
            ));
        }
        out.push(&data[pos..pos + len]);
        pos += len;
    }
    Ok((out, pos))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_values_after_lengths() {
        // DELTA_BINARY_PACKED header for lengths [3, 2]:
        // block_size=128, miniblocks=4, total_count=2, first_value=zigzag(3)=6
        // block: min_delta=zigzag(-1)=1, bit_widths=[0,0,0,0] (delta is exactly min_delta)
        let mut data = vec![128u8, 1, 4, 2, 6, 1, 0, 0, 0, 0];
        data.extend_from_slice(b"abXY");
        let (values, consumed) = decode(&data, 2).unwrap();
        assert_eq!(values[0], b"abX".as_slice());
        assert_eq!(values[1], b"Y".as_slice());
        assert_eq!(consumed, data.len());
    }
}
