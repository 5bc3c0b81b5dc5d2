//! `DELTA_BINARY_PACKED` (spec section 4.5).
//!
//! Header varints: `block_size`, `miniblocks_per_block`, `total_value_count`,
//! zig-zag `first_value`. Each block starts with a zig-zag `min_delta`
//! followed by one bit-width byte per mini-block, then the mini-blocks
//! themselves (LSB-first bit-packed). Every decoded value is
//! `prev_value + min_delta + packed_value`; the running sum is carried in
//! an `i128` accumulator so `INT64` columns cannot overflow before the
//! final (no-op, for `INT64`) narrowing, and `INT32` columns narrow only at
//! the last step (spec's "variable-width numeric paths" design note).

use super::bitpacked;
use super::uleb128;
use super::zigzag_leb128;
use crate::error::Result;

/// Decodes a `DELTA_BINARY_PACKED` stream into `count` `i64` values
/// (callers decoding an `INT32` column narrow each value with `as i32`
/// after the fact, preserving the wide accumulator semantics).
pub fn decode(data: &[u8], count: usize) -> Result<(Vec<i64>, usize)> {
    let mut pos = 0usize;
    let (block_size, n) = uleb128::decode(&data[pos..]);
    pos += n;
    let (num_miniblocks, n) = uleb128::decode(&data[pos..]);
    pos += n;
    let num_miniblocks = num_miniblocks as usize;
    let (total_count, n) = uleb128::decode(&data[pos..]);
    pos += n;
    let total_count = (total_count as usize).min(count.max(total_count as usize));
    let (first_value, n) = zigzag_leb128::decode(&data[pos..]);
    pos += n;

    if num_miniblocks == 0 || block_size == 0 {
        return Err(out_of_spec_err!(
            "DELTA_BINARY_PACKED: block_size/miniblocks_per_block must be non-zero"
        ));
    }
    let values_per_miniblock = block_size as usize / num_miniblocks;

    let mut out = Vec::with_capacity(total_count.min(count));
    let mut acc: i128 = first_value as i128;
    if total_count > 0 {
        out.push(first_value);
    }

    let mut remaining = total_count.saturating_sub(1);
    while remaining > 0 {
        if pos >= data.len() {
            return Err(truncated_err!(
                "DELTA_BINARY_PACKED: ran out of bytes decoding a block"
            ));
        }
        let (min_delta, n) = zigzag_leb128::decode(&data[pos..]);
        pos += n;

        if pos + num_miniblocks > data.len() {
            return Err(truncated_err!(
                "DELTA_BINARY_PACKED: missing mini-block bit-width bytes"
            ));
        }
        let bit_widths = &data[pos..pos + num_miniblocks];
        pos += num_miniblocks;

        for &bw in bit_widths {
            if remaining == 0 {
                break;
            }
            let this_miniblock = remaining.min(values_per_miniblock);
            if bw == 0 {
                for _ in 0..this_miniblock {
                    acc += min_delta as i128;
                    out.push(acc as i64);
                }
                remaining -= this_miniblock;
                continue;
            }
            let byte_len = bitpacked::packed_byte_len(values_per_miniblock, bw);
            if pos + byte_len > data.len() {
                return Err(truncated_err!(
                    "DELTA_BINARY_PACKED: mini-block overruns its stream"
                ));
            }
            let chunk = &data[pos..pos + byte_len];
            pos += byte_len;
            for packed in bitpacked::Decoder::new(chunk, bw, this_miniblock) {
                acc += min_delta as i128 + packed as i128;
                out.push(acc as i64);
            }
            remaining -= this_miniblock;
        }
    }
    out.truncate(count.min(out.len()));
    Ok((out, pos))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_from_spec_example() {
        // header: block_size=128, miniblocks=4, elements=5, first_value=2<=z>1
        // block1: min_delta=2<=z>1, bit_width=0
        let data = [128, 1, 4, 5, 2, 2, 0, 0, 0, 0];
        let (values, consumed) = decode(&data, 5).unwrap();
        assert_eq!(values, vec![1, 2, 3, 4, 5]);
        assert_eq!(consumed, 10);
    }

    #[test]
    fn decodes_multiple_miniblocks() {
        #[rustfmt::skip]
        let data = [
            128, 1, 4, 65, 100,
            7,
            3, 4, 0, 0,
            0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
            0x88, 0x88, 0x88, 0x88, 0x88, 0x88, 0x88, 0x88, 0x88, 0x88, 0x88, 0x88, 0x88, 0x88,
            0x88, 0x88,
        ];
        let (values, _) = decode(&data, 65).unwrap();
        assert_eq!(values[0], 50);
        assert_eq!(values[1], 46);
        assert_eq!(values.len(), 65);
    }

    #[test]
    fn negative_deltas_use_wide_accumulator() {
        // a run of large negative deltas must not overflow i64 accumulation
        let first = i64::MAX / 2;
        let mut buf = vec![];
        uleb_push(&mut buf, 128);
        uleb_push(&mut buf, 4);
        uleb_push(&mut buf, 2);
        zigzag_push(&mut buf, first);
        zigzag_push(&mut buf, -1000); // min_delta
        buf.extend_from_slice(&[0, 0, 0, 0]); // bit widths, all zero delta beyond min
        let (values, _) = decode(&buf, 2).unwrap();
        assert_eq!(values[0], first);
        assert_eq!(values[1], first - 1000);
    }

    fn uleb_push(buf: &mut Vec<u8>, mut v: u64) {
        loop {
            let mut byte = (v & 0x7f) as u8;
            v >>= 7;
            if v != 0 {
                byte |= 0x80;
            }
            buf.push(byte);
            if v == 0 {
                break;
            }
        }
    }

    fn zigzag_push(buf: &mut Vec<u8>, v: i64) {
        let u = ((v << 1) ^ (v >> 63)) as u64;
        uleb_push(buf, u);
    }
}
