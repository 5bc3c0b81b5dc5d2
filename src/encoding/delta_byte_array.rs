//! `DELTA_BYTE_ARRAY` (spec section 4.5): two `DELTA_BINARY_PACKED` streams
//! (prefix lengths, then suffix lengths) followed by the concatenated
//! suffix bytes. `value[i] = value[i-1][..prefix[i]] ++ suffix[i]`.

use super::delta_bitpacked;
use crate::error::Result;

pub fn decode(data: &[u8], count: usize) -> Result<Vec<Vec<u8>>> {
    let (prefixes, consumed) = delta_bitpacked::decode(data, count)?;
    let rest = &data[consumed..];
    let (suffix_lengths, consumed2) = delta_bitpacked::decode(rest, count)?;
    let mut pos = consumed2;

    let mut out: Vec<Vec<u8>> = Vec::with_capacity(count);
    let mut previous: Vec<u8> = Vec::new();
    for (prefix_len, suffix_len) in prefixes.into_iter().zip(suffix_lengths.into_iter()) {
        let prefix_len = prefix_len as usize;
        let suffix_len = suffix_len as usize;
        if prefix_len > previous.len() {
            return Err(out_of_spec_err!(
                "DELTA_BYTE_ARRAY: prefix length {} exceeds previous value length {}",
                prefix_len,
                previous.len()
            ));
        }
        if pos + suffix_len > rest.len() {
            return Err(truncated_err!(
                "DELTA_BYTE_ARRAY: suffix overruns its stream"
            ));
        }
        let mut value = previous[..prefix_len].to_vec();
        value.extend_from_slice(&rest[pos..pos + suffix_len]);
        pos += suffix_len;
        previous = value.clone();
        out.push(value);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconstructs_values_from_prefix_and_suffix() {
        // prefixes: [0, 3] (second value shares 3 bytes with the first)
        // header: block_size=128, miniblocks=4, count=2, first=zigzag(0)=0
        // block: min_delta=zigzag(3)=6, bit_widths=[0,0,0,0]
        let prefixes = [128u8, 1, 4, 2, 0, 6, 0, 0, 0, 0];
        // suffixes: [3, 3] ("cat", "nip")
        // first=zigzag(3)=6, min_delta=zigzag(0)=0
        let suffixes = [128u8, 1, 4, 2, 6, 0, 0, 0, 0, 0];
        let mut data = vec![];
        data.extend_from_slice(&prefixes);
        data.extend_from_slice(&suffixes);
        data.extend_from_slice(b"catnip");

        let values = decode(&data, 2).unwrap();
        assert_eq!(values[0], b"cat".to_vec());
        assert_eq!(values[1], b"catnip".to_vec());
    }
}
