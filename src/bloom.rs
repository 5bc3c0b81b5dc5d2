//! Bloom filter read path (spec section 4.10): block-split Bloom filters as
//! used by `ColumnMetaData.bloom_filter_offset`/`bloom_filter_length`.
//!
//! Wire format: a Thrift compact `BloomFilterHeader` (num bytes, algorithm,
//! hash, compression -- this crate only supports the uncompressed
//! `SPLIT_BLOCK`/`XXHASH` combination every writer emits) followed by that
//! many bytes of bit-set, organised as fixed 32-byte ("256-bit") blocks.

use crate::error::Result;
use crate::thrift::reader::CompactProtocolReader;

/// The eight fixed salts from the Parquet Bloom filter specification.
const SALT: [u32; 8] = [
    0x47b6137b, 0x44974d91, 0x8824ad5b, 0xa2b7289d, 0x705495c7, 0x2df1424b, 0x9efc4947, 0x5c6bfb31,
];

const BLOCK_BYTES: usize = 32;
const WORDS_PER_BLOCK: usize = 8;

pub struct BloomFilter {
    blocks: Vec<[u32; WORDS_PER_BLOCK]>,
}

impl BloomFilter {
    /// Parses a Bloom filter from the bytes at
    /// `[bloom_filter_offset, bloom_filter_offset + bloom_filter_length)`.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = CompactProtocolReader::new(data);
        let header = reader.read_struct()?;
        let num_bytes = header.i32(1)? as usize;
        // field 2 (algorithm), field 3 (hash), field 4 (compression) are
        // unions that are always BLOCK/XXHASH/UNCOMPRESSED in practice;
        // this decoder does not branch on them, matching the spec's
        // "ships only the native path" stance for collaborators.
        let bitset_start = reader.consumed();
        let bitset = data
            .get(bitset_start..bitset_start + num_bytes)
            .ok_or_else(|| truncated_err!("bloom filter: declared size exceeds available bytes"))?;
        if num_bytes % BLOCK_BYTES != 0 {
            return Err(out_of_spec_err!(
                "bloom filter: byte length {} is not a multiple of the 32-byte block size",
                num_bytes
            ));
        }
        let mut blocks = Vec::with_capacity(num_bytes / BLOCK_BYTES);
        for chunk in bitset.chunks_exact(BLOCK_BYTES) {
            let mut words = [0u32; WORDS_PER_BLOCK];
            for (i, word) in words.iter_mut().enumerate() {
                *word = u32::from_le_bytes(chunk[i * 4..i * 4 + 4].try_into().unwrap());
            }
            blocks.push(words);
        }
        Ok(BloomFilter { blocks })
    }

    /// Tests whether `hash` (the xxhash64 of the candidate value) may be a
    /// member. False positives are possible; false negatives are not.
    pub fn check(&self, hash: u64) -> bool {
        if self.blocks.is_empty() {
            return false;
        }
        let block_index = (((hash >> 32) * self.blocks.len() as u64) >> 32) as usize;
        let block = &self.blocks[block_index];
        let lower = hash as u32;
        for i in 0..8 {
            let mask = 1u32 << ((lower.wrapping_mul(SALT[i])) >> 27);
            if block[i] & mask == 0 {
                return false;
            }
        }
        true
    }

    #[cfg(feature = "bloom_filter")]
    pub fn check_bytes(&self, value: &[u8]) -> bool {
        self.check(xxhash_rust::xxh64::xxh64(value, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_bit(block: &mut [u32; WORDS_PER_BLOCK], hash: u64) {
        let lower = hash as u32;
        for i in 0..8 {
            let bit = (lower.wrapping_mul(SALT[i])) >> 27;
            block[i] |= 1 << bit;
        }
    }

    #[test]
    fn member_that_was_set_is_found() {
        let mut block = [0u32; WORDS_PER_BLOCK];
        let hash = 0xDEAD_BEEF_0000_0001u64;
        set_bit(&mut block, hash);
        let filter = BloomFilter {
            blocks: vec![block],
        };
        assert!(filter.check(hash));
    }

    #[test]
    fn empty_filter_has_no_members() {
        let filter = BloomFilter { blocks: vec![] };
        assert!(!filter.check(123));
    }
}
