use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use parquet_rs::encoding::bitpacked;

/// Packs `values.len()` values LSB-first at `num_bits` each, matching the
/// wire format `bitpacked::Decoder` expects.
fn pack(values: &[u32], num_bits: u8) -> Vec<u8> {
    let mut packed = vec![0u8; bitpacked::packed_byte_len(values.len(), num_bits) + 1];
    let mut bit_pos = 0usize;
    for &v in values {
        for b in 0..num_bits {
            if (v >> b) & 1 == 1 {
                packed[(bit_pos + b as usize) / 8] |= 1 << ((bit_pos + b as usize) % 8);
            }
        }
        bit_pos += num_bits as usize;
    }
    packed
}

fn decode_bitpacking(c: &mut Criterion) {
    let mut group = c.benchmark_group("bitpacked_decode");
    for size in [1_000usize, 10_000, 100_000] {
        for num_bits in [3u8, 9, 17] {
            let max = (1u64 << num_bits).saturating_sub(1) as u32;
            let values: Vec<u32> = (0..size as u32).map(|i| i % max.max(1)).collect();
            let packed = pack(&values, num_bits);
            group.bench_with_input(
                BenchmarkId::new(format!("{}bit", num_bits), size),
                &packed,
                |b, packed| {
                    b.iter(|| bitpacked::Decoder::new(packed, num_bits, size).collect::<Vec<u32>>());
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, decode_bitpacking);
criterion_main!(benches);
