use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use parquet_rs::encoding::{bitpacked, hybrid_rle};

/// One bit-packed run covering all of `count` values (a single indicator
/// byte followed by the packed payload), the hybrid stream's worst case for
/// `decode`'s inner loop since it never falls back to an RLE run.
fn bitpacked_stream(count: usize, num_bits: u8) -> Vec<u8> {
    let groups = (count + 7) / 8;
    let indicator = ((groups as u64) << 1) | 1;
    let mut body = unsigned_leb128(indicator);
    let values: Vec<u32> = (0..(groups * 8) as u32).collect();
    body.extend(pack(&values, num_bits));
    body
}

/// A long RLE run of one repeated value: the hybrid stream's other extreme,
/// where `decode` never touches `bitpacked` at all.
fn rle_stream(count: usize, value: u32) -> Vec<u8> {
    let indicator = (count as u64) << 1;
    let mut body = unsigned_leb128(indicator);
    body.push(value as u8);
    body
}

fn unsigned_leb128(mut v: u64) -> Vec<u8> {
    let mut out = vec![];
    loop {
        let mut byte = (v & 0x7f) as u8;
        v >>= 7;
        if v != 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if v == 0 {
            break;
        }
    }
    out
}

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

fn decode_rle(c: &mut Criterion) {
    let mut group = c.benchmark_group("hybrid_rle_decode");
    for size in [1_000usize, 10_000, 100_000] {
        let bitpacked = bitpacked_stream(size, 8);
        group.bench_with_input(BenchmarkId::new("bitpacked_run", size), &bitpacked, |b, data| {
            b.iter(|| hybrid_rle::decode(data, 8, size, Some(data.len() as u32)).unwrap());
        });

        let rle = rle_stream(size, 42);
        group.bench_with_input(BenchmarkId::new("rle_run", size), &rle, |b, data| {
            b.iter(|| hybrid_rle::decode(data, 8, size, Some(data.len() as u32)).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, decode_rle);
criterion_main!(benches);
