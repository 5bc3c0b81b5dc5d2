// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Page decompression (spec section 4.10). The codec is a pure
//! `compressed -> decompressed` mapping: this crate is read-only, so no
//! codec here implements `compress`.
//!
//! Only `UNCOMPRESSED` and `SNAPPY` are decoded natively; `GZIP`, `BROTLI`,
//! `LZ4`/`LZ4_RAW` and `ZSTD` are feature-gated wrappers around their
//! respective crates, matching the "plugin codec" contract: a caller could
//! equally well supply their own `Codec` impl for a codec this crate
//! doesn't ship.

use crate::error::Result;

/// Compression codec, as it appears in `ColumnMetaData` (Thrift
/// `CompressionCodec`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compression {
    Uncompressed,
    Snappy,
    Gzip,
    Lzo,
    Brotli,
    Lz4,
    Zstd,
    Lz4Raw,
}

impl Compression {
    pub fn from_thrift_id(id: i32) -> Result<Self> {
        Ok(match id {
            0 => Compression::Uncompressed,
            1 => Compression::Snappy,
            2 => Compression::Gzip,
            3 => Compression::Lzo,
            4 => Compression::Brotli,
            5 => Compression::Lz4,
            6 => Compression::Zstd,
            7 => Compression::Lz4Raw,
            other => return Err(out_of_spec_err!("unknown compression codec id {}", other)),
        })
    }

    /// The codec's name as it appears in `CompressionCodec`, used as the
    /// lookup key into a caller-supplied [`CodecRegistry`] override.
    pub fn name(&self) -> &'static str {
        match self {
            Compression::Uncompressed => "UNCOMPRESSED",
            Compression::Snappy => "SNAPPY",
            Compression::Gzip => "GZIP",
            Compression::Lzo => "LZO",
            Compression::Brotli => "BROTLI",
            Compression::Lz4 => "LZ4",
            Compression::Zstd => "ZSTD",
            Compression::Lz4Raw => "LZ4_RAW",
        }
    }
}

/// A codec override table: codec name (spec section 6, `codecs`) to a
/// decompress function taking the compressed bytes and the page's declared
/// uncompressed size. Consulted ahead of [`create_codec`] so a caller can
/// supply, say, an LZO implementation this crate does not ship, or replace
/// a built-in codec entirely.
#[derive(Default)]
pub struct CodecRegistry {
    overrides: std::collections::HashMap<String, Box<dyn Fn(&[u8], usize) -> Result<Vec<u8>> + Send + Sync>>,
}

impl CodecRegistry {
    pub fn register(
        &mut self,
        name: impl Into<String>,
        f: impl Fn(&[u8], usize) -> Result<Vec<u8>> + Send + Sync + 'static,
    ) {
        self.overrides.insert(name.into(), Box::new(f));
    }

    pub fn get(&self, name: &str) -> Option<&(dyn Fn(&[u8], usize) -> Result<Vec<u8>> + Send + Sync)> {
        self.overrides.get(name).map(|f| f.as_ref())
    }
}

/// A decompression plugin. `decompress` must fill `output_buf` exactly
/// (its length is the page's declared uncompressed size); a mismatch is a
/// [`crate::error::ParquetError::DecompressionFailure`].
pub trait Codec: std::fmt::Debug {
    fn decompress(&mut self, input_buf: &[u8], output_buf: &mut [u8]) -> Result<()>;
}

/// Returns a codec for `codec`, or `None` for `UNCOMPRESSED` (callers should
/// treat that as "copy the page bytes verbatim").
pub fn create_codec(codec: Compression) -> Result<Option<Box<dyn Codec>>> {
    match codec {
        Compression::Uncompressed => Ok(None),
        Compression::Snappy => Ok(Some(Box::new(SnappyCodec))),
        #[cfg(feature = "gzip")]
        Compression::Gzip => Ok(Some(Box::new(gzip_codec::GZipCodec::new()))),
        #[cfg(feature = "brotli")]
        Compression::Brotli => Ok(Some(Box::new(brotli_codec::BrotliCodec::new()))),
        #[cfg(feature = "lz4")]
        Compression::Lz4 | Compression::Lz4Raw => Ok(Some(Box::new(lz4_codec::Lz4Codec::new()))),
        #[cfg(feature = "zstd")]
        Compression::Zstd => Ok(Some(Box::new(zstd_codec::ZstdCodec::new()))),
        other => Err(general_err!("compression codec {:?} is not installed", other)),
    }
}

/// Hand-rolled Snappy decompressor (spec section 4.10, "Snappy detail").
///
/// Implements only the subset the Parquet block format uses: a varint
/// uncompressed-length preamble followed by a sequence of literal and
/// copy tags. Every call must supply an `output_buf` of exactly that
/// uncompressed length.
#[derive(Debug, Default)]
pub struct SnappyCodec;

impl Codec for SnappyCodec {
    fn decompress(&mut self, input_buf: &[u8], output_buf: &mut [u8]) -> Result<()> {
        snappy::decompress(input_buf, output_buf)
    }
}

mod snappy {
    use crate::error::Result;

    /// Reads a base-128 varint, LSB group first, returning `(value, bytes_read)`.
    fn read_varint(data: &[u8]) -> Result<(u64, usize)> {
        let mut value = 0u64;
        for (i, &byte) in data.iter().enumerate().take(5) {
            value |= ((byte & 0x7f) as u64) << (7 * i);
            if byte & 0x80 == 0 {
                return Ok((value, i + 1));
            }
        }
        Err(out_of_spec_err!("snappy: invalid length header"))
    }

    pub fn decompress(input: &[u8], output: &mut [u8]) -> Result<()> {
        let (uncompressed_len, mut pos) = read_varint(input)?;
        if uncompressed_len as usize != output.len() {
            return Err(general_err!(
                "snappy: declared length {} does not match output buffer of {} bytes",
                uncompressed_len,
                output.len()
            ));
        }
        let mut out_pos = 0usize;

        while pos < input.len() {
            let tag = input[pos];
            pos += 1;
            match tag & 0x03 {
                0 => {
                    // literal
                    let mut len = (tag >> 2) as usize;
                    if len >= 60 {
                        let extra_bytes = len - 59;
                        if pos + extra_bytes > input.len() {
                            return Err(truncated_err!("snappy: truncated literal length"));
                        }
                        let mut extended = 0usize;
                        for i in 0..extra_bytes {
                            extended |= (input[pos + i] as usize) << (8 * i);
                        }
                        pos += extra_bytes;
                        len = extended;
                    }
                    len += 1;
                    if pos + len > input.len() {
                        return Err(truncated_err!("snappy: literal overruns input"));
                    }
                    if out_pos + len > output.len() {
                        return Err(general_err!("snappy: literal overruns output buffer"));
                    }
                    output[out_pos..out_pos + len].copy_from_slice(&input[pos..pos + len]);
                    pos += len;
                    out_pos += len;
                }
                tag_type => {
                    let (len, offset, consumed) = match tag_type {
                        1 => {
                            // copy with 1-byte offset
                            if pos >= input.len() {
                                return Err(truncated_err!("snappy: truncated copy-1 tag"));
                            }
                            let len = (((tag >> 2) & 0x07) + 4) as usize;
                            let offset = (((tag >> 5) as usize) << 8) | input[pos] as usize;
                            (len, offset, 1)
                        }
                        2 => {
                            if pos + 2 > input.len() {
                                return Err(truncated_err!("snappy: truncated copy-2 tag"));
                            }
                            let len = ((tag >> 2) as usize) + 1;
                            let offset =
                                u16::from_le_bytes(input[pos..pos + 2].try_into().unwrap())
                                    as usize;
                            (len, offset, 2)
                        }
                        3 => {
                            if pos + 4 > input.len() {
                                return Err(truncated_err!("snappy: truncated copy-4 tag"));
                            }
                            let len = ((tag >> 2) as usize) + 1;
                            let offset =
                                u32::from_le_bytes(input[pos..pos + 4].try_into().unwrap())
                                    as usize;
                            (len, offset, 4)
                        }
                        _ => unreachable!(),
                    };
                    pos += consumed;
                    if offset == 0 {
                        return Err(out_of_spec_err!("snappy: copy offset is zero"));
                    }
                    if offset > out_pos {
                        return Err(out_of_spec_err!(
                            "snappy: copy offset {} exceeds bytes produced so far {}",
                            offset,
                            out_pos
                        ));
                    }
                    if out_pos + len > output.len() {
                        return Err(general_err!("snappy: copy overruns output buffer"));
                    }
                    // byte-by-byte: offsets <= len produce RLE-style overlap.
                    for i in 0..len {
                        output[out_pos + i] = output[out_pos + i - offset];
                    }
                    out_pos += len;
                }
            }
        }

        if out_pos != output.len() {
            return Err(general_err!(
                "snappy: produced {} bytes, expected {}",
                out_pos,
                output.len()
            ));
        }
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn decodes_short_literal() {
            let input = [0x05u8, 0x10, b'h', b'y', b'p', b'e', b'r'];
            let mut out = vec![0u8; 5];
            decompress(&input, &mut out).unwrap();
            assert_eq!(&out, b"hyper");
        }

        #[test]
        fn decodes_copy_with_rle_overlap() {
            // "hyp" literal then a copy-2 of length 18 at offset 3, producing
            // "hyphyphyphyphyphyp" style repetition for a 21-byte total.
            let input = [0x15u8, 0x08, b'h', b'y', b'p', 0x46, 0x03, 0x00];
            let mut out = vec![0u8; 21];
            decompress(&input, &mut out).unwrap();
            assert_eq!(out.len(), 21);
            assert_eq!(&out[0..3], b"hyp");
            for chunk in out.chunks(3) {
                if chunk.len() == 3 {
                    assert_eq!(chunk, b"hyp");
                }
            }
        }

        #[test]
        fn rejects_zero_offset() {
            let input = [0x00u8, 0x02, 0x00, 0x00];
            let mut out = vec![0u8; 1];
            assert!(decompress(&input, &mut out).is_err());
        }

        #[test]
        fn rejects_offset_beyond_produced_bytes() {
            let input = [0x01u8, 0x02, 0x05, 0x00];
            let mut out = vec![0u8; 1];
            assert!(decompress(&input, &mut out).is_err());
        }
    }
}

#[cfg(feature = "gzip")]
mod gzip_codec {
    use std::io::Read;

    use flate2::read;

    use crate::compression::Codec;
    use crate::error::Result;

    #[derive(Debug)]
    pub struct GZipCodec {}

    impl GZipCodec {
        pub(crate) fn new() -> Self {
            Self {}
        }
    }

    impl Codec for GZipCodec {
        fn decompress(&mut self, input_buf: &[u8], output_buf: &mut [u8]) -> Result<()> {
            let mut decoder = read::GzDecoder::new(input_buf);
            decoder.read_exact(output_buf).map_err(|e| e.into())
        }
    }
}

#[cfg(feature = "brotli")]
mod brotli_codec {
    use std::io::Read;

    use crate::compression::Codec;
    use crate::error::Result;

    const BROTLI_DEFAULT_BUFFER_SIZE: usize = 4096;

    #[derive(Debug)]
    pub struct BrotliCodec {}

    impl BrotliCodec {
        pub(crate) fn new() -> Self {
            Self {}
        }
    }

    impl Codec for BrotliCodec {
        fn decompress(&mut self, input_buf: &[u8], output_buf: &mut [u8]) -> Result<()> {
            brotli::Decompressor::new(input_buf, BROTLI_DEFAULT_BUFFER_SIZE)
                .read_exact(output_buf)
                .map_err(|e| e.into())
        }
    }
}

#[cfg(feature = "lz4")]
mod lz4_codec {
    use std::io::Read;

    use crate::compression::Codec;
    use crate::error::Result;

    #[derive(Debug)]
    pub struct Lz4Codec {}

    impl Lz4Codec {
        pub(crate) fn new() -> Self {
            Self {}
        }
    }

    impl Codec for Lz4Codec {
        fn decompress(&mut self, input_buf: &[u8], output_buf: &mut [u8]) -> Result<()> {
            let mut decoder = lz4::Decoder::new(input_buf)?;
            decoder.read_exact(output_buf).map_err(|e| e.into())
        }
    }
}

#[cfg(feature = "zstd")]
mod zstd_codec {
    use std::io::Read;

    use crate::compression::Codec;
    use crate::error::Result;

    #[derive(Debug)]
    pub struct ZstdCodec {}

    impl ZstdCodec {
        pub(crate) fn new() -> Self {
            Self {}
        }
    }

    impl Codec for ZstdCodec {
        fn decompress(&mut self, input_buf: &[u8], output_buf: &mut [u8]) -> Result<()> {
            let mut decoder = zstd::Decoder::new(input_buf)?;
            decoder.read_exact(output_buf).map_err(|e| e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncompressed_codec_is_none() {
        assert!(create_codec(Compression::Uncompressed).unwrap().is_none());
    }

    #[test]
    fn unregistered_codec_errors() {
        assert!(create_codec(Compression::Lzo).is_err());
    }

    #[test]
    fn snappy_round_trips_a_plain_copy() {
        // a single literal tag covering the whole payload is valid input
        // even though it isn't what a real encoder would emit.
        let payload = b"parquet";
        let mut input = vec![payload.len() as u8];
        input.push((((payload.len() - 1) as u8) << 2) | 0); // literal tag
        input.extend_from_slice(payload);
        let mut codec = create_codec(Compression::Snappy).unwrap().unwrap();
        let mut out = vec![0u8; payload.len()];
        codec.decompress(&input, &mut out).unwrap();
        assert_eq!(&out, payload);
    }
}
