//! zlib compression for message payloads.
//!
//! Inflation is bounded: a payload that would expand past the caller's limit
//! is treated as corrupt rather than allocated.

use miniz_oxide::deflate::compress_to_vec_zlib;
use miniz_oxide::inflate::{decompress_to_vec_zlib_with_limit, TINFLStatus};

use crate::error::{Error, Result};

/// Default deflate level (same trade-off as zlib's default)
pub const DEFAULT_LEVEL: u8 = 6;

/// Default ceiling on inflated output (256 MiB)
pub const DEFAULT_DECOMPRESS_LIMIT: usize = 256 * 1024 * 1024;

/// Compress `data` into a zlib stream
pub fn compress(data: &[u8]) -> Vec<u8> {
    compress_to_vec_zlib(data, DEFAULT_LEVEL)
}

/// Inflate a zlib stream, refusing output larger than `limit` bytes
pub fn decompress(data: &[u8], limit: usize) -> Result<Vec<u8>> {
    decompress_to_vec_zlib_with_limit(data, limit).map_err(|e| match e.status {
        TINFLStatus::HasMoreOutput => Error::CorruptCompressedData(format!(
            "inflated size exceeds limit of {} bytes",
            limit
        )),
        status => Error::CorruptCompressedData(format!("invalid zlib stream: {:?}", status)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compress_shrinks_repetitive_data() {
        let data = b"hello ".repeat(1000);
        let packed = compress(&data);
        assert!(packed.len() < data.len() / 10);
        assert_eq!(decompress(&packed, DEFAULT_DECOMPRESS_LIMIT).unwrap(), data);
    }

    #[test]
    fn test_empty_input() {
        let packed = compress(b"");
        assert!(decompress(&packed, 16).unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_stream() {
        let mut packed = compress(b"some text that compresses");
        let mid = packed.len() / 2;
        packed[mid] ^= 0xFF;
        packed.truncate(packed.len() - 2);

        assert!(matches!(
            decompress(&packed, DEFAULT_DECOMPRESS_LIMIT),
            Err(Error::CorruptCompressedData(_))
        ));
    }

    #[test]
    fn test_not_zlib_at_all() {
        assert!(matches!(
            decompress(b"plain text", DEFAULT_DECOMPRESS_LIMIT),
            Err(Error::CorruptCompressedData(_))
        ));
    }

    #[test]
    fn test_limit_enforced() {
        let packed = compress(&vec![0u8; 10_000]);
        let err = decompress(&packed, 1_000).unwrap_err();
        assert!(err.to_string().contains("exceeds limit"));
    }
}
