//! # Codec Layer
//!
//! Byte-level transforms applied around the cryptographic core:
//!
//! | Transform | Module | Failure |
//! |-----------|--------|---------|
//! | Radix-64 armor with CRC-24 | [`armor`] | `MalformedArmor` |
//! | zlib compression | [`compression`] | `CorruptCompressedData` |
//!
//! Ordering is fixed by the message pipeline: compress before sign, sign
//! before encrypt, armor last.

pub mod armor;
pub mod compression;

pub use armor::{
    armor_decode, armor_decode_with_kind, armor_encode, armor_encode_as, crc24, is_armored,
    ArmorKind,
};
pub use compression::{compress, decompress, DEFAULT_DECOMPRESS_LIMIT};
