//! Key fingerprints and key ids.
//!
//! ```text
//! SubjectPublicKeyInfo DER ──SHA-256──► Fingerprint (32 bytes)
//!                                           │
//!                                   low 64 bits (last 8 bytes, big endian)
//!                                           ▼
//!                                        KeyId
//! ```
//!
//! Both are pure functions of the public key, so a key exported from one ring
//! and imported into another keeps its id.

use std::fmt;
use std::str::FromStr;

use rsa::RsaPublicKey;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use super::asymmetric::public_key_to_der;
use crate::error::{Error, Result};

/// SHA-256 fingerprint of a public key
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Fingerprint a public key
    pub fn of(public_key: &RsaPublicKey) -> Result<Self> {
        let der = public_key_to_der(public_key)?;
        Ok(Self::of_der(&der))
    }

    /// Fingerprint an already-encoded SubjectPublicKeyInfo
    pub fn of_der(spki_der: &[u8]) -> Self {
        Self(Sha256::digest(spki_der).into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The key id is the low 64 bits of the fingerprint
    pub fn key_id(&self) -> KeyId {
        let mut low = [0u8; 8];
        low.copy_from_slice(&self.0[24..]);
        KeyId(u64::from_be_bytes(low))
    }

    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

/// 64-bit key identifier, rendered as 16 upper-case hex digits
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyId(u64);

impl KeyId {
    pub const fn from_u64(value: u64) -> Self {
        Self(value)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Derive the key id of a public key
    pub fn of(public_key: &RsaPublicKey) -> Result<Self> {
        Ok(Fingerprint::of(public_key)?.key_id())
    }

    pub fn to_hex(&self) -> String {
        format!("{:016X}", self.0)
    }

    /// Parse a hex key id (case-insensitive, optional `0x` prefix)
    pub fn from_hex(s: &str) -> Result<Self> {
        let digits = s
            .trim()
            .trim_start_matches("0x")
            .trim_start_matches("0X");
        if digits.is_empty() || digits.len() > 16 {
            return Err(Error::InvalidRequest(format!("invalid key id: {}", s)));
        }
        u64::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|_| Error::InvalidRequest(format!("invalid key id: {}", s)))
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X}", self.0)
    }
}

impl fmt::Debug for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyId({:016X})", self.0)
    }
}

impl FromStr for KeyId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl Serialize for KeyId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for KeyId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_id_is_low_bits_of_fingerprint() {
        let fp = Fingerprint::of_der(b"not really DER but bytes are bytes");
        let id = fp.key_id();
        assert_eq!(id.to_hex(), fp.to_hex()[48..]);
    }

    #[test]
    fn test_key_id_hex_round_trip() {
        let id = KeyId::from_u64(0x0123_4567_89AB_CDEF);
        assert_eq!(id.to_string(), "0123456789ABCDEF");
        assert_eq!(KeyId::from_hex("0123456789abcdef").unwrap(), id);
        assert_eq!("0x0123456789ABCDEF".parse::<KeyId>().unwrap(), id);
    }

    #[test]
    fn test_key_id_rejects_garbage() {
        assert!(KeyId::from_hex("").is_err());
        assert!(KeyId::from_hex("xyz").is_err());
        assert!(KeyId::from_hex("0123456789ABCDEF0").is_err());
    }

    #[test]
    fn test_key_id_serde_as_string() {
        let id = KeyId::from_u64(42);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"000000000000002A\"");
        let back: KeyId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_fingerprint_deterministic() {
        let a = Fingerprint::of_der(b"spki");
        let b = Fingerprint::of_der(b"spki");
        let c = Fingerprint::of_der(b"spkj");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
