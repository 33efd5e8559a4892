//! # Symmetric Cipher Module
//!
//! Encrypts message payloads under a one-time session key.
//!
//! ## Ciphertext Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       SYMMETRIC CIPHERTEXTS                             │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  AES-128-GCM / AES-256-GCM                                             │
//! │  ┌──────────────┬──────────────────────────────┬──────────────┐        │
//! │  │ nonce (12 B) │ ciphertext                   │ tag (16 B)   │        │
//! │  └──────────────┴──────────────────────────────┴──────────────┘        │
//! │                                                                         │
//! │  3DES-CBC + HMAC-SHA256 (encrypt-then-MAC)                             │
//! │  ┌──────────────┬──────────────────────────────┬──────────────┐        │
//! │  │ iv (8 B)     │ ciphertext (PKCS#7 padded)   │ tag (32 B)   │        │
//! │  └──────────────┴──────────────────────────────┴──────────────┘        │
//! │                                                                         │
//! │  3DES session key (24 B) ──HKDF-SHA256──► cipher key (24 B)            │
//! │                                        └► MAC key    (32 B)            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Security Properties
//!
//! | Property | Guarantee |
//! |----------|-----------|
//! | Confidentiality | Fresh random nonce/IV per call |
//! | Integrity | GCM tag, or HMAC verified before any decryption |
//! | No partial output | Decryption returns all plaintext or an error |

use std::fmt;
use std::str::FromStr;

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes128Gcm, Aes256Gcm, Nonce as AesNonce,
};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::{Error, Result};

/// Size of the AES-GCM nonce in bytes (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Size of the AES-GCM authentication tag in bytes (128 bits)
pub const TAG_SIZE: usize = 16;

/// Size of the 3DES CBC initialisation vector
pub const TDES_IV_SIZE: usize = 8;

/// Size of the HMAC-SHA256 tag appended to 3DES ciphertexts
pub const TDES_MAC_SIZE: usize = 32;

const TDES_BLOCK_SIZE: usize = 8;
const TDES_CIPHER_INFO: &[u8] = b"pgp-core-3des-cipher-v1";
const TDES_MAC_INFO: &[u8] = b"pgp-core-3des-mac-v1";

type TdesCbcEnc = cbc::Encryptor<des::TdesEde3>;
type TdesCbcDec = cbc::Decryptor<des::TdesEde3>;
type HmacSha256 = Hmac<Sha256>;

/// Payload cipher, identified on the wire by its OpenPGP algorithm id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SymmetricAlgorithm {
    /// Triple-DES (EDE, three keys)
    TripleDes,
    /// AES with a 128-bit key
    #[default]
    Aes128,
    /// AES with a 256-bit key
    Aes256,
}

impl SymmetricAlgorithm {
    /// OpenPGP symmetric algorithm id
    pub fn id(&self) -> u8 {
        match self {
            SymmetricAlgorithm::TripleDes => 2,
            SymmetricAlgorithm::Aes128 => 7,
            SymmetricAlgorithm::Aes256 => 9,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            2 => Some(SymmetricAlgorithm::TripleDes),
            7 => Some(SymmetricAlgorithm::Aes128),
            9 => Some(SymmetricAlgorithm::Aes256),
            _ => None,
        }
    }

    /// Session key length in bytes
    pub fn key_size(&self) -> usize {
        match self {
            SymmetricAlgorithm::TripleDes => 24,
            SymmetricAlgorithm::Aes128 => 16,
            SymmetricAlgorithm::Aes256 => 32,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SymmetricAlgorithm::TripleDes => "3DES",
            SymmetricAlgorithm::Aes128 => "AES-128",
            SymmetricAlgorithm::Aes256 => "AES-256",
        }
    }
}

impl fmt::Display for SymmetricAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SymmetricAlgorithm {
    type Err = Error;

    /// Accepts the names used by the web form as well as the canonical ones
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "aes" | "aes128" => Ok(SymmetricAlgorithm::Aes128),
            "aes256" => Ok(SymmetricAlgorithm::Aes256),
            "3des" | "tripledes" | "des3" | "tdes" => Ok(SymmetricAlgorithm::TripleDes),
            other => Err(Error::InvalidRequest(format!("unknown cipher: {}", other))),
        }
    }
}

/// A one-time symmetric key, zeroized when dropped
pub struct SessionKey {
    algorithm: SymmetricAlgorithm,
    bytes: Zeroizing<Vec<u8>>,
}

impl SessionKey {
    /// Generate a fresh random key for `algorithm`
    pub fn generate(algorithm: SymmetricAlgorithm) -> Self {
        let mut bytes = Zeroizing::new(vec![0u8; algorithm.key_size()]);
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self { algorithm, bytes }
    }

    /// Rebuild a key recovered from a session-key packet
    pub fn from_bytes(algorithm: SymmetricAlgorithm, bytes: &[u8]) -> Result<Self> {
        if bytes.len() != algorithm.key_size() {
            return Err(Error::InvalidKey(format!(
                "{} session key must be {} bytes, got {}",
                algorithm,
                algorithm.key_size(),
                bytes.len()
            )));
        }
        Ok(Self {
            algorithm,
            bytes: Zeroizing::new(bytes.to_vec()),
        })
    }

    pub fn algorithm(&self) -> SymmetricAlgorithm {
        self.algorithm
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        sym_encrypt(&self.bytes, plaintext, self.algorithm)
    }

    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        sym_decrypt(&self.bytes, ciphertext, self.algorithm)
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKey")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

fn check_key_len(key: &[u8], algorithm: SymmetricAlgorithm) -> Result<()> {
    if key.len() != algorithm.key_size() {
        return Err(Error::InvalidKey(format!(
            "{} requires a {}-byte key, got {}",
            algorithm,
            algorithm.key_size(),
            key.len()
        )));
    }
    Ok(())
}

/// Encrypt `plaintext` under `key`
///
/// The returned blob carries its own nonce/IV and authentication tag.
pub fn sym_encrypt(key: &[u8], plaintext: &[u8], algorithm: SymmetricAlgorithm) -> Result<Vec<u8>> {
    check_key_len(key, algorithm)?;

    match algorithm {
        SymmetricAlgorithm::Aes128 | SymmetricAlgorithm::Aes256 => gcm_encrypt(key, plaintext, algorithm),
        SymmetricAlgorithm::TripleDes => tdes_encrypt(key, plaintext),
    }
}

/// Decrypt a blob produced by [`sym_encrypt`]
///
/// ## Errors
///
/// Returns `DecryptionFailed` if the blob was truncated or tampered with,
/// or if the key is wrong. No plaintext is returned in that case.
pub fn sym_decrypt(key: &[u8], ciphertext: &[u8], algorithm: SymmetricAlgorithm) -> Result<Vec<u8>> {
    check_key_len(key, algorithm)?;

    match algorithm {
        SymmetricAlgorithm::Aes128 | SymmetricAlgorithm::Aes256 => gcm_decrypt(key, ciphertext, algorithm),
        SymmetricAlgorithm::TripleDes => tdes_decrypt(key, ciphertext),
    }
}

// ============================================================================
// AES-GCM
// ============================================================================

fn gcm_encrypt(key: &[u8], plaintext: &[u8], algorithm: SymmetricAlgorithm) -> Result<Vec<u8>> {
    let mut nonce = [0u8; NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut nonce);
    let aes_nonce = AesNonce::from_slice(&nonce);

    let sealed = match algorithm {
        SymmetricAlgorithm::Aes256 => Aes256Gcm::new_from_slice(key)
            .map_err(|e| Error::InvalidKey(format!("{}", e)))?
            .encrypt(aes_nonce, plaintext),
        _ => Aes128Gcm::new_from_slice(key)
            .map_err(|e| Error::InvalidKey(format!("{}", e)))?
            .encrypt(aes_nonce, plaintext),
    }
    .map_err(|e| Error::EncryptionFailed(format!("{} encryption failed: {}", algorithm, e)))?;

    let mut out = Vec::with_capacity(NONCE_SIZE + sealed.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&sealed);
    Ok(out)
}

fn gcm_decrypt(key: &[u8], blob: &[u8], algorithm: SymmetricAlgorithm) -> Result<Vec<u8>> {
    if blob.len() < NONCE_SIZE + TAG_SIZE {
        return Err(Error::DecryptionFailed("ciphertext truncated".into()));
    }
    let (nonce, sealed) = blob.split_at(NONCE_SIZE);
    let aes_nonce = AesNonce::from_slice(nonce);

    let opened = match algorithm {
        SymmetricAlgorithm::Aes256 => Aes256Gcm::new_from_slice(key)
            .map_err(|e| Error::InvalidKey(format!("{}", e)))?
            .decrypt(aes_nonce, sealed),
        _ => Aes128Gcm::new_from_slice(key)
            .map_err(|e| Error::InvalidKey(format!("{}", e)))?
            .decrypt(aes_nonce, sealed),
    };

    opened.map_err(|_| Error::DecryptionFailed("authentication tag mismatch".into()))
}

// ============================================================================
// 3DES-CBC + HMAC-SHA256
// ============================================================================

fn tdes_subkeys(key: &[u8]) -> Result<(Zeroizing<[u8; 24]>, Zeroizing<[u8; 32]>)> {
    let hkdf = Hkdf::<Sha256>::new(None, key);
    let mut cipher_key = Zeroizing::new([0u8; 24]);
    let mut mac_key = Zeroizing::new([0u8; 32]);
    hkdf.expand(TDES_CIPHER_INFO, &mut cipher_key[..])
        .map_err(|_| Error::KeyDerivationFailed("HKDF expansion failed".into()))?;
    hkdf.expand(TDES_MAC_INFO, &mut mac_key[..])
        .map_err(|_| Error::KeyDerivationFailed("HKDF expansion failed".into()))?;
    Ok((cipher_key, mac_key))
}

fn tdes_mac(mac_key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<HmacSha256> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(mac_key)
        .map_err(|e| Error::InvalidKey(format!("{}", e)))?;
    mac.update(iv);
    mac.update(ciphertext);
    Ok(mac)
}

fn tdes_encrypt(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let (cipher_key, mac_key) = tdes_subkeys(key)?;

    let mut iv = [0u8; TDES_IV_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut iv);

    let ciphertext = TdesCbcEnc::new_from_slices(&cipher_key[..], &iv)
        .map_err(|e| Error::InvalidKey(format!("{}", e)))?
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let tag = tdes_mac(&mac_key[..], &iv, &ciphertext)?
        .finalize()
        .into_bytes();

    let mut out = Vec::with_capacity(TDES_IV_SIZE + ciphertext.len() + TDES_MAC_SIZE);
    out.extend_from_slice(&iv);
    out.extend_from_slice(&ciphertext);
    out.extend_from_slice(&tag);
    Ok(out)
}

fn tdes_decrypt(key: &[u8], blob: &[u8]) -> Result<Vec<u8>> {
    if blob.len() < TDES_IV_SIZE + TDES_BLOCK_SIZE + TDES_MAC_SIZE {
        return Err(Error::DecryptionFailed("ciphertext truncated".into()));
    }
    let (cipher_key, mac_key) = tdes_subkeys(key)?;

    let (iv, rest) = blob.split_at(TDES_IV_SIZE);
    let (ciphertext, tag) = rest.split_at(rest.len() - TDES_MAC_SIZE);

    tdes_mac(&mac_key[..], iv, ciphertext)?
        .verify_slice(tag)
        .map_err(|_| Error::DecryptionFailed("authentication tag mismatch".into()))?;

    TdesCbcDec::new_from_slices(&cipher_key[..], iv)
        .map_err(|e| Error::InvalidKey(format!("{}", e)))?
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| Error::DecryptionFailed("invalid padding".into()))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [SymmetricAlgorithm; 3] = [
        SymmetricAlgorithm::Aes128,
        SymmetricAlgorithm::Aes256,
        SymmetricAlgorithm::TripleDes,
    ];

    #[test]
    fn test_encrypt_decrypt_each_algorithm() {
        for algorithm in ALL {
            let key = SessionKey::generate(algorithm);
            let plaintext = b"Attack at dawn, bring the 3DES";

            let ciphertext = key.encrypt(plaintext).unwrap();
            assert_ne!(&ciphertext[..], &plaintext[..]);

            let decrypted = key.decrypt(&ciphertext).unwrap();
            assert_eq!(decrypted, plaintext, "{} round trip", algorithm);
        }
    }

    #[test]
    fn test_empty_plaintext() {
        for algorithm in ALL {
            let key = SessionKey::generate(algorithm);
            let ciphertext = key.encrypt(b"").unwrap();
            assert!(key.decrypt(&ciphertext).unwrap().is_empty());
        }
    }

    #[test]
    fn test_fresh_nonce_per_call() {
        let key = SessionKey::generate(SymmetricAlgorithm::Aes128);
        let a = key.encrypt(b"same message").unwrap();
        let b = key.encrypt(b"same message").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        for algorithm in ALL {
            let key = SessionKey::generate(algorithm);
            let mut ciphertext = key.encrypt(b"Secret message").unwrap();
            let mid = ciphertext.len() / 2;
            ciphertext[mid] ^= 0x01;

            let result = key.decrypt(&ciphertext);
            assert!(
                matches!(result, Err(Error::DecryptionFailed(_))),
                "{} accepted tampered data",
                algorithm
            );
        }
    }

    #[test]
    fn test_wrong_key_fails() {
        for algorithm in ALL {
            let key = SessionKey::generate(algorithm);
            let other = SessionKey::generate(algorithm);
            let ciphertext = key.encrypt(b"Secret message").unwrap();
            assert!(matches!(
                other.decrypt(&ciphertext),
                Err(Error::DecryptionFailed(_))
            ));
        }
    }

    #[test]
    fn test_truncated_ciphertext_fails() {
        for algorithm in ALL {
            let key = SessionKey::generate(algorithm);
            let ciphertext = key.encrypt(b"Secret message").unwrap();
            assert!(matches!(
                key.decrypt(&ciphertext[..10]),
                Err(Error::DecryptionFailed(_))
            ));
        }
    }

    #[test]
    fn test_key_length_checked() {
        let result = sym_encrypt(&[0u8; 15], b"x", SymmetricAlgorithm::Aes128);
        assert!(matches!(result, Err(Error::InvalidKey(_))));
        assert!(SessionKey::from_bytes(SymmetricAlgorithm::TripleDes, &[0u8; 16]).is_err());
    }

    #[test]
    fn test_algorithm_ids_and_names() {
        for algorithm in ALL {
            assert_eq!(SymmetricAlgorithm::from_id(algorithm.id()), Some(algorithm));
        }
        assert_eq!(SymmetricAlgorithm::from_id(0), None);
        assert_eq!("AES".parse::<SymmetricAlgorithm>().unwrap(), SymmetricAlgorithm::Aes128);
        assert_eq!("3des".parse::<SymmetricAlgorithm>().unwrap(), SymmetricAlgorithm::TripleDes);
        assert_eq!("aes-256".parse::<SymmetricAlgorithm>().unwrap(), SymmetricAlgorithm::Aes256);
        assert!("rot13".parse::<SymmetricAlgorithm>().is_err());
    }
}
