//! # Asymmetric Key Module
//!
//! RSA key pairs and the two operations built on them.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         RSA OPERATIONS                                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Session key wrapping                                                  │
//! │    asym_encrypt(public, session_key)  RSA-OAEP, SHA-256, MGF1-SHA-256  │
//! │    asym_decrypt(private, wrapped)                                      │
//! │                                                                         │
//! │  Signatures                                                            │
//! │    sign(private, data)                RSASSA-PKCS1-v1_5 over SHA-256   │
//! │    verify(public, data, signature)    → bool                           │
//! │                                                                         │
//! │  Encodings                                                             │
//! │    public  : SubjectPublicKeyInfo (DER, or PEM "PUBLIC KEY")           │
//! │    private : PKCS#8 DER, only ever handled in zeroizing buffers        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Key generation uses the public exponent 65537 and draws from the OS
//! CSPRNG. Allowed modulus sizes come from a [`KeyPolicy`].

use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::error::{Error, Result};

/// Modulus sizes accepted for new key pairs by default
pub const DEFAULT_KEY_SIZES: [usize; 3] = [2048, 3072, 4096];

/// Smallest modulus accepted when importing someone else's key
pub const MIN_IMPORT_KEY_SIZE: usize = 1024;

/// Largest modulus accepted anywhere
pub const MAX_KEY_SIZE: usize = 8192;

/// Longest secret [`asym_encrypt`] will wrap
pub const MAX_WRAPPED_SECRET: usize = 64;

/// Which RSA modulus sizes the engine will generate or import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPolicy {
    /// Sizes `generate_key_pair` accepts
    pub allowed_sizes: Vec<usize>,
    /// Floor for imported keys
    pub min_import_size: usize,
}

impl Default for KeyPolicy {
    fn default() -> Self {
        Self {
            allowed_sizes: DEFAULT_KEY_SIZES.to_vec(),
            min_import_size: MIN_IMPORT_KEY_SIZE,
        }
    }
}

impl KeyPolicy {
    /// Check a size requested for generation
    pub fn check_generate(&self, bits: usize) -> Result<()> {
        if bits > MAX_KEY_SIZE || !self.allowed_sizes.contains(&bits) {
            return Err(Error::UnsupportedKeySize(bits));
        }
        Ok(())
    }

    /// Check the size of an imported key
    pub fn check_import(&self, bits: usize) -> Result<()> {
        if bits < self.min_import_size || bits > MAX_KEY_SIZE {
            return Err(Error::UnsupportedKeySize(bits));
        }
        Ok(())
    }
}

/// Generate a fresh RSA key pair
///
/// ## Errors
///
/// `UnsupportedKeySize` if `key_size` is not allowed by `policy`.
pub fn generate_key_pair(key_size: usize, policy: &KeyPolicy) -> Result<(RsaPublicKey, RsaPrivateKey)> {
    policy.check_generate(key_size)?;

    let private_key = RsaPrivateKey::new(&mut OsRng, key_size)
        .map_err(|e| Error::KeyGenerationFailed(e.to_string()))?;
    let public_key = RsaPublicKey::from(&private_key);

    Ok((public_key, private_key))
}

/// Modulus size in bits
pub fn key_size_bits(public_key: &RsaPublicKey) -> usize {
    public_key.size() * 8
}

// ============================================================================
// SESSION KEY WRAPPING
// ============================================================================

/// Wrap a short secret (a session key) for the holder of `public_key`
pub fn asym_encrypt(public_key: &RsaPublicKey, secret: &[u8]) -> Result<Vec<u8>> {
    if secret.len() > MAX_WRAPPED_SECRET {
        return Err(Error::EncryptionFailed(format!(
            "refusing to wrap {} bytes; RSA only wraps session keys",
            secret.len()
        )));
    }

    public_key
        .encrypt(&mut OsRng, Oaep::new::<Sha256>(), secret)
        .map_err(|e| Error::EncryptionFailed(format!("RSA-OAEP: {}", e)))
}

/// Recover a secret wrapped by [`asym_encrypt`]
pub fn asym_decrypt(private_key: &RsaPrivateKey, wrapped: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    private_key
        .decrypt(Oaep::new::<Sha256>(), wrapped)
        .map(Zeroizing::new)
        .map_err(|_| Error::DecryptionFailed("session key could not be unwrapped".into()))
}

// ============================================================================
// SIGNATURES
// ============================================================================

/// SHA-256 digest used by [`sign`] and [`verify`]
pub fn digest(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Sign `data` with PKCS#1 v1.5 over its SHA-256 digest
pub fn sign(private_key: &RsaPrivateKey, data: &[u8]) -> Result<Vec<u8>> {
    private_key
        .sign_with_rng(&mut OsRng, Pkcs1v15Sign::new::<Sha256>(), &digest(data))
        .map_err(|e| Error::Internal(format!("RSA signing failed: {}", e)))
}

/// Verify a signature produced by [`sign`]
///
/// Returns `Ok(false)` for a well-formed signature that does not match.
///
/// ## Errors
///
/// `MalformedSignature` if the signature is not exactly one modulus long.
pub fn verify(public_key: &RsaPublicKey, data: &[u8], signature: &[u8]) -> Result<bool> {
    if signature.len() != public_key.size() {
        return Err(Error::MalformedSignature(format!(
            "expected {} bytes, got {}",
            public_key.size(),
            signature.len()
        )));
    }

    Ok(public_key
        .verify(Pkcs1v15Sign::new::<Sha256>(), &digest(data), signature)
        .is_ok())
}

// ============================================================================
// ENCODINGS
// ============================================================================

/// SubjectPublicKeyInfo DER
pub fn public_key_to_der(public_key: &RsaPublicKey) -> Result<Vec<u8>> {
    public_key
        .to_public_key_der()
        .map(|doc| doc.as_bytes().to_vec())
        .map_err(|e| Error::InvalidKey(format!("cannot encode public key: {}", e)))
}

pub fn public_key_from_der(der: &[u8]) -> Result<RsaPublicKey> {
    RsaPublicKey::from_public_key_der(der)
        .map_err(|e| Error::InvalidKey(format!("invalid public key: {}", e)))
}

/// PEM `PUBLIC KEY` block
pub fn public_key_to_pem(public_key: &RsaPublicKey) -> Result<String> {
    public_key
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| Error::InvalidKey(format!("cannot encode public key: {}", e)))
}

pub fn public_key_from_pem(pem: &str) -> Result<RsaPublicKey> {
    RsaPublicKey::from_public_key_pem(pem)
        .map_err(|e| Error::InvalidKey(format!("invalid public key: {}", e)))
}

/// PKCS#8 DER of the private key, in a buffer that is wiped on drop
pub fn private_key_to_der(private_key: &RsaPrivateKey) -> Result<Zeroizing<Vec<u8>>> {
    private_key
        .to_pkcs8_der()
        .map(|doc| Zeroizing::new(doc.as_bytes().to_vec()))
        .map_err(|e| Error::InvalidKey(format!("cannot encode private key: {}", e)))
}

pub fn private_key_from_der(der: &[u8]) -> Result<RsaPrivateKey> {
    RsaPrivateKey::from_pkcs8_der(der)
        .map_err(|e| Error::InvalidKey(format!("invalid private key: {}", e)))
}
