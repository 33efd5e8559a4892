//! # Cryptography Module
//!
//! All cryptographic primitives used by PGP Core.
//!
//! ## Security Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    CRYPTOGRAPHIC ARCHITECTURE                           │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    KEY HIERARCHY                                │   │
//! │  ├─────────────────────────────────────────────────────────────────┤   │
//! │  │                                                                 │   │
//! │  │  Password + salt ──Argon2id──► wrapping key                    │   │
//! │  │                                     │                           │   │
//! │  │                                     ▼ AES-256-GCM               │   │
//! │  │  ┌─────────────────────────────────────────────────────────┐   │   │
//! │  │  │        RSA private key (PKCS#8, stored wrapped)         │   │   │
//! │  │  └─────────────────────────────────────────────────────────┘   │   │
//! │  │            │                           │                       │   │
//! │  │            ▼                           ▼                       │   │
//! │  │  ┌─────────────────┐         ┌─────────────────┐              │   │
//! │  │  │  Signing        │         │ Unwrapping      │              │   │
//! │  │  │  PKCS#1 v1.5    │         │ RSA-OAEP        │              │   │
//! │  │  │  SHA-256        │         │ session keys    │              │   │
//! │  │  └─────────────────┘         └─────────────────┘              │   │
//! │  │                                                                 │   │
//! │  │  Public key ──SHA-256──► fingerprint ──low 64 bits──► key id   │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 PAYLOAD ENCRYPTION                              │   │
//! │  ├─────────────────────────────────────────────────────────────────┤   │
//! │  │                                                                 │   │
//! │  │  One random session key per message:                           │   │
//! │  │  • AES-128-GCM (default) or AES-256-GCM                        │   │
//! │  │  • 3DES-CBC with HMAC-SHA256 (legacy interop)                  │   │
//! │  │                                                                 │   │
//! │  │  Session key travels RSA-OAEP wrapped for the recipient.       │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Algorithm Choices
//!
//! | Algorithm | Purpose |
//! |-----------|---------|
//! | RSA 2048-4096 | Key pairs, session-key wrapping, signatures |
//! | AES-GCM | Payload and private-key encryption |
//! | 3DES + HMAC | Legacy payload cipher |
//! | SHA-256 | Digests, fingerprints |
//! | Argon2id | Password KDF |
//!
//! ## Security Considerations
//!
//! 1. **Key Zeroization**: session keys, derived keys and private-key DER are
//!    wiped when dropped
//! 2. **Secure Random**: `rand::rngs::OsRng` for every nonce, salt and key
//! 3. **No Key Reuse**: unique nonce per encryption, fresh session key per
//!    message

mod asymmetric;
mod fingerprint;
mod kdf;
mod protection;
mod symmetric;

pub use asymmetric::{
    asym_decrypt, asym_encrypt, digest, generate_key_pair, key_size_bits, private_key_from_der,
    private_key_to_der, public_key_from_der, public_key_from_pem, public_key_to_der,
    public_key_to_pem, sign, verify, KeyPolicy, DEFAULT_KEY_SIZES, MAX_WRAPPED_SECRET,
};
pub use fingerprint::{Fingerprint, KeyId};
pub use kdf::{
    derive_key, generate_salt, KdfParams, MAX_ITERATIONS, MAX_MEMORY_KIB, MAX_PARALLELISM, SALT_SIZE,
};
pub use protection::{dummy_unwrap, unwrap_private_key, wrap_private_key, WrappedPrivateKey};
pub use symmetric::{sym_decrypt, sym_encrypt, SessionKey, SymmetricAlgorithm};

pub use rsa::{RsaPrivateKey, RsaPublicKey};

/// Shared RSA fixtures; generating 2048-bit keys per test is too slow.
#[cfg(test)]
pub(crate) mod test_keys {
    use once_cell::sync::Lazy;
    use rand::rngs::OsRng;
    use rsa::RsaPrivateKey;

    use super::KdfParams;

    pub static ALICE: Lazy<RsaPrivateKey> =
        Lazy::new(|| RsaPrivateKey::new(&mut OsRng, 2048).expect("generate Alice"));

    pub static BOB: Lazy<RsaPrivateKey> =
        Lazy::new(|| RsaPrivateKey::new(&mut OsRng, 2048).expect("generate Bob"));

    /// Cheap Argon2 settings for tests
    pub const TEST_KDF: KdfParams = KdfParams {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    };
}
