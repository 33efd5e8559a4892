//! # Private-Key Protection
//!
//! Private keys are only ever persisted or exported in wrapped form.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      PRIVATE KEY WRAPPING                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  password ──┐                                                          │
//! │             ├── Argon2id(params) ──► wrapping key (32 B)               │
//! │  salt (16) ─┘                             │                             │
//! │                                           ▼                             │
//! │  PKCS#8 DER ─────────────► AES-256-GCM(nonce, aad = domain tag)        │
//! │                                           │                             │
//! │                                           ▼                             │
//! │  WrappedPrivateKey { salt, nonce, ciphertext, kdf params }             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Security
//!
//! | Concern | Handling |
//! |---------|----------|
//! | Offline guessing | Argon2id with stored, tunable cost |
//! | Error oracle | Every unwrap failure is `IncorrectPassword` |
//! | Probing for key ids | [`dummy_unwrap`] costs the same as a real attempt |
//! | Plaintext residue | DER and derived keys live in zeroizing buffers |

use std::fmt;

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce as AesNonce,
};
use rand::RngCore;
use rsa::RsaPrivateKey;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::asymmetric::{private_key_from_der, private_key_to_der};
use super::kdf::{derive_key, generate_salt, KdfParams, SALT_SIZE};
use super::symmetric::NONCE_SIZE;
use crate::error::{Error, Result};

/// Associated data binding the ciphertext to its purpose
const WRAP_AAD: &[u8] = b"pgp-core-private-key-v1";

/// A private key encrypted under a password-derived key
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedPrivateKey {
    pub salt: [u8; SALT_SIZE],
    pub nonce: [u8; NONCE_SIZE],
    pub ciphertext: Vec<u8>,
    pub kdf: KdfParams,
}

impl fmt::Debug for WrappedPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrappedPrivateKey")
            .field("ciphertext_len", &self.ciphertext.len())
            .field("kdf", &self.kdf)
            .finish_non_exhaustive()
    }
}

/// Encrypt `private_key` under a key derived from `password`
///
/// A fresh salt and nonce are drawn on every call, so wrapping the same key
/// twice yields unrelated ciphertexts.
pub fn wrap_private_key(
    private_key: &RsaPrivateKey,
    password: &str,
    params: &KdfParams,
) -> Result<WrappedPrivateKey> {
    let der = private_key_to_der(private_key)?;

    let salt = generate_salt();
    let wrapping_key = derive_key(password.as_bytes(), &salt, params)?;

    let mut nonce = [0u8; NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut nonce);

    let cipher = Aes256Gcm::new_from_slice(&wrapping_key[..])
        .map_err(|e| Error::EncryptionFailed(format!("Invalid key: {}", e)))?;
    let ciphertext = cipher
        .encrypt(
            AesNonce::from_slice(&nonce),
            Payload {
                msg: der.as_slice(),
                aad: WRAP_AAD,
            },
        )
        .map_err(|e| Error::EncryptionFailed(format!("Private key wrapping failed: {}", e)))?;

    Ok(WrappedPrivateKey {
        salt,
        nonce,
        ciphertext,
        kdf: *params,
    })
}

/// Recover the private key from its wrapped form
///
/// ## Errors
///
/// `IncorrectPassword` for any failure: wrong password, tampered
/// ciphertext, unusable stored parameters or undecodable key material.
pub fn unwrap_private_key(wrapped: &WrappedPrivateKey, password: &str) -> Result<RsaPrivateKey> {
    let wrapping_key = derive_key(password.as_bytes(), &wrapped.salt, &wrapped.kdf).map_err(|e| {
        tracing::warn!("Stored KDF parameters rejected: {}", e);
        Error::IncorrectPassword
    })?;

    let cipher =
        Aes256Gcm::new_from_slice(&wrapping_key[..]).map_err(|_| Error::IncorrectPassword)?;
    let der = cipher
        .decrypt(
            AesNonce::from_slice(&wrapped.nonce),
            Payload {
                msg: wrapped.ciphertext.as_slice(),
                aad: WRAP_AAD,
            },
        )
        .map(Zeroizing::new)
        .map_err(|_| Error::IncorrectPassword)?;

    private_key_from_der(&der).map_err(|_| Error::IncorrectPassword)
}

/// Spend one KDF evaluation without unwrapping anything
///
/// Used when the requested key does not exist, so that the failure takes as
/// long as a wrong password would.
pub fn dummy_unwrap(password: &str, params: &KdfParams) {
    let salt = generate_salt();
    let _ = derive_key(password.as_bytes(), &salt, params);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::test_keys::{ALICE, TEST_KDF};

    #[test]
    fn test_wrap_unwrap_round_trip() {
        let wrapped = wrap_private_key(&ALICE, "correct horse", &TEST_KDF).unwrap();
        let restored = unwrap_private_key(&wrapped, "correct horse").unwrap();
        assert_eq!(restored.to_public_key(), ALICE.to_public_key());
    }

    #[test]
    fn test_wrong_password() {
        let wrapped = wrap_private_key(&ALICE, "correct horse", &TEST_KDF).unwrap();
        assert!(matches!(
            unwrap_private_key(&wrapped, "battery staple"),
            Err(Error::IncorrectPassword)
        ));
        assert!(matches!(
            unwrap_private_key(&wrapped, ""),
            Err(Error::IncorrectPassword)
        ));
    }

    #[test]
    fn test_tampered_ciphertext_reads_as_wrong_password() {
        let mut wrapped = wrap_private_key(&ALICE, "pw", &TEST_KDF).unwrap();
        wrapped.ciphertext[0] ^= 0x01;
        assert!(matches!(
            unwrap_private_key(&wrapped, "pw"),
            Err(Error::IncorrectPassword)
        ));
    }

    #[test]
    fn test_bad_stored_params_read_as_wrong_password() {
        let mut wrapped = wrap_private_key(&ALICE, "pw", &TEST_KDF).unwrap();
        wrapped.kdf.iterations = 0;
        assert!(matches!(
            unwrap_private_key(&wrapped, "pw"),
            Err(Error::IncorrectPassword)
        ));
    }

    #[test]
    fn test_fresh_salt_each_wrap() {
        let a = wrap_private_key(&ALICE, "pw", &TEST_KDF).unwrap();
        let b = wrap_private_key(&ALICE, "pw", &TEST_KDF).unwrap();
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn test_debug_hides_material() {
        let wrapped = wrap_private_key(&ALICE, "pw", &TEST_KDF).unwrap();
        let shown = format!("{:?}", wrapped);
        assert!(shown.contains("ciphertext_len"));
        assert!(!shown.contains("salt"));
    }
}
