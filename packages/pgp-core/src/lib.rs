//! # PGP Core
//!
//! An OpenPGP-style key ring and message processing engine: RSA key pairs
//! protected by passwords at rest, hybrid encryption, signatures,
//! compression and radix-64 armor.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           PGP CORE                                      │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                        API LAYER                                │   │
//! │  │   ApiDispatcher: JSON method router (encr_api, export_*, ...)   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                  │                                      │
//! │                                  ▼                                      │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                       PgpService                                │   │
//! │  │   resolves key ids + passwords, drives pipeline and transfer    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │            │                     │                     │               │
//! │            ▼                     ▼                     ▼               │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Key Ring     │   │    Message      │   │    Transfer     │       │
//! │  │ SQLite + index  │   │ seal / open     │   │ import / export │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │            │                     │                     │               │
//! │            ▼                     ▼                     ▼               │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Crypto + Codec primitives                       │   │
//! │  │   RSA · AES-GCM · 3DES · Argon2id · zlib · radix-64             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error types for the entire library
//! - [`codec`] - Radix-64 armor and zlib compression
//! - [`crypto`] - RSA, symmetric ciphers, password KDF, key wrapping
//! - [`keyring`] - Durable private and public key rings
//! - [`message`] - Envelope framing and the seal/open pipeline
//! - [`transfer`] - Key import and export formats
//! - [`service`] - One operation per API endpoint
//! - [`api`] - JSON dispatcher over the service
//!
//! ## Security Model
//!
//! | Asset | Protection |
//! |-------|------------|
//! | Private keys at rest | Argon2id + AES-256-GCM, never stored in plaintext |
//! | Private keys in use | Unwrapped per call, zeroized on drop |
//! | Message payloads | Fresh session key per message, RSA-OAEP wrapped |
//! | Password probing | Missing keys and wrong passwords fail identically |

#![cfg_attr(docsrs, feature(doc_cfg))]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod api;
pub mod codec;
pub mod crypto;
pub mod error;
pub mod keyring;
pub mod message;
pub mod service;
/// Wall-clock helpers.
pub mod time;
pub mod transfer;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use api::ApiDispatcher;
pub use crypto::{KdfParams, KeyId, KeyPolicy, SymmetricAlgorithm};
pub use error::{Error, Result};
pub use keyring::{KeyRecord, KeyRing, MetadataUpdate};
pub use message::{OpenedMessage, SignatureCheck};
pub use service::{EncryptRequest, PgpService};

// ============================================================================
// CONFIGURATION
// ============================================================================

use std::path::PathBuf;

/// Configuration for a [`PgpService`]
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Key ring database file (in memory if None)
    pub database_path: Option<PathBuf>,
    /// RSA sizes allowed for generation and import
    pub key_policy: KeyPolicy,
    /// Argon2id cost for wrapping private keys
    pub kdf: KdfParams,
    /// Cipher used when a request does not name one
    pub default_cipher: SymmetricAlgorithm,
    /// Largest payload accepted when opening a message
    pub max_message_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            key_policy: KeyPolicy::default(),
            kdf: KdfParams::default(),
            default_cipher: SymmetricAlgorithm::default(),
            max_message_size: codec::DEFAULT_DECOMPRESS_LIMIT,
        }
    }
}

// ============================================================================
// VERSION INFO
// ============================================================================

/// Returns the version of PGP Core
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Returns build information for debugging
pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        profile: if cfg!(debug_assertions) {
            "debug"
        } else {
            "release"
        },
    }
}

/// Build information for debugging
#[derive(Debug, Clone)]
pub struct BuildInfo {
    /// Crate version
    pub version: &'static str,
    /// Build profile (debug/release)
    pub profile: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
        assert_eq!(build_info().version, version());
    }

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert!(config.database_path.is_none());
        assert_eq!(config.default_cipher, SymmetricAlgorithm::Aes128);
        assert_eq!(config.key_policy.allowed_sizes, vec![2048, 3072, 4096]);
        assert!(config.max_message_size > 0);
    }
}
