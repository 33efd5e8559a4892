//! # Error Handling
//!
//! This module provides the error types for PGP Core.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error (top-level)                                                     │
//! │  │                                                                      │
//! │  ├── Codec Errors                                                      │
//! │  │   ├── MalformedArmor        - Bad armor framing or checksum         │
//! │  │   └── CorruptCompressedData - Invalid or oversized zlib stream      │
//! │  │                                                                      │
//! │  ├── Crypto Errors                                                     │
//! │  │   ├── DecryptionFailed      - Tag/padding/unwrap failure            │
//! │  │   ├── EncryptionFailed      - Cipher refused the input              │
//! │  │   ├── IncorrectPassword     - Private key could not be unwrapped    │
//! │  │   ├── UnsupportedKeySize    - RSA modulus size not allowed          │
//! │  │   ├── MalformedSignature    - Signature has the wrong shape         │
//! │  │   ├── SignatureMismatch     - Signature did not verify              │
//! │  │   ├── InvalidKey            - Key bytes of the wrong length/format  │
//! │  │   ├── KeyGenerationFailed   - RSA key generation failed             │
//! │  │   └── KeyDerivationFailed   - KDF rejected its parameters           │
//! │  │                                                                      │
//! │  ├── Pipeline Errors                                                   │
//! │  │   ├── NoSigningKey          - Sign requested without usable key     │
//! │  │   ├── NoRecipientKey        - Encrypt requested without recipient   │
//! │  │   └── MalformedMessage      - Envelope framing is inconsistent      │
//! │  │                                                                      │
//! │  ├── Key Ring Errors                                                   │
//! │  │   ├── DuplicateKeyId        - Key id already present                │
//! │  │   ├── KeyNotFound           - Key id absent                         │
//! │  │   ├── MalformedKeyFile      - Import data could not be parsed       │
//! │  │   ├── DatabaseError         - SQLite failure                        │
//! │  │   └── StorageCorrupted      - Persisted row failed to decode        │
//! │  │                                                                      │
//! │  └── Internal Errors                                                   │
//! │      ├── InvalidRequest        - Caller supplied a bad argument        │
//! │      ├── SerializationError    - serde/bincode failure                 │
//! │      └── Internal              - Should not happen                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every error is terminal for the operation that raised it. Nothing is
//! retried internally and no partial artifact is persisted or returned.

use thiserror::Error;

use crate::crypto::KeyId;

/// Result type alias for PGP Core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for PGP Core
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Codec Errors (100-199)
    // ========================================================================

    /// Armor framing, alphabet or checksum is invalid
    #[error("Malformed armor: {0}")]
    MalformedArmor(String),

    /// Compressed payload could not be inflated
    #[error("Corrupt compressed data: {0}")]
    CorruptCompressedData(String),

    // ========================================================================
    // Crypto Errors (200-299)
    // ========================================================================

    /// Decryption failed
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    /// Encryption failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// The password did not unlock the private key.
    ///
    /// Also returned when the key does not exist, so callers cannot probe
    /// the ring for key ids.
    #[error("Incorrect password")]
    IncorrectPassword,

    /// Requested RSA modulus size is not allowed
    #[error("Unsupported key size: {0} bits")]
    UnsupportedKeySize(usize),

    /// Signature bytes are not a signature for this key size
    #[error("Malformed signature: {0}")]
    MalformedSignature(String),

    /// Signature was well formed but did not verify
    #[error("Signature from key {0} does not match the message")]
    SignatureMismatch(KeyId),

    /// Invalid key format or length
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// RSA key generation failed
    #[error("Key generation failed: {0}")]
    KeyGenerationFailed(String),

    /// Password KDF failed
    #[error("Failed to derive key: {0}")]
    KeyDerivationFailed(String),

    // ========================================================================
    // Pipeline Errors (300-399)
    // ========================================================================

    /// Signing was requested but no usable private key was supplied
    #[error("No usable signing key")]
    NoSigningKey,

    /// Encryption was requested but no recipient public key was supplied
    #[error("No recipient key")]
    NoRecipientKey,

    /// Envelope header and packets disagree or are truncated
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    // ========================================================================
    // Key Ring Errors (400-499)
    // ========================================================================

    /// A record with this key id already exists
    #[error("Key {0} already exists in the key ring")]
    DuplicateKeyId(KeyId),

    /// No record with this key id
    #[error("Key {0} not found")]
    KeyNotFound(KeyId),

    /// Import data is not a recognisable key file
    #[error("Malformed key file: {0}")]
    MalformedKeyFile(String),

    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Data corruption detected
    #[error("Data corruption detected: {0}")]
    StorageCorrupted(String),

    // ========================================================================
    // Internal Errors (900-999)
    // ========================================================================

    /// Caller supplied an invalid argument
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Get the numeric error code
    ///
    /// Error codes are organized by category:
    /// - 100-199: Codec
    /// - 200-299: Crypto
    /// - 300-399: Pipeline
    /// - 400-499: Key ring
    /// - 900-999: Internal
    pub fn code(&self) -> i32 {
        match self {
            // Codec (100-199)
            Error::MalformedArmor(_) => 100,
            Error::CorruptCompressedData(_) => 101,

            // Crypto (200-299)
            Error::DecryptionFailed(_) => 200,
            Error::EncryptionFailed(_) => 201,
            Error::IncorrectPassword => 202,
            Error::UnsupportedKeySize(_) => 203,
            Error::MalformedSignature(_) => 204,
            Error::SignatureMismatch(_) => 205,
            Error::InvalidKey(_) => 206,
            Error::KeyGenerationFailed(_) => 207,
            Error::KeyDerivationFailed(_) => 208,

            // Pipeline (300-399)
            Error::NoSigningKey => 300,
            Error::NoRecipientKey => 301,
            Error::MalformedMessage(_) => 302,

            // Key ring (400-499)
            Error::DuplicateKeyId(_) => 400,
            Error::KeyNotFound(_) => 401,
            Error::MalformedKeyFile(_) => 402,
            Error::DatabaseError(_) => 403,
            Error::StorageCorrupted(_) => 404,

            // Internal (900-999)
            Error::InvalidRequest(_) => 900,
            Error::SerializationError(_) => 901,
            Error::Internal(_) => 902,
        }
    }

    /// Stable name of the error kind, used in API error payloads
    pub fn kind(&self) -> &'static str {
        match self {
            Error::MalformedArmor(_) => "MalformedArmor",
            Error::CorruptCompressedData(_) => "CorruptCompressedData",
            Error::DecryptionFailed(_) => "DecryptionFailed",
            Error::EncryptionFailed(_) => "EncryptionFailed",
            Error::IncorrectPassword => "IncorrectPassword",
            Error::UnsupportedKeySize(_) => "UnsupportedKeySize",
            Error::MalformedSignature(_) => "MalformedSignature",
            Error::SignatureMismatch(_) => "SignatureMismatch",
            Error::InvalidKey(_) => "InvalidKey",
            Error::KeyGenerationFailed(_) => "KeyGenerationFailed",
            Error::KeyDerivationFailed(_) => "KeyDerivationFailed",
            Error::NoSigningKey => "NoSigningKey",
            Error::NoRecipientKey => "NoRecipientKey",
            Error::MalformedMessage(_) => "MalformedMessage",
            Error::DuplicateKeyId(_) => "DuplicateKeyId",
            Error::KeyNotFound(_) => "KeyNotFound",
            Error::MalformedKeyFile(_) => "MalformedKeyFile",
            Error::DatabaseError(_) => "DatabaseError",
            Error::StorageCorrupted(_) => "StorageCorrupted",
            Error::InvalidRequest(_) => "InvalidRequest",
            Error::SerializationError(_) => "SerializationError",
            Error::Internal(_) => "Internal",
        }
    }

    /// Check if this error requires user action
    ///
    /// These are the errors a person can fix by re-entering a password,
    /// choosing a different key or supplying different input.
    pub fn requires_user_action(&self) -> bool {
        matches!(
            self,
            Error::IncorrectPassword
                | Error::NoSigningKey
                | Error::NoRecipientKey
                | Error::UnsupportedKeySize(_)
                | Error::DuplicateKeyId(_)
                | Error::KeyNotFound(_)
                | Error::MalformedKeyFile(_)
                | Error::InvalidRequest(_)
        )
    }
}

// ============================================================================
// ERROR CONVERSIONS
// ============================================================================

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Internal(format!("I/O error: {}", err))
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Internal(format!("Blocking task failed: {}", err))
    }
}

// ============================================================================
// TESTS
// ============================================================================
