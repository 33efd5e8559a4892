//! # Key Ring Schema
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         KEY RING SCHEMA                                 │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────┐              ┌─────────────────────┐              │
//! │  │   public_ring   │              │    private_ring     │              │
//! │  ├─────────────────┤              ├─────────────────────┤              │
//! │  │ key_id (PK)     │◄────────────►│ key_id (PK)         │              │
//! │  │ name            │  same id in  │ name                │              │
//! │  │ user_id         │  both tables │ user_id             │              │
//! │  │ email           │  for owned   │ email               │              │
//! │  │ created_at      │  key pairs   │ created_at          │              │
//! │  │ key_size        │              │ key_size            │              │
//! │  │ public_key      │              │ public_key          │              │
//! │  └─────────────────┘              │ wrap_salt           │              │
//! │                                   │ wrap_nonce          │              │
//! │                                   │ wrap_ciphertext     │              │
//! │                                   │ kdf_memory_kib      │              │
//! │                                   │ kdf_iterations      │              │
//! │                                   │ kdf_parallelism     │              │
//! │                                   └─────────────────────┘              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// SQL to create all tables
pub const CREATE_TABLES: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY
);

-- Public ring
-- Third-party keys plus the public half of every owned key pair
CREATE TABLE IF NOT EXISTS public_ring (
    -- 16 hex digits, low 64 bits of the SHA-256 fingerprint
    key_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    user_id TEXT NOT NULL,
    email TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    key_size INTEGER NOT NULL,
    -- SubjectPublicKeyInfo DER
    public_key BLOB NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_public_ring_user_id ON public_ring(user_id);

-- Private ring
-- Owned key pairs; the private key is stored wrapped, never in plaintext
CREATE TABLE IF NOT EXISTS private_ring (
    key_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    user_id TEXT NOT NULL,
    email TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    key_size INTEGER NOT NULL,
    public_key BLOB NOT NULL,
    -- Argon2id salt and AES-256-GCM nonce/ciphertext of the PKCS#8 key
    wrap_salt BLOB NOT NULL,
    wrap_nonce BLOB NOT NULL,
    wrap_ciphertext BLOB NOT NULL,
    kdf_memory_kib INTEGER NOT NULL,
    kdf_iterations INTEGER NOT NULL,
    kdf_parallelism INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_private_ring_user_id ON private_ring(user_id);
"#;
