//! # PGP Service
//!
//! One method per API endpoint. The service resolves key ids and passwords
//! against the key ring, then hands borrowed key material to the message
//! pipeline or the transfer serializer.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         REQUEST FLOW                                    │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  request ──► PgpService ──► KeyRing lookup                             │
//! │                   │               │                                     │
//! │                   │               ▼                                     │
//! │                   │         unwrap private key (password)              │
//! │                   │               │                                     │
//! │                   ▼               ▼                                     │
//! │             seal / open / export / import                              │
//! │                   │                                                     │
//! │                   ▼                                                     │
//! │             bytes or record ──► caller                                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Unwrapped private keys live only for the duration of one call.

use std::sync::Arc;

use rsa::RsaPrivateKey;

use crate::crypto::{
    dummy_unwrap, generate_key_pair, unwrap_private_key, wrap_private_key, KeyId, SymmetricAlgorithm,
};
use crate::error::{Error, Result};
use crate::keyring::{KeyRecord, KeyRing, MetadataUpdate};
use crate::message::{
    open, read_envelope, seal, OpenKeys, OpenOptions, OpenedMessage, PrivateKeyRef, PublicKeyRef,
    SealKeys, SealOptions,
};
use crate::time::now_timestamp;
use crate::transfer::{self, ImportMetadata};
use crate::EngineConfig;

/// Parameters of an `encr_api` call
#[derive(Clone, Default)]
pub struct EncryptRequest {
    pub data: Vec<u8>,
    pub file_name: String,
    pub encrypt: bool,
    pub sign: bool,
    pub compress: bool,
    /// Armor the output
    pub radix64: bool,
    /// Falls back to the configured default cipher
    pub cipher: Option<SymmetricAlgorithm>,
    pub private_key_id: Option<KeyId>,
    pub private_key_password: Option<String>,
    pub public_key_id: Option<KeyId>,
}

/// Key ring operations and message processing
#[derive(Clone)]
pub struct PgpService {
    ring: Arc<KeyRing>,
    config: EngineConfig,
}

impl PgpService {
    /// Create a service over an existing key ring
    pub fn new(ring: Arc<KeyRing>, config: EngineConfig) -> Self {
        Self { ring, config }
    }

    /// Open the key ring named by `config` (in memory when no path is set)
    pub fn open(config: EngineConfig) -> Result<Self> {
        config.kdf.validate()?;
        let ring = match &config.database_path {
            Some(path) => KeyRing::open(path)?,
            None => KeyRing::open_in_memory()?,
        };
        Ok(Self::new(Arc::new(ring), config))
    }

    pub fn ring(&self) -> &Arc<KeyRing> {
        &self.ring
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ========================================================================
    // KEY MANAGEMENT
    // ========================================================================

    /// Generate a key pair and store it in both rings
    ///
    /// The email doubles as the user id.
    pub fn generate_key_pair(
        &self,
        name: &str,
        email: &str,
        password: &str,
        key_size: usize,
    ) -> Result<KeyRecord> {
        if password.is_empty() {
            return Err(Error::InvalidRequest("password must not be empty".into()));
        }
        if name.trim().is_empty() || email.trim().is_empty() {
            return Err(Error::InvalidRequest("name and email are required".into()));
        }

        tracing::info!("Generating {}-bit key pair for {}", key_size, email);
        let (public_key, private_key) = generate_key_pair(key_size, &self.config.key_policy)?;
        let wrapped = wrap_private_key(&private_key, password, &self.config.kdf)?;

        let record = KeyRecord::new_public(&public_key, name, email, email, now_timestamp())?
            .with_private_key(wrapped);
        self.ring.insert(record.clone())?;

        tracing::info!("Generated key {}", record.key_id);
        Ok(record)
    }

    /// Owned key pairs (wrapped private keys included, never plaintext)
    pub fn list_private_key_ring(&self) -> Vec<KeyRecord> {
        self.ring.list_private()
    }

    pub fn list_public_key_ring(&self) -> Vec<KeyRecord> {
        self.ring.list_public()
    }

    /// Check that `password` unlocks the private key
    ///
    /// Reports `IncorrectPassword` both for a wrong password and for a key
    /// id that is not in the private ring.
    pub fn check_private_key(&self, key_id: KeyId, password: &str) -> Result<()> {
        self.unlock(key_id, password).map(|_| ())
    }

    pub fn remove_key(&self, key_id: KeyId) -> Result<KeyRecord> {
        self.ring.remove(key_id)
    }

    pub fn update_metadata(&self, key_id: KeyId, update: &MetadataUpdate) -> Result<KeyRecord> {
        self.ring.update_metadata(key_id, update)
    }

    pub fn find_by_user_id(&self, user_id: &str) -> Vec<KeyRecord> {
        self.ring.find_by_user_id(user_id)
    }

    pub fn find_by_name(&self, name: &str) -> Vec<KeyRecord> {
        self.ring.find_by_name(name)
    }

    // ========================================================================
    // IMPORT / EXPORT
    // ========================================================================

    /// Import someone else's public key into the public ring
    pub fn import_public_key(&self, bytes: &[u8], user_id: &str, name: &str) -> Result<KeyRecord> {
        let metadata = ImportMetadata {
            name: name.to_string(),
            user_id: user_id.to_string(),
            email: user_id.to_string(),
            created_at: now_timestamp(),
        };
        let record = transfer::import_public(bytes, metadata, &self.config.key_policy)?;
        self.ring.insert(record.clone())?;
        Ok(record)
    }

    /// Import an exported key pair, keeping it protected by `password`
    pub fn import_key_pair(
        &self,
        bytes: &[u8],
        password: &str,
        user_id: &str,
        name: &str,
    ) -> Result<KeyRecord> {
        let metadata = ImportMetadata {
            name: name.to_string(),
            user_id: user_id.to_string(),
            email: user_id.to_string(),
            created_at: now_timestamp(),
        };
        let record = transfer::import_key_pair(
            bytes,
            password,
            metadata,
            &self.config.kdf,
            &self.config.key_policy,
        )?;
        self.ring.insert(record.clone())?;
        Ok(record)
    }

    /// PEM encoding of a public key from either ring
    pub fn export_public_key(&self, key_id: KeyId) -> Result<String> {
        let record = self.ring.lookup(key_id).ok_or(Error::KeyNotFound(key_id))?;
        transfer::export_public(&record)
    }

    /// Armored key-pair block
    ///
    /// `export_password` protects the exported copy; when `None` the ring
    /// password is reused.
    pub fn export_key_pair(
        &self,
        key_id: KeyId,
        password: &str,
        export_password: Option<&str>,
    ) -> Result<String> {
        let Some(record) = self.ring.lookup_private(key_id) else {
            dummy_unwrap(password, &self.config.kdf);
            return Err(Error::IncorrectPassword);
        };
        let export_password = export_password.unwrap_or(password);
        if export_password.is_empty() {
            return Err(Error::InvalidRequest("export password must not be empty".into()));
        }

        tracing::info!("Exporting key pair {}", key_id);
        transfer::export_key_pair(&record, password, export_password, &self.config.kdf)
    }

    // ========================================================================
    // MESSAGES
    // ========================================================================

    /// Run the seal pipeline for an `encr_api` request
    ///
    /// ## Errors
    ///
    /// - `NoSigningKey` if signing was requested and the key is missing or
    ///   the password does not unlock it
    /// - `NoRecipientKey` if encryption was requested and the recipient is
    ///   not in the public ring
    pub fn encrypt_message(&self, request: &EncryptRequest) -> Result<Vec<u8>> {
        let signer = if request.sign {
            Some(self.signing_key(request)?)
        } else {
            None
        };

        let recipient = if request.encrypt {
            let key_id = request.public_key_id.ok_or(Error::NoRecipientKey)?;
            let record = self
                .ring
                .lookup_public(key_id)
                .ok_or(Error::NoRecipientKey)?;
            Some((key_id, record.decode_public_key()?))
        } else {
            None
        };

        let options = SealOptions {
            encrypt: request.encrypt,
            sign: request.sign,
            compress: request.compress,
            armor: request.radix64,
            cipher: request.cipher.unwrap_or(self.config.default_cipher),
            file_name: request.file_name.clone(),
            timestamp: now_timestamp(),
        };
        let keys = SealKeys {
            signer: signer
                .as_ref()
                .map(|(key_id, key)| PrivateKeyRef { key_id: *key_id, key }),
            recipient: recipient
                .as_ref()
                .map(|(key_id, key)| PublicKeyRef { key_id: *key_id, key }),
        };

        tracing::info!(
            "encr_api: encrypt={} sign={} compress={} radix64={}",
            options.encrypt,
            options.sign,
            options.compress,
            options.armor
        );
        seal(&request.data, &options, &keys)
    }

    fn signing_key(&self, request: &EncryptRequest) -> Result<(KeyId, RsaPrivateKey)> {
        let key_id = request.private_key_id.ok_or(Error::NoSigningKey)?;
        let password = request
            .private_key_password
            .as_deref()
            .ok_or(Error::NoSigningKey)?;

        match self.unlock(key_id, password) {
            Ok(key) => Ok((key_id, key)),
            Err(Error::IncorrectPassword) => Err(Error::NoSigningKey),
            Err(e) => Err(e),
        }
    }

    /// Run the open pipeline on raw or armored input
    ///
    /// `password` unlocks the recipient's private key and is ignored for
    /// messages that are not encrypted. Signatures are checked against the
    /// public ring.
    ///
    /// ## Errors
    ///
    /// `IncorrectPassword` if the message is for a key not in the private
    /// ring or the password does not unlock it. The two cases cost the same
    /// and are indistinguishable to the caller.
    pub fn decrypt_message(&self, data: &[u8], password: &str) -> Result<OpenedMessage> {
        let envelope = read_envelope(data)?;

        let recipient = match envelope.recipient() {
            Some(key_id) => Some((key_id, self.unlock(key_id, password)?)),
            None => None,
        };

        let keys = OpenKeys {
            recipient: recipient
                .as_ref()
                .map(|(key_id, key)| PrivateKeyRef { key_id: *key_id, key }),
            verifiers: &*self.ring,
        };
        let options = OpenOptions {
            max_message_size: self.config.max_message_size,
        };

        let opened = open(&envelope, &keys, &options)?;
        tracing::info!(
            "Opened message: {} bytes, encrypted={} signed={}",
            opened.data.len(),
            opened.flags.encrypted,
            opened.flags.signed
        );
        Ok(opened)
    }

    /// Unwrap a private key from the private ring
    ///
    /// A missing key costs one KDF evaluation and reads as a wrong password.
    fn unlock(&self, key_id: KeyId, password: &str) -> Result<RsaPrivateKey> {
        let wrapped = self
            .ring
            .lookup_private(key_id)
            .and_then(|record| record.private_key);

        match wrapped {
            Some(wrapped) => unwrap_private_key(&wrapped, password).map_err(|e| {
                tracing::warn!("Rejected password for key {}", key_id);
                e
            }),
            None => {
                dummy_unwrap(password, &self.config.kdf);
                tracing::warn!("Rejected password for key {}", key_id);
                Err(Error::IncorrectPassword)
            }
        }
    }

    // ========================================================================
    // ASYNC WRAPPERS
    // ========================================================================

    /// [`Self::generate_key_pair`] on the blocking pool
    pub async fn generate_key_pair_async(
        &self,
        name: String,
        email: String,
        password: String,
        key_size: usize,
    ) -> Result<KeyRecord> {
        let service = self.clone();
        tokio::task::spawn_blocking(move || {
            service.generate_key_pair(&name, &email, &password, key_size)
        })
        .await?
    }

    /// [`Self::encrypt_message`] on the blocking pool
    pub async fn encrypt_message_async(&self, request: EncryptRequest) -> Result<Vec<u8>> {
        let service = self.clone();
        tokio::task::spawn_blocking(move || service.encrypt_message(&request)).await?
    }

    /// [`Self::decrypt_message`] on the blocking pool
    pub async fn decrypt_message_async(&self, data: Vec<u8>, password: String) -> Result<OpenedMessage> {
        let service = self.clone();
        tokio::task::spawn_blocking(move || service.decrypt_message(&data, &password)).await?
    }
}
