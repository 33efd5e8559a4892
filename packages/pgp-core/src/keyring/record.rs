//! Key ring records.

use rsa::RsaPublicKey;
use serde::{Deserialize, Serialize};

use crate::crypto::{key_size_bits, public_key_from_der, public_key_to_der, KeyId, WrappedPrivateKey};
use crate::error::Result;

/// One key in the ring: always a public key, optionally its wrapped private
/// half
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRecord {
    /// Derived from the public key; never caller-supplied
    pub key_id: KeyId,
    pub name: String,
    pub user_id: String,
    pub email: String,
    /// Unix seconds
    pub created_at: i64,
    /// Modulus size in bits
    pub key_size: usize,
    /// SubjectPublicKeyInfo DER
    pub public_key: Vec<u8>,
    /// Present only for records in the private ring
    pub private_key: Option<WrappedPrivateKey>,
}

impl KeyRecord {
    /// Build a public-only record
    pub fn new_public(
        public_key: &RsaPublicKey,
        name: impl Into<String>,
        user_id: impl Into<String>,
        email: impl Into<String>,
        created_at: i64,
    ) -> Result<Self> {
        let der = public_key_to_der(public_key)?;
        Ok(Self {
            key_id: KeyId::of(public_key)?,
            name: name.into(),
            user_id: user_id.into(),
            email: email.into(),
            created_at,
            key_size: key_size_bits(public_key),
            public_key: der,
            private_key: None,
        })
    }

    /// Attach a wrapped private key
    pub fn with_private_key(mut self, wrapped: WrappedPrivateKey) -> Self {
        self.private_key = Some(wrapped);
        self
    }

    pub fn has_private_key(&self) -> bool {
        self.private_key.is_some()
    }

    /// Decode the stored public key
    pub fn decode_public_key(&self) -> Result<RsaPublicKey> {
        public_key_from_der(&self.public_key)
    }

    /// The copy of this record that belongs in the public ring
    pub fn public_part(&self) -> Self {
        Self {
            private_key: None,
            ..self.clone()
        }
    }
}

/// Changes to a record's display metadata
///
/// `None` leaves a field untouched. Identity fields cannot be changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataUpdate {
    pub name: Option<String>,
    pub user_id: Option<String>,
    pub email: Option<String>,
}

impl MetadataUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.user_id.is_none() && self.email.is_none()
    }

    pub(crate) fn apply(&self, record: &mut KeyRecord) {
        if let Some(name) = &self.name {
            record.name = name.clone();
        }
        if let Some(user_id) = &self.user_id {
            record.user_id = user_id.clone();
        }
        if let Some(email) = &self.email {
            record.email = email.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::test_keys::ALICE;

    #[test]
    fn test_new_public_derives_identity() {
        let public_key = ALICE.to_public_key();
        let record = KeyRecord::new_public(&public_key, "Alice", "alice@x", "alice@x", 10).unwrap();

        assert_eq!(record.key_id, KeyId::of(&public_key).unwrap());
        assert_eq!(record.key_size, 2048);
        assert!(!record.has_private_key());
        assert_eq!(record.decode_public_key().unwrap(), public_key);
    }

    #[test]
    fn test_metadata_update() {
        let public_key = ALICE.to_public_key();
        let mut record = KeyRecord::new_public(&public_key, "Alice", "a", "a@x", 10).unwrap();
        let update = MetadataUpdate {
            name: Some("Alice Liddell".into()),
            ..Default::default()
        };
        assert!(!update.is_empty());
        update.apply(&mut record);

        assert_eq!(record.name, "Alice Liddell");
        assert_eq!(record.user_id, "a");
        assert!(MetadataUpdate::default().is_empty());
    }
}
