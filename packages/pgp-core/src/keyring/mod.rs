//! # Key Ring
//!
//! The only cross-request mutable state in the engine.
//!
//! ## Partitions
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            KEY RING                                     │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │   generate / import pair ────────┬──────────────────┐                  │
//! │                                  ▼                  ▼                  │
//! │                        ┌──────────────────┐ ┌──────────────────┐       │
//! │                        │   PRIVATE RING   │ │   PUBLIC RING    │       │
//! │                        │ public + wrapped │ │ public only      │       │
//! │                        │ private key      │ │                  │       │
//! │                        └──────────────────┘ └──────────────────┘       │
//! │                                                     ▲                  │
//! │   import public ────────────────────────────────────┘                  │
//! │                                                                         │
//! │   remove(id) ──► both partitions, one transaction                      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//!
//! Reads take a shared lock on the in-memory index and never touch SQLite.
//! Writes take the exclusive lock, commit to SQLite, then update the index,
//! so a reader never observes a half-applied mutation and a crash between
//! the two steps leaves storage authoritative.

mod record;
mod schema;
mod store;

pub use record::{KeyRecord, MetadataUpdate};

use std::collections::HashMap;
use std::path::Path;

use parking_lot::RwLock;
use rsa::RsaPublicKey;

use crate::crypto::KeyId;
use crate::error::{Error, Result};
use crate::message::PublicKeyLookup;
use store::RingStore;

#[derive(Default)]
struct RingIndex {
    private: HashMap<KeyId, KeyRecord>,
    public: HashMap<KeyId, KeyRecord>,
}

/// Durable, concurrently readable store of key records
pub struct KeyRing {
    store: RingStore,
    index: RwLock<RingIndex>,
}

impl KeyRing {
    /// Open (or create) a key ring backed by the SQLite file at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let ring = Self::with_store(RingStore::open(Some(path))?)?;
        tracing::info!(
            "Key ring opened at {}: {} private, {} public",
            path.display(),
            ring.index.read().private.len(),
            ring.index.read().public.len()
        );
        Ok(ring)
    }

    /// A key ring that lives only as long as this value
    pub fn open_in_memory() -> Result<Self> {
        Self::with_store(RingStore::open(None)?)
    }

    fn with_store(store: RingStore) -> Result<Self> {
        let (private, public) = store.load()?;

        let mut index = RingIndex::default();
        for record in private {
            index.private.insert(record.key_id, record);
        }
        for record in public {
            index.public.insert(record.key_id, record);
        }

        Ok(Self {
            store,
            index: RwLock::new(index),
        })
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    /// Add a record
    ///
    /// Records with a wrapped private key land in the private ring and their
    /// public copy in the public ring; public-only records land in the public
    /// ring.
    ///
    /// ## Errors
    ///
    /// `DuplicateKeyId` if the key id is already in either ring.
    pub fn insert(&self, record: KeyRecord) -> Result<()> {
        let mut index = self.index.write();
        let key_id = record.key_id;

        if index.private.contains_key(&key_id) || index.public.contains_key(&key_id) {
            return Err(Error::DuplicateKeyId(key_id));
        }

        self.store.insert(&record)?;

        if record.has_private_key() {
            index.public.insert(key_id, record.public_part());
            index.private.insert(key_id, record);
            tracing::info!("Key pair {} added to private and public rings", key_id);
        } else {
            index.public.insert(key_id, record);
            tracing::info!("Public key {} added to public ring", key_id);
        }

        Ok(())
    }

    /// Remove a key from both rings atomically
    ///
    /// Returns the removed record (the private-ring version when there was
    /// one).
    ///
    /// ## Errors
    ///
    /// `KeyNotFound` if the key id is in neither ring.
    pub fn remove(&self, key_id: KeyId) -> Result<KeyRecord> {
        let mut index = self.index.write();

        if !index.private.contains_key(&key_id) && !index.public.contains_key(&key_id) {
            return Err(Error::KeyNotFound(key_id));
        }

        self.store.delete(key_id)?;

        let public = index.public.remove(&key_id);
        let removed = index
            .private
            .remove(&key_id)
            .or(public)
            .ok_or(Error::KeyNotFound(key_id))?;

        tracing::info!("Key {} removed from key ring", key_id);
        Ok(removed)
    }

    /// Change display metadata; identity fields are immutable
    pub fn update_metadata(&self, key_id: KeyId, update: &MetadataUpdate) -> Result<KeyRecord> {
        let mut index = self.index.write();

        let mut updated = index
            .private
            .get(&key_id)
            .or_else(|| index.public.get(&key_id))
            .cloned()
            .ok_or(Error::KeyNotFound(key_id))?;

        if update.is_empty() {
            return Ok(updated);
        }
        update.apply(&mut updated);

        self.store.update_metadata(&updated)?;

        if let Some(record) = index.private.get_mut(&key_id) {
            update.apply(record);
        }
        if let Some(record) = index.public.get_mut(&key_id) {
            update.apply(record);
        }

        tracing::info!("Metadata updated for key {}", key_id);
        Ok(updated)
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// Look a key up in either ring, preferring the private-ring record
    pub fn lookup(&self, key_id: KeyId) -> Option<KeyRecord> {
        let index = self.index.read();
        index
            .private
            .get(&key_id)
            .or_else(|| index.public.get(&key_id))
            .cloned()
    }

    /// Look a key up in the private ring only
    pub fn lookup_private(&self, key_id: KeyId) -> Option<KeyRecord> {
        self.index.read().private.get(&key_id).cloned()
    }

    /// Look a key up in the public ring only
    pub fn lookup_public(&self, key_id: KeyId) -> Option<KeyRecord> {
        self.index.read().public.get(&key_id).cloned()
    }

    pub fn contains(&self, key_id: KeyId) -> bool {
        let index = self.index.read();
        index.private.contains_key(&key_id) || index.public.contains_key(&key_id)
    }

    /// All key pairs, oldest first
    pub fn list_private(&self) -> Vec<KeyRecord> {
        sorted(self.index.read().private.values().cloned().collect())
    }

    /// All public keys (including the public half of owned pairs), oldest
    /// first
    pub fn list_public(&self) -> Vec<KeyRecord> {
        sorted(self.index.read().public.values().cloned().collect())
    }

    /// Every key whose user id matches exactly
    pub fn find_by_user_id(&self, user_id: &str) -> Vec<KeyRecord> {
        self.find(|record| record.user_id == user_id)
    }

    /// Every key whose name matches exactly
    pub fn find_by_name(&self, name: &str) -> Vec<KeyRecord> {
        self.find(|record| record.name == name)
    }

    fn find(&self, matches: impl Fn(&KeyRecord) -> bool) -> Vec<KeyRecord> {
        let index = self.index.read();
        let found = index
            .public
            .values()
            .filter(|record| matches(record))
            .map(|record| {
                index
                    .private
                    .get(&record.key_id)
                    .unwrap_or(record)
                    .clone()
            })
            .collect();
        sorted(found)
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        // Every private record has a public copy.
        self.index.read().public.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn sorted(mut records: Vec<KeyRecord>) -> Vec<KeyRecord> {
    records.sort_by(|a, b| (a.created_at, a.key_id).cmp(&(b.created_at, b.key_id)));
    records
}

impl PublicKeyLookup for KeyRing {
    fn public_key(&self, key_id: KeyId) -> Option<RsaPublicKey> {
        let index = self.index.read();
        let record = index.public.get(&key_id)?;
        match record.decode_public_key() {
            Ok(key) => Some(key),
            Err(e) => {
                tracing::warn!("Stored public key {} does not decode: {}", key_id, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::crypto::test_keys::{ALICE, BOB, TEST_KDF};
    use crate::crypto::wrap_private_key;

    fn alice_pair() -> KeyRecord {
        let wrapped = wrap_private_key(&ALICE, "pw", &TEST_KDF).unwrap();
        KeyRecord::new_public(&ALICE.to_public_key(), "Alice", "alice@x", "alice@x", 100)
            .unwrap()
            .with_private_key(wrapped)
    }

    fn bob_public() -> KeyRecord {
        KeyRecord::new_public(&BOB.to_public_key(), "Bob", "bob@x", "bob@x", 200).unwrap()
    }

    #[test]
    fn test_pair_lands_in_both_rings() {
        let ring = KeyRing::open_in_memory().unwrap();
        let record = alice_pair();
        ring.insert(record.clone()).unwrap();

        assert_eq!(ring.list_private(), vec![record.clone()]);
        assert_eq!(ring.list_public(), vec![record.public_part()]);
        assert_eq!(ring.lookup(record.key_id), Some(record.clone()));
        assert!(ring.lookup_public(record.key_id).unwrap().private_key.is_none());
        assert_eq!(ring.len(), 1);
    }

    #[test]
    fn test_public_key_lands_in_public_ring_only() {
        let ring = KeyRing::open_in_memory().unwrap();
        let record = bob_public();
        ring.insert(record.clone()).unwrap();

        assert!(ring.list_private().is_empty());
        assert_eq!(ring.list_public(), vec![record.clone()]);
        assert!(ring.lookup_private(record.key_id).is_none());
    }

    #[test]
    fn test_duplicate_key_id_rejected() {
        let ring = KeyRing::open_in_memory().unwrap();
        ring.insert(alice_pair()).unwrap();

        let again = alice_pair();
        let key_id = again.key_id;
        assert!(matches!(
            ring.insert(again),
            Err(Error::DuplicateKeyId(id)) if id == key_id
        ));
        assert!(matches!(
            ring.insert(alice_pair().public_part()),
            Err(Error::DuplicateKeyId(_))
        ));
        assert_eq!(ring.len(), 1);
    }

    #[test]
    fn test_remove_clears_both_rings() {
        let ring = KeyRing::open_in_memory().unwrap();
        let record = alice_pair();
        ring.insert(record.clone()).unwrap();

        let removed = ring.remove(record.key_id).unwrap();
        assert!(removed.has_private_key());
        assert!(ring.list_private().is_empty());
        assert!(ring.list_public().is_empty());
        assert!(ring.is_empty());

        assert!(matches!(
            ring.remove(record.key_id),
            Err(Error::KeyNotFound(_))
        ));
    }

    #[test]
    fn test_concurrent_remove_exactly_one_wins() {
        let ring = Arc::new(KeyRing::open_in_memory().unwrap());
        let record = alice_pair();
        ring.insert(record.clone()).unwrap();

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let ring = Arc::clone(&ring);
                let key_id = record.key_id;
                std::thread::spawn(move || ring.remove(key_id))
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let successes = results.iter().filter(|r| r.is_ok()).count();
        let not_found = results
            .iter()
            .filter(|r| matches!(r, Err(Error::KeyNotFound(_))))
            .count();

        assert_eq!(successes, 1);
        assert_eq!(not_found, 1);
        assert!(ring.lookup(record.key_id).is_none());
    }

    #[test]
    fn test_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keyring.db");
        let pair = alice_pair();
        let public = bob_public();

        {
            let ring = KeyRing::open(&path).unwrap();
            ring.insert(pair.clone()).unwrap();
            ring.insert(public.clone()).unwrap();
        }

        let ring = KeyRing::open(&path).unwrap();
        assert_eq!(ring.list_private(), vec![pair.clone()]);
        assert_eq!(ring.list_public(), vec![pair.public_part(), public]);
    }

    #[test]
    fn test_removal_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keyring.db");
        let pair = alice_pair();

        {
            let ring = KeyRing::open(&path).unwrap();
            ring.insert(pair.clone()).unwrap();
            ring.remove(pair.key_id).unwrap();
        }

        assert!(KeyRing::open(&path).unwrap().is_empty());
    }

    #[test]
    fn test_update_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keyring.db");
        let pair = alice_pair();

        {
            let ring = KeyRing::open(&path).unwrap();
            ring.insert(pair.clone()).unwrap();
            let update = MetadataUpdate {
                name: Some("Alice L.".into()),
                ..Default::default()
            };
            let updated = ring.update_metadata(pair.key_id, &update).unwrap();
            assert_eq!(updated.name, "Alice L.");
            assert_eq!(updated.public_key, pair.public_key);
        }

        let ring = KeyRing::open(&path).unwrap();
        assert_eq!(ring.lookup_private(pair.key_id).unwrap().name, "Alice L.");
        assert_eq!(ring.lookup_public(pair.key_id).unwrap().name, "Alice L.");

        assert!(matches!(
            ring.update_metadata(KeyId::from_u64(1), &MetadataUpdate::default()),
            Err(Error::KeyNotFound(_))
        ));
    }

    #[test]
    fn test_find_by_user_id_and_name() {
        let ring = KeyRing::open_in_memory().unwrap();
        ring.insert(alice_pair()).unwrap();
        ring.insert(bob_public()).unwrap();

        let found = ring.find_by_user_id("alice@x");
        assert_eq!(found.len(), 1);
        assert!(found[0].has_private_key());

        assert_eq!(ring.find_by_name("Bob").len(), 1);
        assert!(ring.find_by_name("Carol").is_empty());
    }

    #[test]
    fn test_public_key_lookup() {
        let ring = KeyRing::open_in_memory().unwrap();
        let record = alice_pair();
        ring.insert(record.clone()).unwrap();

        assert_eq!(ring.public_key(record.key_id), Some(ALICE.to_public_key()));
        assert_eq!(ring.public_key(KeyId::from_u64(9)), None);
    }
}
