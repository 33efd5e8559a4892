//! # Key Ring Store
//!
//! SQLite persistence behind the in-memory key ring index.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      KEY RING PERSISTENCE                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────┐                                                   │
//! │  │    KeyRing      │  Index + reader/writer lock                       │
//! │  └────────┬────────┘                                                   │
//! │           │ writes only                                                 │
//! │           ▼                                                             │
//! │  ┌─────────────────┐                                                   │
//! │  │   RingStore     │  One transaction per mutation                     │
//! │  │  (this file)    │  - insert spans both rings                        │
//! │  │                 │  - delete spans both rings                        │
//! │  └────────┬────────┘                                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  ┌─────────────────┐                                                   │
//! │  │   SQLite DB     │  - In-memory for tests                            │
//! │  │                 │  - File for production                            │
//! │  └─────────────────┘                                                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{params, Connection, Row};

use super::record::KeyRecord;
use super::schema;
use crate::crypto::{KdfParams, KeyId, WrappedPrivateKey};
use crate::error::{Error, Result};

const PUBLIC_COLUMNS: &str = "key_id, name, user_id, email, created_at, key_size, public_key";

const PRIVATE_COLUMNS: &str = "key_id, name, user_id, email, created_at, key_size, public_key, \
     wrap_salt, wrap_nonce, wrap_ciphertext, kdf_memory_kib, kdf_iterations, kdf_parallelism";

/// Durable storage for both rings
pub(crate) struct RingStore {
    conn: Mutex<Connection>,
}

impl RingStore {
    /// Open or create a store
    ///
    /// If path is None, creates an in-memory database (useful for testing).
    pub fn open(path: Option<&Path>) -> Result<Self> {
        let conn = match path {
            Some(p) => Connection::open(p)
                .map_err(|e| Error::DatabaseError(format!("Failed to open key ring: {}", e)))?,
            None => Connection::open_in_memory().map_err(|e| {
                Error::DatabaseError(format!("Failed to create in-memory key ring: {}", e))
            })?,
        };

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;

        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock();

        let version: Option<i32> = conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .ok();

        match version {
            None => {
                conn.execute_batch(schema::CREATE_TABLES)
                    .map_err(|e| Error::DatabaseError(format!("Failed to create tables: {}", e)))?;

                conn.execute(
                    "INSERT INTO schema_version (version) VALUES (?)",
                    params![schema::SCHEMA_VERSION],
                )
                .map_err(|e| Error::DatabaseError(format!("Failed to set schema version: {}", e)))?;

                tracing::info!("Key ring schema created (version {})", schema::SCHEMA_VERSION);
            }
            Some(v) if v > schema::SCHEMA_VERSION => {
                return Err(Error::StorageCorrupted(format!(
                    "key ring schema version {} is newer than supported {}",
                    v,
                    schema::SCHEMA_VERSION
                )));
            }
            Some(v) => {
                tracing::debug!("Key ring schema version: {}", v);
            }
        }

        Ok(())
    }

    /// Read every record: `(private ring, public ring)`
    pub fn load(&self) -> Result<(Vec<KeyRecord>, Vec<KeyRecord>)> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM private_ring", PRIVATE_COLUMNS))
            .map_err(|e| Error::DatabaseError(format!("Failed to prepare query: {}", e)))?;
        let rows = stmt
            .query_map([], |row| Ok((read_public_columns(row)?, read_wrap_columns(row)?)))
            .map_err(|e| Error::DatabaseError(format!("Failed to query private ring: {}", e)))?;

        let mut private = Vec::new();
        for row in rows {
            let (columns, wrap) = row
                .map_err(|e| Error::DatabaseError(format!("Failed to read private key: {}", e)))?;
            let record = columns.into_record()?.with_private_key(wrap.into_wrapped()?);
            private.push(record);
        }

        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM public_ring", PUBLIC_COLUMNS))
            .map_err(|e| Error::DatabaseError(format!("Failed to prepare query: {}", e)))?;
        let rows = stmt
            .query_map([], read_public_columns)
            .map_err(|e| Error::DatabaseError(format!("Failed to query public ring: {}", e)))?;

        let mut public = Vec::new();
        for row in rows {
            let columns =
                row.map_err(|e| Error::DatabaseError(format!("Failed to read public key: {}", e)))?;
            public.push(columns.into_record()?);
        }

        Ok((private, public))
    }

    /// Persist a record: pairs go to both rings, public-only keys to the
    /// public ring
    pub fn insert(&self, record: &KeyRecord) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let key_id = record.key_id.to_hex();

        if let Some(wrapped) = &record.private_key {
            tx.execute(
                &format!(
                    "INSERT INTO private_ring ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                    PRIVATE_COLUMNS
                ),
                params![
                    key_id,
                    record.name,
                    record.user_id,
                    record.email,
                    record.created_at,
                    record.key_size as i64,
                    record.public_key,
                    &wrapped.salt[..],
                    &wrapped.nonce[..],
                    wrapped.ciphertext,
                    i64::from(wrapped.kdf.memory_kib),
                    i64::from(wrapped.kdf.iterations),
                    i64::from(wrapped.kdf.parallelism),
                ],
            )
            .map_err(|e| Error::DatabaseError(format!("Failed to store private key: {}", e)))?;
        }

        tx.execute(
            &format!(
                "INSERT INTO public_ring ({}) VALUES (?, ?, ?, ?, ?, ?, ?)",
                PUBLIC_COLUMNS
            ),
            params![
                key_id,
                record.name,
                record.user_id,
                record.email,
                record.created_at,
                record.key_size as i64,
                record.public_key,
            ],
        )
        .map_err(|e| Error::DatabaseError(format!("Failed to store public key: {}", e)))?;

        tx.commit()
            .map_err(|e| Error::DatabaseError(format!("Failed to commit key insert: {}", e)))?;

        Ok(())
    }

    /// Delete a key from both rings; returns the number of rows removed
    pub fn delete(&self, key_id: KeyId) -> Result<usize> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let id = key_id.to_hex();

        let mut removed = tx
            .execute("DELETE FROM private_ring WHERE key_id = ?", params![id])
            .map_err(|e| Error::DatabaseError(format!("Failed to remove private key: {}", e)))?;
        removed += tx
            .execute("DELETE FROM public_ring WHERE key_id = ?", params![id])
            .map_err(|e| Error::DatabaseError(format!("Failed to remove public key: {}", e)))?;

        tx.commit()
            .map_err(|e| Error::DatabaseError(format!("Failed to commit key removal: {}", e)))?;

        Ok(removed)
    }

    /// Rewrite the display metadata of a key in both rings
    pub fn update_metadata(&self, record: &KeyRecord) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let id = record.key_id.to_hex();

        for table in ["private_ring", "public_ring"] {
            tx.execute(
                &format!(
                    "UPDATE {} SET name = ?, user_id = ?, email = ? WHERE key_id = ?",
                    table
                ),
                params![record.name, record.user_id, record.email, id],
            )
            .map_err(|e| Error::DatabaseError(format!("Failed to update {}: {}", table, e)))?;
        }

        tx.commit()
            .map_err(|e| Error::DatabaseError(format!("Failed to commit metadata update: {}", e)))?;

        Ok(())
    }
}

// ============================================================================
// ROW DECODING
// ============================================================================

struct PublicColumns {
    key_id: String,
    name: String,
    user_id: String,
    email: String,
    created_at: i64,
    key_size: i64,
    public_key: Vec<u8>,
}

struct WrapColumns {
    salt: Vec<u8>,
    nonce: Vec<u8>,
    ciphertext: Vec<u8>,
    memory_kib: i64,
    iterations: i64,
    parallelism: i64,
}

fn read_public_columns(row: &Row<'_>) -> rusqlite::Result<PublicColumns> {
    Ok(PublicColumns {
        key_id: row.get(0)?,
        name: row.get(1)?,
        user_id: row.get(2)?,
        email: row.get(3)?,
        created_at: row.get(4)?,
        key_size: row.get(5)?,
        public_key: row.get(6)?,
    })
}

fn read_wrap_columns(row: &Row<'_>) -> rusqlite::Result<WrapColumns> {
    Ok(WrapColumns {
        salt: row.get(7)?,
        nonce: row.get(8)?,
        ciphertext: row.get(9)?,
        memory_kib: row.get(10)?,
        iterations: row.get(11)?,
        parallelism: row.get(12)?,
    })
}

fn corrupted(what: &str) -> Error {
    Error::StorageCorrupted(format!("invalid {} in key ring row", what))
}

impl PublicColumns {
    fn into_record(self) -> Result<KeyRecord> {
        let key_id = KeyId::from_hex(&self.key_id).map_err(|_| corrupted("key_id"))?;
        let key_size = usize::try_from(self.key_size).map_err(|_| corrupted("key_size"))?;

        Ok(KeyRecord {
            key_id,
            name: self.name,
            user_id: self.user_id,
            email: self.email,
            created_at: self.created_at,
            key_size,
            public_key: self.public_key,
            private_key: None,
        })
    }
}

impl WrapColumns {
    fn into_wrapped(self) -> Result<WrappedPrivateKey> {
        let kdf = KdfParams {
            memory_kib: u32::try_from(self.memory_kib).map_err(|_| corrupted("kdf_memory_kib"))?,
            iterations: u32::try_from(self.iterations).map_err(|_| corrupted("kdf_iterations"))?,
            parallelism: u32::try_from(self.parallelism).map_err(|_| corrupted("kdf_parallelism"))?,
        };
        kdf.check_bounds()
            .map_err(|e| Error::StorageCorrupted(format!("key ring row: {}", e)))?;

        Ok(WrappedPrivateKey {
            salt: self.salt.try_into().map_err(|_| corrupted("wrap_salt"))?,
            nonce: self.nonce.try_into().map_err(|_| corrupted("wrap_nonce"))?,
            ciphertext: self.ciphertext,
            kdf,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::test_keys::{ALICE, TEST_KDF};
    use crate::crypto::wrap_private_key;

    fn alice_pair() -> KeyRecord {
        let wrapped = wrap_private_key(&ALICE, "pw", &TEST_KDF).unwrap();
        KeyRecord::new_public(&ALICE.to_public_key(), "Alice", "alice@x", "alice@x", 100)
            .unwrap()
            .with_private_key(wrapped)
    }

    #[test]
    fn test_schema_created_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ring.db");

        RingStore::open(Some(&path)).unwrap();
        // Second open must find the version row and not recreate anything
        RingStore::open(Some(&path)).unwrap();
    }

    #[test]
    fn test_insert_and_load_pair() {
        let store = RingStore::open(None).unwrap();
        let record = alice_pair();
        store.insert(&record).unwrap();

        let (private, public) = store.load().unwrap();
        assert_eq!(private, vec![record.clone()]);
        assert_eq!(public, vec![record.public_part()]);
    }

    #[test]
    fn test_insert_is_atomic_on_conflict() {
        let store = RingStore::open(None).unwrap();
        let record = alice_pair();
        store.insert(&record.public_part()).unwrap();

        // The private row would insert, the public row conflicts: nothing lands.
        assert!(store.insert(&record).is_err());
        let (private, public) = store.load().unwrap();
        assert!(private.is_empty());
        assert_eq!(public.len(), 1);
    }

    #[test]
    fn test_delete_spans_both_rings() {
        let store = RingStore::open(None).unwrap();
        let record = alice_pair();
        store.insert(&record).unwrap();

        assert_eq!(store.delete(record.key_id).unwrap(), 2);
        assert_eq!(store.delete(record.key_id).unwrap(), 0);

        let (private, public) = store.load().unwrap();
        assert!(private.is_empty() && public.is_empty());
    }

    #[test]
    fn test_corrupt_row_detected() {
        let store = RingStore::open(None).unwrap();
        store.insert(&alice_pair()).unwrap();
        store
            .conn
            .lock()
            .execute("UPDATE private_ring SET wrap_salt = x'00'", [])
            .unwrap();

        assert!(matches!(store.load(), Err(Error::StorageCorrupted(_))));
    }

    #[test]
    fn test_oversized_stored_kdf_detected() {
        let store = RingStore::open(None).unwrap();
        store.insert(&alice_pair()).unwrap();
        store
            .conn
            .lock()
            .execute("UPDATE private_ring SET kdf_memory_kib = 4294967295", [])
            .unwrap();

        assert!(matches!(store.load(), Err(Error::StorageCorrupted(_))));
    }
}
