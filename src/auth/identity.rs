//! Registered client identities
//!
//! Maps a client identifier to its current Ed25519 verifying key. Registration
//! is trust-on-first-use: the first key presented for an identifier is
//! accepted, and later registrations replace it without any proof that the
//! caller holds the previous key.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bson::{doc, DateTime};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, info};

use crate::db::schemas::{PublicKeyDoc, PUBLIC_KEY_COLLECTION};
use crate::db::{MongoClient, MongoCollection};
use crate::types::{Result, TextframeError};

/// What a registration call changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// First registration for this identifier
    Created,
    /// Existing identifier, key replaced
    Updated,
    /// Same key already stored; nothing written
    Unchanged,
}

/// Durable identifier → public key mapping
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Create, rotate, or confirm the key registered for `uuid`
    async fn register(&self, uuid: &str, public_key: &str) -> Result<RegisterOutcome>;

    /// Fetch the current key for `uuid`.
    ///
    /// Returns [`TextframeError::NotFound`] for identifiers that were never
    /// registered; any other error is a storage fault.
    async fn lookup(&self, uuid: &str) -> Result<String>;
}

// =============================================================================
// MongoDB implementation
// =============================================================================

pub struct MongoIdentityStore {
    collection: MongoCollection<PublicKeyDoc>,
}

impl MongoIdentityStore {
    pub async fn new(mongo: &MongoClient) -> Result<Self> {
        let collection = mongo.collection::<PublicKeyDoc>(PUBLIC_KEY_COLLECTION).await?;
        Ok(Self { collection })
    }
}

#[async_trait]
impl IdentityStore for MongoIdentityStore {
    async fn register(&self, uuid: &str, public_key: &str) -> Result<RegisterOutcome> {
        match self.collection.find_one(doc! { "uuid": uuid }).await? {
            Some(existing) if existing.public_key == public_key => {
                debug!(uuid = %uuid, "Public key unchanged");
                Ok(RegisterOutcome::Unchanged)
            }
            Some(_) => {
                self.collection
                    .update_one(
                        doc! { "uuid": uuid },
                        doc! {
                            "$set": {
                                "public_key": public_key,
                                "metadata.updated_at": DateTime::now(),
                            }
                        },
                    )
                    .await?;
                info!(uuid = %uuid, "Public key rotated");
                Ok(RegisterOutcome::Updated)
            }
            None => {
                self.collection
                    .insert_one(PublicKeyDoc::new(uuid.to_string(), public_key.to_string()))
                    .await?;
                info!(uuid = %uuid, "Public key registered");
                Ok(RegisterOutcome::Created)
            }
        }
    }

    async fn lookup(&self, uuid: &str) -> Result<String> {
        self.collection
            .find_one(doc! { "uuid": uuid })
            .await?
            .map(|d| d.public_key)
            .ok_or_else(|| TextframeError::NotFound(format!("identity {}", uuid)))
    }
}

// =============================================================================
// In-memory implementation (dev mode and tests)
// =============================================================================

#[derive(Default)]
pub struct InMemoryIdentityStore {
    keys: DashMap<String, String>,
    writes: AtomicU64,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of create/update writes performed so far
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn register(&self, uuid: &str, public_key: &str) -> Result<RegisterOutcome> {
        let outcome = match self.keys.entry(uuid.to_string()) {
            Entry::Occupied(entry) if entry.get() == public_key => RegisterOutcome::Unchanged,
            Entry::Occupied(mut entry) => {
                entry.insert(public_key.to_string());
                RegisterOutcome::Updated
            }
            Entry::Vacant(entry) => {
                entry.insert(public_key.to_string());
                RegisterOutcome::Created
            }
        };

        if outcome != RegisterOutcome::Unchanged {
            self.writes.fetch_add(1, Ordering::Relaxed);
        }
        Ok(outcome)
    }

    async fn lookup(&self, uuid: &str) -> Result<String> {
        self.keys
            .get(uuid)
            .map(|k| k.value().clone())
            .ok_or_else(|| TextframeError::NotFound(format!("identity {}", uuid)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_register_and_lookup() {
        let store = InMemoryIdentityStore::new();

        assert_eq!(
            store.register("u1", "key-one").await.unwrap(),
            RegisterOutcome::Created
        );
        assert_eq!(store.lookup("u1").await.unwrap(), "key-one");
    }

    #[tokio::test]
    async fn test_identical_registration_is_noop() {
        let store = InMemoryIdentityStore::new();
        store.register("u1", "key-one").await.unwrap();
        let writes = store.write_count();

        assert_eq!(
            store.register("u1", "key-one").await.unwrap(),
            RegisterOutcome::Unchanged
        );
        assert_eq!(store.write_count(), writes);
    }

    #[tokio::test]
    async fn test_rotation_overwrites() {
        let store = InMemoryIdentityStore::new();
        assert_ok!(store.register("u1", "key-one").await);

        assert_eq!(
            store.register("u1", "key-two").await.unwrap(),
            RegisterOutcome::Updated
        );
        assert_eq!(store.lookup("u1").await.unwrap(), "key-two");
        assert_eq!(store.write_count(), 2);
    }

    #[tokio::test]
    async fn test_unknown_identity_is_not_found() {
        let store = InMemoryIdentityStore::new();

        let err = assert_err!(store.lookup("ghost").await);
        assert!(matches!(err, TextframeError::NotFound(_)));
    }
}
