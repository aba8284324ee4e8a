//! Claim snapshot caches.

#[cfg(feature = "redis")]
pub mod redis;

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use puppetmaster_auth::{decode_snapshot, encode_snapshot, ClaimBundle, ClaimStore, ClaimStoreError};
use puppetmaster_core::UserId;

#[cfg(feature = "redis")]
pub use self::redis::RedisClaimStore;

#[derive(Debug)]
struct Entry {
    payload: Vec<u8>,
    expires_at: Instant,
}

/// In-process snapshot cache with per-entry expiry.
///
/// Payloads are stored serialized, exactly as a remote cache would hold them.
#[derive(Debug, Default)]
pub struct InMemoryClaimStore {
    entries: RwLock<HashMap<UserId, Entry>>,
}

impl InMemoryClaimStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert_raw(&self, user_id: UserId, payload: Vec<u8>, ttl: Duration) -> Result<(), ClaimStoreError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| ClaimStoreError::Backend("lock poisoned".to_string()))?;
        entries.insert(
            user_id,
            Entry {
                payload,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }
}

#[async_trait]
impl ClaimStore for InMemoryClaimStore {
    async fn put(&self, snapshot: &ClaimBundle, ttl: Duration) -> Result<(), ClaimStoreError> {
        let payload = encode_snapshot(snapshot)?;
        self.insert_raw(snapshot.user_id, payload, ttl)
    }

    async fn get(&self, user_id: UserId) -> Result<ClaimBundle, ClaimStoreError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| ClaimStoreError::Backend("lock poisoned".to_string()))?;
        match entries.get(&user_id) {
            Some(entry) if entry.expires_at > Instant::now() => decode_snapshot(&entry.payload),
            _ => Err(ClaimStoreError::Miss),
        }
    }

    async fn invalidate(&self, user_id: UserId) -> Result<(), ClaimStoreError> {
        self.entries
            .write()
            .map_err(|_| ClaimStoreError::Backend("lock poisoned".to_string()))?
            .remove(&user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use puppetmaster_auth::{PermissionName, RoleName};

    use super::*;

    fn snapshot() -> ClaimBundle {
        ClaimBundle {
            user_id: UserId::new(5),
            name: "Ana".into(),
            email: "a@b.com".into(),
            roles: vec![RoleName::new("editor")],
            permissions: vec![PermissionName::new("user.read")],
        }
    }

    #[tokio::test]
    async fn put_get_invalidate() {
        let cache = InMemoryClaimStore::new();
        assert_eq!(cache.get(UserId::new(5)).await, Err(ClaimStoreError::Miss));

        cache.put(&snapshot(), Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get(UserId::new(5)).await.unwrap(), snapshot());
        assert!(cache.contains(UserId::new(5)).await.unwrap());

        cache.invalidate(UserId::new(5)).await.unwrap();
        assert_eq!(cache.get(UserId::new(5)).await, Err(ClaimStoreError::Miss));
        cache.invalidate(UserId::new(5)).await.unwrap();
    }

    #[tokio::test]
    async fn expired_entries_are_misses() {
        let cache = InMemoryClaimStore::new();
        cache.put(&snapshot(), Duration::ZERO).await.unwrap();
        assert_eq!(cache.get(UserId::new(5)).await, Err(ClaimStoreError::Miss));
    }

    #[tokio::test]
    async fn corrupt_payload_is_a_decode_error() {
        let cache = InMemoryClaimStore::new();
        cache
            .insert_raw(UserId::new(5), b"{broken".to_vec(), Duration::from_secs(60))
            .unwrap();
        assert!(matches!(
            cache.get(UserId::new(5)).await,
            Err(ClaimStoreError::Decode(_))
        ));
    }
}
