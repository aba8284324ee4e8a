//! Cached authorization snapshots.
//!
//! A snapshot is the [`ClaimBundle`] a user was last issued, stored under the
//! user's immutable id so that an e-mail change cannot orphan it.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use puppetmaster_core::{DomainError, UserId};

use crate::claims::ClaimBundle;

const KEY_PREFIX: &str = "puppetmaster:claims:user:";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClaimStoreError {
    #[error("no snapshot cached for key")]
    Miss,

    #[error("cached snapshot could not be decoded: {0}")]
    Decode(String),

    #[error("cache backend error: {0}")]
    Backend(String),
}

impl From<ClaimStoreError> for DomainError {
    fn from(value: ClaimStoreError) -> Self {
        match value {
            ClaimStoreError::Miss => DomainError::CacheMiss,
            ClaimStoreError::Decode(_) => DomainError::CacheDecode,
            ClaimStoreError::Backend(_) => DomainError::Internal,
        }
    }
}

/// Cache key of a user's snapshot.
pub fn snapshot_key(user_id: UserId) -> String {
    format!("{KEY_PREFIX}{user_id}")
}

pub fn encode_snapshot(snapshot: &ClaimBundle) -> Result<Vec<u8>, ClaimStoreError> {
    serde_json::to_vec(snapshot).map_err(|e| ClaimStoreError::Backend(e.to_string()))
}

pub fn decode_snapshot(bytes: &[u8]) -> Result<ClaimBundle, ClaimStoreError> {
    serde_json::from_slice(bytes).map_err(|e| ClaimStoreError::Decode(e.to_string()))
}

/// Byte-string keyed store for claim snapshots with per-entry TTL.
#[async_trait]
pub trait ClaimStore: Send + Sync {
    /// Store `snapshot` under its user's key, replacing any previous entry.
    async fn put(&self, snapshot: &ClaimBundle, ttl: Duration) -> Result<(), ClaimStoreError>;

    /// `Miss` when absent or expired, `Decode` when the payload is corrupt.
    async fn get(&self, user_id: UserId) -> Result<ClaimBundle, ClaimStoreError>;

    /// Drop the user's snapshot. Absent keys are not an error.
    async fn invalidate(&self, user_id: UserId) -> Result<(), ClaimStoreError>;

    /// Whether a snapshot is currently cached for the user.
    async fn contains(&self, user_id: UserId) -> Result<bool, ClaimStoreError> {
        match self.get(user_id).await {
            Ok(_) => Ok(true),
            Err(ClaimStoreError::Miss) => Ok(false),
            Err(ClaimStoreError::Decode(_)) => Ok(true),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PermissionName, RoleName};

    #[test]
    fn key_uses_user_id() {
        assert_eq!(snapshot_key(UserId::new(42)), "puppetmaster:claims:user:42");
    }

    #[test]
    fn snapshot_codec_round_trips_and_flags_corruption() {
        let bundle = ClaimBundle {
            user_id: UserId::new(1),
            name: "Ana".into(),
            email: "a@b.com".into(),
            roles: vec![RoleName::ADMIN],
            permissions: vec![PermissionName::new("user.read")],
        };
        let bytes = encode_snapshot(&bundle).unwrap();
        assert_eq!(decode_snapshot(&bytes).unwrap(), bundle);

        assert!(matches!(
            decode_snapshot(b"{\"user_id\":"),
            Err(ClaimStoreError::Decode(_))
        ));
    }

    #[test]
    fn store_errors_map_onto_taxonomy() {
        assert_eq!(DomainError::from(ClaimStoreError::Miss), DomainError::CacheMiss);
        assert_eq!(
            DomainError::from(ClaimStoreError::Decode("x".into())),
            DomainError::CacheDecode
        );
    }
}
