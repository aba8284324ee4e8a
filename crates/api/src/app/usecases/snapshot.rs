use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use puppetmaster_auth::{ClaimBundle, ClaimStore, PermissionName, RoleName};
use puppetmaster_core::{dedup_names, DomainError, DomainResult, User, UserId};

use super::Repositories;

/// Builds and caches users' claim snapshots.
///
/// Snapshots are written when tokens are issued and recomputed after a
/// user-scoped assignment change, but only for users who already have one.
#[derive(Clone)]
pub struct ClaimSnapshots {
    repos: Repositories,
    cache: Arc<dyn ClaimStore>,
    ttl: Duration,
}

impl ClaimSnapshots {
    pub fn new(repos: Repositories, cache: Arc<dyn ClaimStore>, ttl: Duration) -> Self {
        Self { repos, cache, ttl }
    }

    /// Role names and effective permission names of `user`, sorted and unique.
    pub async fn compute(&self, user: &User) -> DomainResult<ClaimBundle> {
        let roles = self.repos.roles.get_by_user_id(user.id).await?;
        let permissions = self.repos.permissions.get_by_user_id(user.id).await?;

        Ok(ClaimBundle {
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            roles: dedup_names(roles.into_iter().map(|r| r.name))
                .into_iter()
                .map(RoleName::from)
                .collect(),
            permissions: dedup_names(permissions.into_iter().map(|p| p.name))
                .into_iter()
                .map(PermissionName::from)
                .collect(),
        })
    }

    /// Compute and cache the snapshot for `user`.
    pub async fn publish(&self, user: &User) -> DomainResult<ClaimBundle> {
        let snapshot = self.compute(user).await?;
        self.cache.put(&snapshot, self.ttl).await.map_err(|e| {
            error!(user_id = %user.id, error = %e, "failed to cache claim snapshot");
            DomainError::from(e)
        })?;
        Ok(snapshot)
    }

    /// Recompute a cached snapshot. Failures are logged, never returned.
    pub async fn refresh_if_cached(&self, user_id: UserId) {
        match self.cache.contains(user_id).await {
            Ok(true) => {}
            Ok(false) => return,
            Err(e) => {
                warn!(%user_id, error = %e, "snapshot lookup failed; skipping refresh");
                return;
            }
        }

        let user = match self.repos.users.get_by_id(user_id).await {
            Ok(user) => user,
            Err(e) => {
                warn!(%user_id, error = %e, "snapshot refresh skipped");
                return;
            }
        };

        match self.publish(&user).await {
            Ok(_) => debug!(%user_id, "claim snapshot refreshed"),
            Err(e) => warn!(%user_id, error = %e, "snapshot refresh failed"),
        }
    }

    /// Drop a user's snapshot, revoking every live token of theirs at the gate.
    pub async fn invalidate(&self, user_id: UserId) {
        if let Err(e) = self.cache.invalidate(user_id).await {
            warn!(%user_id, error = %e, "failed to invalidate claim snapshot");
        }
    }
}
