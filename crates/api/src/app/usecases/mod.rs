//! Usecase layer: one service per resource, sitting between the HTTP
//! handlers and the repositories.
//!
//! Usecases receive already-validated inputs, talk to the stores through the
//! repository traits, and keep cached claim snapshots current.

use std::sync::Arc;

use tracing::error;

use puppetmaster_auth::{hash_password, verify_password, HashCost};
use puppetmaster_core::{DomainError, DomainResult, Password};
use puppetmaster_infra::{
    AssignmentStore, PermissionRepository, RoleRepository, Store, UserRepository,
};

pub mod auth;
pub mod permissions;
pub mod roles;
pub mod snapshot;
pub mod users;

pub use auth::AuthUsecase;
pub use permissions::PermissionUsecase;
pub use roles::RoleUsecase;
pub use snapshot::ClaimSnapshots;
pub use users::UserUsecase;

/// Trait-object handles onto one backing store.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub roles: Arc<dyn RoleRepository>,
    pub permissions: Arc<dyn PermissionRepository>,
    pub assignments: Arc<dyn AssignmentStore>,
}

impl Repositories {
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: Store + 'static,
    {
        Self {
            users: store.clone(),
            roles: store.clone(),
            permissions: store.clone(),
            assignments: store,
        }
    }
}

/// Raw pivot ids for the assignment store.
pub(crate) fn raw_ids<T>(ids: &[T]) -> Vec<i64>
where
    T: Copy + Into<i64>,
{
    ids.iter().map(|id| (*id).into()).collect()
}

/// Hash off the async runtime; argon2 is deliberately slow.
pub(crate) async fn hash_blocking(password: Password, cost: HashCost) -> DomainResult<String> {
    tokio::task::spawn_blocking(move || hash_password(password.expose(), cost))
        .await
        .map_err(|e| {
            error!(error = %e, "password hashing task failed");
            DomainError::Internal
        })?
        .map_err(|e| {
            error!(error = %e, "password hashing failed");
            DomainError::Internal
        })
}

pub(crate) async fn verify_blocking(password: String, hash: String) -> DomainResult<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| {
            error!(error = %e, "password verification task failed");
            DomainError::Internal
        })
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::sync::Arc;
    use std::time::Duration;

    use puppetmaster_auth::{HashCost, TokenConfig, TokenService};
    use puppetmaster_infra::{InMemoryClaimStore, InMemoryStore};

    use super::*;

    /// Every usecase wired over fresh in-memory stores.
    pub(crate) struct Fixture {
        pub auth: AuthUsecase,
        pub users: UserUsecase,
        pub roles: RoleUsecase,
        pub permissions: PermissionUsecase,
        pub tokens: Arc<TokenService>,
        pub cache: Arc<InMemoryClaimStore>,
    }

    impl Fixture {
        pub(crate) fn new() -> Self {
            Self::with_hash_cost(HashCost::new(1, 64))
        }

        pub(crate) fn with_hash_cost(cost: HashCost) -> Self {
            let repos = Repositories::from_store(Arc::new(InMemoryStore::new()));
            let cache = Arc::new(InMemoryClaimStore::new());
            let tokens = Arc::new(TokenService::new(TokenConfig::new("test-secret")).unwrap());
            let snapshots =
                ClaimSnapshots::new(repos.clone(), cache.clone(), Duration::from_secs(60));

            Self {
                auth: AuthUsecase::new(repos.clone(), tokens.clone(), snapshots.clone(), cost)
                    .unwrap(),
                users: UserUsecase::new(repos.clone(), snapshots.clone(), cost),
                roles: RoleUsecase::new(repos.clone(), snapshots.clone()),
                permissions: PermissionUsecase::new(repos, snapshots),
                tokens,
                cache,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use puppetmaster_core::{RoleId, UserId};

    #[test]
    fn typed_ids_flatten_to_raw_values() {
        assert_eq!(raw_ids(&[RoleId::new(2), RoleId::new(7)]), vec![2, 7]);
        assert!(raw_ids::<UserId>(&[]).is_empty());
    }

    #[tokio::test]
    async fn blocking_hash_verifies() {
        let password = Password::parse("longpass1").unwrap();
        let hash = hash_blocking(password, HashCost::new(1, 64)).await.unwrap();
        assert!(verify_blocking("longpass1".into(), hash.clone()).await.unwrap());
        assert!(!verify_blocking("longpass2".into(), hash).await.unwrap());
    }
}
