//! Service wiring: stores, claim cache, token service and usecases.

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use puppetmaster_auth::{
    catalog, AuthorizationGate, ClaimStore, GateConfig, HashCost, TokenConfig, TokenService,
};
use puppetmaster_core::{
    DomainError, DomainResult, Email, NewRole, NewUser, PermissionDraft, RoleDraft, RoleId, User,
};
use puppetmaster_infra::{db, InMemoryClaimStore, InMemoryStore, PostgresStore, Settings};

use crate::app::usecases::{
    AuthUsecase, ClaimSnapshots, PermissionUsecase, Repositories, RoleUsecase, UserUsecase,
};

/// Everything the handlers need, shared behind an `Arc`.
#[derive(Clone)]
pub struct AppServices {
    pub auth: AuthUsecase,
    pub users: UserUsecase,
    pub roles: RoleUsecase,
    pub permissions: PermissionUsecase,
    pub tokens: Arc<TokenService>,
    pub gate: AuthorizationGate,
    repos: Repositories,
}

impl AppServices {
    pub fn new(
        repos: Repositories,
        cache: Arc<dyn ClaimStore>,
        token_config: TokenConfig,
        gate_config: GateConfig,
        hash_cost: HashCost,
    ) -> anyhow::Result<Self> {
        let snapshot_ttl = token_config
            .access_ttl
            .to_std()
            .context("access token TTL must be positive")?;
        let tokens = Arc::new(TokenService::new(token_config).context("token service")?);
        let snapshots = ClaimSnapshots::new(repos.clone(), cache.clone(), snapshot_ttl);

        Ok(Self {
            auth: AuthUsecase::new(repos.clone(), tokens.clone(), snapshots.clone(), hash_cost)
                .context("decoy password hash")?,
            users: UserUsecase::new(repos.clone(), snapshots.clone(), hash_cost),
            roles: RoleUsecase::new(repos.clone(), snapshots.clone()),
            permissions: PermissionUsecase::new(repos.clone(), snapshots),
            gate: AuthorizationGate::new(gate_config, cache),
            tokens,
            repos,
        })
    }

    /// In-process stores only; used for development and tests.
    pub fn in_memory(
        token_config: TokenConfig,
        gate_config: GateConfig,
        hash_cost: HashCost,
    ) -> anyhow::Result<Self> {
        Self::new(
            Repositories::from_store(Arc::new(InMemoryStore::new())),
            Arc::new(InMemoryClaimStore::new()),
            token_config,
            gate_config,
            hash_cost,
        )
    }

    /// Postgres when `DATABASE_URL` is set, Redis when `REDIS_URL` is set
    /// (and the `redis` feature is on), in-memory otherwise.
    pub async fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let repos = match &settings.database_url {
            Some(url) => {
                let pool = db::connect(url).await.context("connect to postgres")?;
                db::bootstrap_schema(&pool)
                    .await
                    .context("bootstrap database schema")?;
                info!("using postgres store");
                Repositories::from_store(Arc::new(PostgresStore::new(pool)))
            }
            None => {
                warn!("DATABASE_URL not set; using in-memory store");
                Repositories::from_store(Arc::new(InMemoryStore::new()))
            }
        };

        let cache = claim_store(settings)?;

        Self::new(
            repos,
            cache,
            settings.token_config(),
            settings.gate_config(),
            settings.hash_cost,
        )
    }

    /// Ensure an administrator exists and holds every catalogue permission.
    ///
    /// Creates whatever is missing and leaves everything else as found, so
    /// running it on every start is harmless.
    pub async fn seed_admin(&self, email: &str, password: &str) -> DomainResult<User> {
        let admin_role = self.gate.config().admin_role.clone();

        let existing = self.permissions.fetch().await?;
        let mut permission_ids = Vec::with_capacity(catalog::ALL.len());
        for name in catalog::ALL {
            let id = match existing.iter().find(|p| p.name == name.as_str()) {
                Some(permission) => permission.id,
                None => {
                    let draft =
                        PermissionDraft::parse(name.as_str(), &format!("Allows {name}"))?;
                    self.permissions.store(draft).await?.id
                }
            };
            permission_ids.push(id);
        }

        let role = match self
            .roles
            .fetch()
            .await?
            .into_iter()
            .find(|r| r.name == admin_role.as_str())
        {
            Some(role) => role,
            None => {
                self.roles
                    .store(NewRole {
                        draft: RoleDraft::parse(admin_role.as_str(), "Unrestricted access")?,
                        permissions: vec![],
                    })
                    .await?
            }
        };
        self.permissions.sync_to_role(&permission_ids, role.id).await?;

        let user = match self.repos.users.get_by_email(&Email::parse(email)?).await {
            Ok(user) => user,
            Err(DomainError::NotFound) => {
                self.users
                    .store(NewUser::parse("Administrator", email, password)?)
                    .await?
            }
            Err(e) => return Err(e),
        };

        let mut held: Vec<RoleId> = self
            .roles
            .get_by_user_id(user.id)
            .await?
            .into_iter()
            .map(|r| r.id)
            .collect();
        if !held.contains(&role.id) {
            held.push(role.id);
            self.roles.sync_role(&held, user.id).await?;
        }

        info!(user_id = %user.id, role = %admin_role, "administrator ready");
        Ok(user)
    }
}

#[cfg(feature = "redis")]
fn claim_store(settings: &Settings) -> anyhow::Result<Arc<dyn ClaimStore>> {
    match &settings.redis_url {
        Some(url) => {
            let store =
                puppetmaster_infra::RedisClaimStore::new(url).context("open redis client")?;
            info!("using redis claim cache");
            Ok(Arc::new(store))
        }
        None => {
            warn!("REDIS_URL not set; caching claims in-process");
            Ok(Arc::new(InMemoryClaimStore::new()))
        }
    }
}

#[cfg(not(feature = "redis"))]
fn claim_store(settings: &Settings) -> anyhow::Result<Arc<dyn ClaimStore>> {
    if settings.redis_url.is_some() {
        warn!("REDIS_URL is set but the redis feature is disabled; caching claims in-process");
    }
    Ok(Arc::new(InMemoryClaimStore::new()))
}

#[cfg(test)]
mod tests {
    use puppetmaster_auth::{PermissionName, RoleName};

    use super::*;

    fn services() -> AppServices {
        AppServices::in_memory(
            TokenConfig::new("test-secret"),
            GateConfig::default(),
            HashCost::new(1, 64),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let services = services();
        let first = services.seed_admin("root@example.com", "rootpass1").await.unwrap();
        let second = services.seed_admin("root@example.com", "rootpass1").await.unwrap();
        assert_eq!(first.id, second.id);

        assert_eq!(services.roles.fetch().await.unwrap().len(), 1);
        assert_eq!(
            services.permissions.fetch().await.unwrap().len(),
            catalog::ALL.len()
        );

        let profile = services.users.get_by_id(first.id).await.unwrap();
        assert_eq!(profile.roles, vec![RoleName::ADMIN.as_str()]);
        assert_eq!(profile.permissions.len(), catalog::ALL.len());
    }

    #[tokio::test]
    async fn seeded_admin_passes_the_gate() {
        let services = services();
        services.seed_admin("root@example.com", "rootpass1").await.unwrap();
        let pair = services
            .auth
            .authenticate("root@example.com", "rootpass1")
            .await
            .unwrap();

        let claims = services.tokens.parse_and_verify(&pair.token).unwrap();
        let identity = puppetmaster_auth::Identity::from_claims(claims);
        assert!(
            services
                .gate
                .authorize(Some(&identity), &PermissionName::new("anything.at.all"), &[])
                .await
        );
    }
}
