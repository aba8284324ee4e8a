use tracing::{info, instrument};

use puppetmaster_auth::HashCost;
use puppetmaster_core::{
    DomainResult, NewUser, User, UserChanges, UserDraft, UserId, UserPatch, UserProfile,
};
use super::{hash_blocking, raw_ids, ClaimSnapshots, Repositories};

#[derive(Clone)]
pub struct UserUsecase {
    repos: Repositories,
    snapshots: ClaimSnapshots,
    hash_cost: HashCost,
}

impl UserUsecase {
    pub fn new(repos: Repositories, snapshots: ClaimSnapshots, hash_cost: HashCost) -> Self {
        Self {
            repos,
            snapshots,
            hash_cost,
        }
    }

    pub async fn fetch(&self) -> DomainResult<Vec<User>> {
        self.repos.users.fetch().await
    }

    /// The user with its role names and effective permission names.
    #[instrument(skip(self), err)]
    pub async fn get_by_id(&self, id: UserId) -> DomainResult<UserProfile> {
        let user = self.repos.users.get_by_id(id).await?;
        let claims = self.snapshots.compute(&user).await?;

        Ok(UserProfile {
            user,
            roles: claims.roles.iter().map(|r| r.as_str().to_string()).collect(),
            permissions: claims
                .permissions
                .iter()
                .map(|p| p.as_str().to_string())
                .collect(),
        })
    }

    #[instrument(skip(self, input), err)]
    pub async fn store(&self, input: NewUser) -> DomainResult<User> {
        let password_hash = hash_blocking(input.password, self.hash_cost).await?;
        let user = self
            .repos
            .users
            .store(UserDraft {
                name: input.name,
                email: input.email,
                password_hash,
            })
            .await?;

        info!(user_id = %user.id, "user created");
        Ok(user)
    }

    /// Update the row and sync any role/permission lists that were given,
    /// as one atomic write.
    #[instrument(skip(self, changes), fields(user_id = %changes.id), err)]
    pub async fn update(&self, changes: UserChanges) -> DomainResult<User> {
        let password_hash = match changes.password {
            Some(password) => Some(hash_blocking(password, self.hash_cost).await?),
            None => None,
        };
        let roles = changes.roles.as_deref().map(raw_ids);
        let permissions = changes.permissions.as_deref().map(raw_ids);

        let user = self
            .repos
            .users
            .update_with_assignments(
                changes.id,
                UserPatch {
                    name: changes.name,
                    email: changes.email,
                    password_hash,
                },
                roles.as_deref(),
                permissions.as_deref(),
            )
            .await?;

        self.snapshots.refresh_if_cached(user.id).await;
        Ok(user)
    }

    /// Delete the user; its pivot rows go with it and live tokens stop passing the gate.
    #[instrument(skip(self), err)]
    pub async fn delete(&self, id: UserId) -> DomainResult<()> {
        self.repos.users.delete(id).await?;
        self.snapshots.invalidate(id).await;
        info!(user_id = %id, "user deleted");
        Ok(())
    }
}
