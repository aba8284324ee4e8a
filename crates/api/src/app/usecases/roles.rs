use tracing::{info, instrument};

use puppetmaster_core::{DomainResult, NewRole, Role, RoleChanges, RoleId, UserId};
use puppetmaster_infra::Relation;

use super::{raw_ids, ClaimSnapshots, Repositories};

#[derive(Clone)]
pub struct RoleUsecase {
    repos: Repositories,
    snapshots: ClaimSnapshots,
}

impl RoleUsecase {
    pub fn new(repos: Repositories, snapshots: ClaimSnapshots) -> Self {
        Self { repos, snapshots }
    }

    pub async fn fetch(&self) -> DomainResult<Vec<Role>> {
        self.repos.roles.fetch().await
    }

    pub async fn get_by_id(&self, id: RoleId) -> DomainResult<Role> {
        self.repos.roles.get_by_id(id).await
    }

    /// Create the role with its initial permission set; nothing is stored
    /// when a permission does not exist.
    #[instrument(skip(self, input), err)]
    pub async fn store(&self, input: NewRole) -> DomainResult<Role> {
        let role = self
            .repos
            .roles
            .store_with_permissions(input.draft, &raw_ids(&input.permissions))
            .await?;

        info!(role_id = %role.id, "role created");
        Ok(role)
    }

    #[instrument(skip(self, changes), fields(role_id = %changes.id), err)]
    pub async fn update(&self, changes: RoleChanges) -> DomainResult<Role> {
        let permissions = changes.permissions.as_deref().map(raw_ids);
        self.repos
            .roles
            .update_with_permissions(changes.id, changes.draft, permissions.as_deref())
            .await
    }

    #[instrument(skip(self), err)]
    pub async fn delete(&self, id: RoleId) -> DomainResult<()> {
        self.repos.roles.delete(id).await?;
        info!(role_id = %id, "role deleted");
        Ok(())
    }

    /// Roles held by an existing user.
    pub async fn get_by_user_id(&self, user_id: UserId) -> DomainResult<Vec<Role>> {
        self.repos.users.get_by_id(user_id).await?;
        self.repos.roles.get_by_user_id(user_id).await
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    pub async fn assign_role(&self, ids: &[RoleId], user_id: UserId) -> DomainResult<()> {
        self.repos
            .assignments
            .assign(Relation::RoleUser, &raw_ids(ids), user_id.get())
            .await?;
        self.snapshots.refresh_if_cached(user_id).await;
        Ok(())
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    pub async fn remove_role(&self, ids: &[RoleId], user_id: UserId) -> DomainResult<()> {
        self.repos
            .assignments
            .remove(Relation::RoleUser, &raw_ids(ids), user_id.get())
            .await?;
        self.snapshots.refresh_if_cached(user_id).await;
        Ok(())
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    pub async fn sync_role(&self, ids: &[RoleId], user_id: UserId) -> DomainResult<()> {
        self.repos
            .assignments
            .sync(Relation::RoleUser, &raw_ids(ids), user_id.get())
            .await?;
        self.snapshots.refresh_if_cached(user_id).await;
        Ok(())
    }
}
