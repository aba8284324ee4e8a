use tracing::{info, instrument};

use puppetmaster_core::{
    DomainResult, Permission, PermissionDraft, PermissionId, RoleId, UserId,
};
use puppetmaster_infra::Relation;

use super::{raw_ids, ClaimSnapshots, Repositories};

#[derive(Clone)]
pub struct PermissionUsecase {
    repos: Repositories,
    snapshots: ClaimSnapshots,
}

impl PermissionUsecase {
    pub fn new(repos: Repositories, snapshots: ClaimSnapshots) -> Self {
        Self { repos, snapshots }
    }

    pub async fn fetch(&self) -> DomainResult<Vec<Permission>> {
        self.repos.permissions.fetch().await
    }

    pub async fn get_by_id(&self, id: PermissionId) -> DomainResult<Permission> {
        self.repos.permissions.get_by_id(id).await
    }

    #[instrument(skip(self, draft), err)]
    pub async fn store(&self, draft: PermissionDraft) -> DomainResult<Permission> {
        let permission = self.repos.permissions.store(draft).await?;
        info!(permission_id = %permission.id, name = %permission.name, "permission created");
        Ok(permission)
    }

    #[instrument(skip(self, draft), err)]
    pub async fn update(&self, id: PermissionId, draft: PermissionDraft) -> DomainResult<Permission> {
        self.repos.permissions.update(id, draft).await
    }

    #[instrument(skip(self), err)]
    pub async fn delete(&self, id: PermissionId) -> DomainResult<()> {
        self.repos.permissions.delete(id).await?;
        info!(permission_id = %id, "permission deleted");
        Ok(())
    }

    pub async fn get_by_role_id(&self, role_id: RoleId) -> DomainResult<Vec<Permission>> {
        self.repos.roles.get_by_id(role_id).await?;
        self.repos.permissions.get_by_role_id(role_id).await
    }

    /// Permissions of every role with this name; empty when no role matches.
    pub async fn get_by_role_name(&self, role_name: &str) -> DomainResult<Vec<Permission>> {
        self.repos.permissions.get_by_role_name(role_name).await
    }

    /// Effective permissions of an existing user.
    pub async fn get_by_user_id(&self, user_id: UserId) -> DomainResult<Vec<Permission>> {
        self.repos.users.get_by_id(user_id).await?;
        self.repos.permissions.get_by_user_id(user_id).await
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    pub async fn give_to_role(&self, ids: &[PermissionId], role_id: RoleId) -> DomainResult<()> {
        self.repos
            .assignments
            .assign(Relation::PermissionRole, &raw_ids(ids), role_id.get())
            .await
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    pub async fn remove_from_role(
        &self,
        ids: &[PermissionId],
        role_id: RoleId,
    ) -> DomainResult<()> {
        self.repos
            .assignments
            .remove(Relation::PermissionRole, &raw_ids(ids), role_id.get())
            .await
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    pub async fn sync_to_role(&self, ids: &[PermissionId], role_id: RoleId) -> DomainResult<()> {
        self.repos
            .assignments
            .sync(Relation::PermissionRole, &raw_ids(ids), role_id.get())
            .await
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    pub async fn give_to_user(&self, ids: &[PermissionId], user_id: UserId) -> DomainResult<()> {
        self.repos
            .assignments
            .assign(Relation::PermissionUser, &raw_ids(ids), user_id.get())
            .await?;
        self.snapshots.refresh_if_cached(user_id).await;
        Ok(())
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    pub async fn remove_from_user(
        &self,
        ids: &[PermissionId],
        user_id: UserId,
    ) -> DomainResult<()> {
        self.repos
            .assignments
            .remove(Relation::PermissionUser, &raw_ids(ids), user_id.get())
            .await?;
        self.snapshots.refresh_if_cached(user_id).await;
        Ok(())
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    pub async fn sync_to_user(&self, ids: &[PermissionId], user_id: UserId) -> DomainResult<()> {
        self.repos
            .assignments
            .sync(Relation::PermissionUser, &raw_ids(ids), user_id.get())
            .await?;
        self.snapshots.refresh_if_cached(user_id).await;
        Ok(())
    }
}
