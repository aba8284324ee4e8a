//! Persistence seams for users, roles, permissions and their assignments.
//!
//! Two implementations exist: [`postgres::PostgresStore`] for deployments and
//! [`memory::InMemoryStore`] for development and tests. Both surface failures
//! as [`DomainError`] kinds only; driver detail is logged where it happens.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use puppetmaster_core::{
    DomainError, DomainResult, Email, Permission, PermissionDraft, PermissionId, Role, RoleDraft,
    RoleId, User, UserDraft, UserId, UserPatch,
};

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn fetch(&self) -> DomainResult<Vec<User>>;

    async fn get_by_id(&self, id: UserId) -> DomainResult<User>;

    /// `NotFound` when no user has this e-mail.
    async fn get_by_email(&self, email: &Email) -> DomainResult<User>;

    /// A taken e-mail is `ValidationFailed { field: "email" }`.
    async fn store(&self, draft: UserDraft) -> DomainResult<User>;

    /// Update the row and replace whichever member lists are given, all in
    /// one atomic step. A missing role or permission is `Sync` and leaves the
    /// row and its pivots as they were.
    async fn update_with_assignments(
        &self,
        id: UserId,
        patch: UserPatch,
        roles: Option<&[i64]>,
        permissions: Option<&[i64]>,
    ) -> DomainResult<User>;

    /// Removes the user and every pivot row that references it.
    async fn delete(&self, id: UserId) -> DomainResult<()>;
}

#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn fetch(&self) -> DomainResult<Vec<Role>>;

    async fn get_by_id(&self, id: RoleId) -> DomainResult<Role>;

    /// Insert the role together with its permission set. A missing
    /// permission is `Sync` and no role is created.
    async fn store_with_permissions(
        &self,
        draft: RoleDraft,
        permissions: &[i64],
    ) -> DomainResult<Role>;

    /// Update the row and, when `permissions` is given, replace its
    /// permission set. All or nothing.
    async fn update_with_permissions(
        &self,
        id: RoleId,
        draft: RoleDraft,
        permissions: Option<&[i64]>,
    ) -> DomainResult<Role>;

    async fn delete(&self, id: RoleId) -> DomainResult<()>;

    /// Roles assigned to a user, ordered by id.
    async fn get_by_user_id(&self, user_id: UserId) -> DomainResult<Vec<Role>>;
}

#[async_trait]
pub trait PermissionRepository: Send + Sync {
    async fn fetch(&self) -> DomainResult<Vec<Permission>>;

    async fn get_by_id(&self, id: PermissionId) -> DomainResult<Permission>;

    async fn store(&self, draft: PermissionDraft) -> DomainResult<Permission>;

    async fn update(&self, id: PermissionId, draft: PermissionDraft) -> DomainResult<Permission>;

    async fn delete(&self, id: PermissionId) -> DomainResult<()>;

    async fn get_by_role_id(&self, role_id: RoleId) -> DomainResult<Vec<Permission>>;

    /// Permissions of every role carrying this name.
    async fn get_by_role_name(&self, role_name: &str) -> DomainResult<Vec<Permission>>;

    /// Effective permissions of a user: direct grants plus those of every
    /// assigned role, one entry per permission name.
    async fn get_by_user_id(&self, user_id: UserId) -> DomainResult<Vec<Permission>>;
}

/// One many-to-many association: rows pair an owner with a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// Roles (members) held by a user (owner).
    RoleUser,
    /// Permissions (members) granted to a role (owner).
    PermissionRole,
    /// Permissions (members) granted directly to a user (owner).
    PermissionUser,
}

impl Relation {
    pub fn table(self) -> &'static str {
        match self {
            Self::RoleUser => "role_user",
            Self::PermissionRole => "permission_role",
            Self::PermissionUser => "permission_user",
        }
    }

    pub fn owner_column(self) -> &'static str {
        match self {
            Self::RoleUser | Self::PermissionUser => "user_id",
            Self::PermissionRole => "role_id",
        }
    }

    pub fn member_column(self) -> &'static str {
        match self {
            Self::RoleUser => "role_id",
            Self::PermissionRole | Self::PermissionUser => "permission_id",
        }
    }
}

impl core::fmt::Display for Relation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.table())
    }
}

/// Pivot management with assign/remove/sync semantics.
///
/// Every call is atomic: it either applies completely or leaves the owner's
/// rows untouched, and failures surface as one taxonomy kind per operation.
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    /// Replace the owner's members with `ids`. Empty `ids` is `BadRequest`.
    async fn assign(&self, relation: Relation, ids: &[i64], owner: i64) -> DomainResult<()>;

    /// Drop every member of the owner. `ids` only feeds the log line.
    async fn remove(&self, relation: Relation, ids: &[i64], owner: i64) -> DomainResult<()>;

    /// Replace when `ids` is non-empty, clear otherwise.
    async fn sync(&self, relation: Relation, ids: &[i64], owner: i64) -> DomainResult<()>;

    /// Member ids of the owner, ascending.
    async fn members(&self, relation: Relation, owner: i64) -> DomainResult<Vec<i64>>;
}

/// Every repository the services need, behind one handle.
pub trait Store:
    UserRepository + RoleRepository + PermissionRepository + AssignmentStore
{
}

impl<T> Store for T where
    T: UserRepository + RoleRepository + PermissionRepository + AssignmentStore
{
}

/// Sorted, duplicate-free copy of `ids`.
pub(crate) fn normalize_ids(ids: &[i64]) -> Vec<i64> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

pub(crate) fn require_ids(ids: &[i64]) -> DomainResult<()> {
    if ids.is_empty() {
        return Err(DomainError::bad_request("at least one id is required"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relations_pair_owner_and_member_columns() {
        assert_eq!(Relation::RoleUser.owner_column(), "user_id");
        assert_eq!(Relation::RoleUser.member_column(), "role_id");
        assert_eq!(Relation::PermissionRole.owner_column(), "role_id");
        assert_eq!(Relation::PermissionRole.member_column(), "permission_id");
        assert_eq!(Relation::PermissionUser.owner_column(), "user_id");
    }

    #[test]
    fn ids_are_sorted_and_deduplicated() {
        assert_eq!(normalize_ids(&[3, 1, 3, 2, 1]), vec![1, 2, 3]);
        assert!(require_ids(&[]).is_err());
    }
}
