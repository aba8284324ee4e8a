use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, error};

use puppetmaster_core::{
    DomainError, DomainResult, Email, Permission, PermissionDraft, PermissionId, Role, RoleDraft,
    RoleId, User, UserDraft, UserId, UserPatch,
};

use super::{
    normalize_ids, require_ids, AssignmentStore, PermissionRepository, Relation, RoleRepository,
    UserRepository,
};

#[derive(Debug, Default)]
struct State {
    last_user_id: i64,
    last_role_id: i64,
    last_permission_id: i64,
    users: BTreeMap<i64, User>,
    roles: BTreeMap<i64, Role>,
    permissions: BTreeMap<i64, Permission>,
    /// `(owner, member)` pairs per relation.
    pivots: HashMap<Relation, BTreeSet<(i64, i64)>>,
}

impl State {
    fn owner_exists(&self, relation: Relation, owner: i64) -> bool {
        match relation {
            Relation::RoleUser | Relation::PermissionUser => self.users.contains_key(&owner),
            Relation::PermissionRole => self.roles.contains_key(&owner),
        }
    }

    fn member_exists(&self, relation: Relation, member: i64) -> bool {
        match relation {
            Relation::RoleUser => self.roles.contains_key(&member),
            Relation::PermissionRole | Relation::PermissionUser => {
                self.permissions.contains_key(&member)
            }
        }
    }

    fn members(&self, relation: Relation, owner: i64) -> Vec<i64> {
        self.pivots
            .get(&relation)
            .map(|rows| {
                rows.range((owner, i64::MIN)..=(owner, i64::MAX))
                    .map(|(_, member)| *member)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn clear_owner(&mut self, relation: Relation, owner: i64) -> usize {
        let rows = self.pivots.entry(relation).or_default();
        let before = rows.len();
        rows.retain(|(o, _)| *o != owner);
        before - rows.len()
    }

    fn clear_member(&mut self, relation: Relation, member: i64) {
        if let Some(rows) = self.pivots.get_mut(&relation) {
            rows.retain(|(_, m)| *m != member);
        }
    }

    /// Replace the owner's rows. Validates everything before touching state,
    /// which is what makes the in-memory variant atomic.
    fn replace(&mut self, relation: Relation, ids: &[i64], owner: i64) -> Result<(), String> {
        if !self.owner_exists(relation, owner) {
            return Err(format!("owner {owner} does not exist"));
        }
        if let Some(missing) = self.missing_member(relation, ids) {
            return Err(format!("member {missing} does not exist"));
        }

        self.set_members(relation, ids, owner);
        Ok(())
    }

    fn missing_member(&self, relation: Relation, ids: &[i64]) -> Option<i64> {
        ids.iter().copied().find(|id| !self.member_exists(relation, *id))
    }

    /// `Sync` unless every id names an existing member.
    fn require_members(&self, relation: Relation, ids: &[i64]) -> DomainResult<()> {
        match self.missing_member(relation, ids) {
            Some(missing) => {
                error!(%relation, member = missing, "sync failed: member does not exist");
                Err(DomainError::Sync)
            }
            None => Ok(()),
        }
    }

    /// Unchecked replace; an empty `ids` clears the owner.
    fn set_members(&mut self, relation: Relation, ids: &[i64], owner: i64) {
        self.clear_owner(relation, owner);
        let rows = self.pivots.entry(relation).or_default();
        rows.extend(ids.iter().map(|id| (owner, *id)));
    }

    fn check_user_patch(&self, id: UserId, patch: &UserPatch) -> DomainResult<()> {
        if !self.users.contains_key(&id.get()) {
            return Err(DomainError::NotFound);
        }
        if self.email_taken(&patch.email, Some(id.get())) {
            return Err(DomainError::validation("email", "has already been taken"));
        }
        Ok(())
    }

    fn apply_user_patch(&mut self, id: UserId, patch: UserPatch) -> DomainResult<User> {
        let user = self.users.get_mut(&id.get()).ok_or(DomainError::NotFound)?;
        user.name = patch.name;
        user.email = patch.email.into();
        if let Some(hash) = patch.password_hash {
            user.password_hash = hash;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    fn insert_role(&mut self, draft: RoleDraft) -> Role {
        self.last_role_id += 1;
        let now = Utc::now();
        let role = Role {
            id: RoleId::new(self.last_role_id),
            name: draft.name,
            description: draft.description,
            created_at: now,
            updated_at: now,
        };
        self.roles.insert(role.id.get(), role.clone());
        role
    }

    fn apply_role_draft(&mut self, id: RoleId, draft: RoleDraft) -> DomainResult<Role> {
        let role = self.roles.get_mut(&id.get()).ok_or(DomainError::NotFound)?;
        role.name = draft.name;
        role.description = draft.description;
        role.updated_at = Utc::now();
        Ok(role.clone())
    }

    fn email_taken(&self, email: &Email, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email.as_str() && Some(u.id.get()) != except)
    }

    fn permissions_of(&self, ids: impl IntoIterator<Item = i64>) -> Vec<Permission> {
        ids.into_iter()
            .filter_map(|id| self.permissions.get(&id).cloned())
            .collect()
    }
}

/// In-memory store implementing every repository.
///
/// Intended for tests/dev. A single lock guards all tables, so each call is
/// atomic with respect to the others.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self, on_error: DomainError) -> DomainResult<RwLockReadGuard<'_, State>> {
        self.state.read().map_err(|_| {
            error!("in-memory store lock poisoned");
            on_error
        })
    }

    fn write(&self, on_error: DomainError) -> DomainResult<RwLockWriteGuard<'_, State>> {
        self.state.write().map_err(|_| {
            error!("in-memory store lock poisoned");
            on_error
        })
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn fetch(&self) -> DomainResult<Vec<User>> {
        Ok(self.read(DomainError::Fetch)?.users.values().cloned().collect())
    }

    async fn get_by_id(&self, id: UserId) -> DomainResult<User> {
        self.read(DomainError::Fetch)?
            .users
            .get(&id.get())
            .cloned()
            .ok_or(DomainError::NotFound)
    }

    async fn get_by_email(&self, email: &Email) -> DomainResult<User> {
        self.read(DomainError::Fetch)?
            .users
            .values()
            .find(|u| u.email == email.as_str())
            .cloned()
            .ok_or(DomainError::NotFound)
    }

    async fn store(&self, draft: UserDraft) -> DomainResult<User> {
        let mut state = self.write(DomainError::Store)?;
        if state.email_taken(&draft.email, None) {
            return Err(DomainError::validation("email", "has already been taken"));
        }

        state.last_user_id += 1;
        let now = Utc::now();
        let user = User {
            id: UserId::new(state.last_user_id),
            name: draft.name,
            email: draft.email.into(),
            password_hash: draft.password_hash,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id.get(), user.clone());
        Ok(user)
    }

    async fn update_with_assignments(
        &self,
        id: UserId,
        patch: UserPatch,
        roles: Option<&[i64]>,
        permissions: Option<&[i64]>,
    ) -> DomainResult<User> {
        let roles = roles.map(normalize_ids);
        let permissions = permissions.map(normalize_ids);

        let mut state = self.write(DomainError::Update)?;
        state.check_user_patch(id, &patch)?;
        if let Some(ids) = &roles {
            state.require_members(Relation::RoleUser, ids)?;
        }
        if let Some(ids) = &permissions {
            state.require_members(Relation::PermissionUser, ids)?;
        }

        let user = state.apply_user_patch(id, patch)?;
        if let Some(ids) = &roles {
            state.set_members(Relation::RoleUser, ids, id.get());
        }
        if let Some(ids) = &permissions {
            state.set_members(Relation::PermissionUser, ids, id.get());
        }
        Ok(user)
    }

    async fn delete(&self, id: UserId) -> DomainResult<()> {
        let mut state = self.write(DomainError::Delete)?;
        state.users.remove(&id.get()).ok_or(DomainError::NotFound)?;
        state.clear_owner(Relation::RoleUser, id.get());
        state.clear_owner(Relation::PermissionUser, id.get());
        Ok(())
    }
}

#[async_trait]
impl RoleRepository for InMemoryStore {
    async fn fetch(&self) -> DomainResult<Vec<Role>> {
        Ok(self.read(DomainError::Fetch)?.roles.values().cloned().collect())
    }

    async fn get_by_id(&self, id: RoleId) -> DomainResult<Role> {
        self.read(DomainError::Fetch)?
            .roles
            .get(&id.get())
            .cloned()
            .ok_or(DomainError::NotFound)
    }

    async fn store_with_permissions(
        &self,
        draft: RoleDraft,
        permissions: &[i64],
    ) -> DomainResult<Role> {
        let permissions = normalize_ids(permissions);
        let mut state = self.write(DomainError::Store)?;
        state.require_members(Relation::PermissionRole, &permissions)?;

        let role = state.insert_role(draft);
        state.set_members(Relation::PermissionRole, &permissions, role.id.get());
        Ok(role)
    }

    async fn update_with_permissions(
        &self,
        id: RoleId,
        draft: RoleDraft,
        permissions: Option<&[i64]>,
    ) -> DomainResult<Role> {
        let permissions = permissions.map(normalize_ids);
        let mut state = self.write(DomainError::Update)?;
        if !state.roles.contains_key(&id.get()) {
            return Err(DomainError::NotFound);
        }
        if let Some(ids) = &permissions {
            state.require_members(Relation::PermissionRole, ids)?;
        }

        let role = state.apply_role_draft(id, draft)?;
        if let Some(ids) = &permissions {
            state.set_members(Relation::PermissionRole, ids, id.get());
        }
        Ok(role)
    }

    async fn delete(&self, id: RoleId) -> DomainResult<()> {
        let mut state = self.write(DomainError::Delete)?;
        state.roles.remove(&id.get()).ok_or(DomainError::NotFound)?;
        state.clear_member(Relation::RoleUser, id.get());
        state.clear_owner(Relation::PermissionRole, id.get());
        Ok(())
    }

    async fn get_by_user_id(&self, user_id: UserId) -> DomainResult<Vec<Role>> {
        let state = self.read(DomainError::Fetch)?;
        Ok(state
            .members(Relation::RoleUser, user_id.get())
            .into_iter()
            .filter_map(|id| state.roles.get(&id).cloned())
            .collect())
    }
}

#[async_trait]
impl PermissionRepository for InMemoryStore {
    async fn fetch(&self) -> DomainResult<Vec<Permission>> {
        Ok(self
            .read(DomainError::Fetch)?
            .permissions
            .values()
            .cloned()
            .collect())
    }

    async fn get_by_id(&self, id: PermissionId) -> DomainResult<Permission> {
        self.read(DomainError::Fetch)?
            .permissions
            .get(&id.get())
            .cloned()
            .ok_or(DomainError::NotFound)
    }

    async fn store(&self, draft: PermissionDraft) -> DomainResult<Permission> {
        let mut state = self.write(DomainError::Store)?;
        state.last_permission_id += 1;
        let now = Utc::now();
        let permission = Permission {
            id: PermissionId::new(state.last_permission_id),
            name: draft.name,
            description: draft.description,
            created_at: now,
            updated_at: now,
        };
        state
            .permissions
            .insert(permission.id.get(), permission.clone());
        Ok(permission)
    }

    async fn update(&self, id: PermissionId, draft: PermissionDraft) -> DomainResult<Permission> {
        let mut state = self.write(DomainError::Update)?;
        let permission = state
            .permissions
            .get_mut(&id.get())
            .ok_or(DomainError::NotFound)?;
        permission.name = draft.name;
        permission.description = draft.description;
        permission.updated_at = Utc::now();
        Ok(permission.clone())
    }

    async fn delete(&self, id: PermissionId) -> DomainResult<()> {
        let mut state = self.write(DomainError::Delete)?;
        state
            .permissions
            .remove(&id.get())
            .ok_or(DomainError::NotFound)?;
        state.clear_member(Relation::PermissionRole, id.get());
        state.clear_member(Relation::PermissionUser, id.get());
        Ok(())
    }

    async fn get_by_role_id(&self, role_id: RoleId) -> DomainResult<Vec<Permission>> {
        let state = self.read(DomainError::Fetch)?;
        Ok(state.permissions_of(state.members(Relation::PermissionRole, role_id.get())))
    }

    async fn get_by_role_name(&self, role_name: &str) -> DomainResult<Vec<Permission>> {
        let state = self.read(DomainError::Fetch)?;
        let ids: BTreeSet<i64> = state
            .roles
            .values()
            .filter(|r| r.name == role_name)
            .flat_map(|r| state.members(Relation::PermissionRole, r.id.get()))
            .collect();
        Ok(state.permissions_of(ids))
    }

    async fn get_by_user_id(&self, user_id: UserId) -> DomainResult<Vec<Permission>> {
        let state = self.read(DomainError::Fetch)?;
        let mut ids: BTreeSet<i64> = state
            .members(Relation::PermissionUser, user_id.get())
            .into_iter()
            .collect();
        for role_id in state.members(Relation::RoleUser, user_id.get()) {
            ids.extend(state.members(Relation::PermissionRole, role_id));
        }

        // One entry per name; the lowest id wins.
        let mut by_name: BTreeMap<String, Permission> = BTreeMap::new();
        for permission in state.permissions_of(ids) {
            by_name.entry(permission.name.clone()).or_insert(permission);
        }
        Ok(by_name.into_values().collect())
    }
}

#[async_trait]
impl AssignmentStore for InMemoryStore {
    async fn assign(&self, relation: Relation, ids: &[i64], owner: i64) -> DomainResult<()> {
        require_ids(ids)?;
        let ids = normalize_ids(ids);
        let mut state = self.write(DomainError::Assignment)?;
        state.replace(relation, &ids, owner).map_err(|detail| {
            error!(%relation, owner, error = %detail, "assign failed");
            DomainError::Assignment
        })?;
        debug!(%relation, owner, count = ids.len(), "assigned");
        Ok(())
    }

    async fn remove(&self, relation: Relation, ids: &[i64], owner: i64) -> DomainResult<()> {
        let mut state = self.write(DomainError::Removal)?;
        let removed = state.clear_owner(relation, owner);
        debug!(%relation, owner, requested = ids.len(), removed, "removed");
        Ok(())
    }

    async fn sync(&self, relation: Relation, ids: &[i64], owner: i64) -> DomainResult<()> {
        let ids = normalize_ids(ids);
        let mut state = self.write(DomainError::Sync)?;
        if ids.is_empty() {
            state.clear_owner(relation, owner);
        } else {
            state.replace(relation, &ids, owner).map_err(|detail| {
                error!(%relation, owner, error = %detail, "sync failed");
                DomainError::Sync
            })?;
        }
        debug!(%relation, owner, count = ids.len(), "synced");
        Ok(())
    }

    async fn members(&self, relation: Relation, owner: i64) -> DomainResult<Vec<i64>> {
        Ok(self.read(DomainError::Fetch)?.members(relation, owner))
    }
}
