use serde::{Deserialize, Serialize};

use puppetmaster_core::{
    DomainError, DomainResult, NewRole, NewUser, PermissionDraft, PermissionId, RoleChanges,
    RoleDraft, RoleId, UserChanges, UserId,
};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct AuthenticateRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl CreateUserRequest {
    pub fn into_input(self) -> DomainResult<NewUser> {
        NewUser::parse(&self.name, &self.email, self.password)
    }
}

/// Full replacement of the user's fields; omitted lists leave assignments untouched.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: String,
    pub email: String,
    pub password: Option<String>,
    pub roles: Option<Vec<i64>>,
    pub permissions: Option<Vec<i64>>,
}

impl UpdateUserRequest {
    pub fn into_input(self, id: UserId) -> DomainResult<UserChanges> {
        let roles = self.roles.map(|ids| typed_ids::<RoleId>(&ids, "roles")).transpose()?;
        let permissions = self
            .permissions
            .map(|ids| typed_ids::<PermissionId>(&ids, "permissions"))
            .transpose()?;
        UserChanges::parse(id, &self.name, &self.email, self.password, roles, permissions)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub permissions: Vec<i64>,
}

impl CreateRoleRequest {
    pub fn into_input(self) -> DomainResult<NewRole> {
        Ok(NewRole {
            draft: RoleDraft::parse(&self.name, &self.description)?,
            permissions: typed_ids(&self.permissions, "permissions")?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub name: String,
    pub description: String,
    pub permissions: Option<Vec<i64>>,
}

impl UpdateRoleRequest {
    pub fn into_input(self, id: RoleId) -> DomainResult<RoleChanges> {
        Ok(RoleChanges {
            id,
            draft: RoleDraft::parse(&self.name, &self.description)?,
            permissions: self
                .permissions
                .map(|ids| typed_ids(&ids, "permissions"))
                .transpose()?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct PermissionRequest {
    pub name: String,
    pub description: String,
}

impl PermissionRequest {
    pub fn into_draft(self) -> DomainResult<PermissionDraft> {
        PermissionDraft::parse(&self.name, &self.description)
    }
}

/// Body of every assign/remove/sync call.
#[derive(Debug, Deserialize)]
pub struct IdsRequest {
    #[serde(default)]
    pub ids: Vec<i64>,
}

impl IdsRequest {
    pub fn typed<T: From<i64>>(&self) -> DomainResult<Vec<T>> {
        typed_ids(&self.ids, "ids")
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
}

impl<T> From<Vec<T>> for ListResponse<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

fn typed_ids<T: From<i64>>(ids: &[i64], field: &str) -> DomainResult<Vec<T>> {
    ids.iter()
        .map(|&id| {
            if id > 0 {
                Ok(T::from(id))
            } else {
                Err(DomainError::bad_request(format!("{field}: ids must be positive")))
            }
        })
        .collect()
}
