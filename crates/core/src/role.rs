//! Role entity: a named group of permissions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::DomainResult;
use crate::id::{PermissionId, RoleId};
use crate::value_object::required_text;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Role {
    type Id = RoleId;

    fn id(&self) -> RoleId {
        self.id
    }
}

/// Row-level payload for inserting or updating a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleDraft {
    pub name: String,
    pub description: String,
}

impl RoleDraft {
    pub fn parse(name: &str, description: &str) -> DomainResult<Self> {
        Ok(Self {
            name: required_text("name", name)?,
            description: required_text("description", description)?,
        })
    }
}

/// Validated input for creating a role, with its initial permission set.
#[derive(Debug, Clone)]
pub struct NewRole {
    pub draft: RoleDraft,
    pub permissions: Vec<PermissionId>,
}

/// Validated input for updating a role.
///
/// `permissions`, when present, replaces the role's permission set.
#[derive(Debug, Clone)]
pub struct RoleChanges {
    pub id: RoleId,
    pub draft: RoleDraft,
    pub permissions: Option<Vec<PermissionId>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_requires_name_and_description() {
        assert!(RoleDraft::parse("editor", "edits things").is_ok());
        assert_eq!(
            RoleDraft::parse("editor", " ").unwrap_err().to_string(),
            "the description field is required"
        );
        assert_eq!(
            RoleDraft::parse("", "x").unwrap_err().to_string(),
            "the name field is required"
        );
    }
}
