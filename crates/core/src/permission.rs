//! Permission entity: a named capability.
//!
//! Names are free-form strings. There is no hierarchy or wildcard matching.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::DomainResult;
use crate::id::PermissionId;
use crate::value_object::required_text;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Permission {
    type Id = PermissionId;

    fn id(&self) -> PermissionId {
        self.id
    }
}

/// Row-level payload for inserting or updating a permission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionDraft {
    pub name: String,
    pub description: String,
}

impl PermissionDraft {
    pub fn parse(name: &str, description: &str) -> DomainResult<Self> {
        Ok(Self {
            name: required_text("name", name)?,
            description: required_text("description", description)?,
        })
    }
}

/// Collapse a list of permission names into a sorted, duplicate-free list.
pub fn dedup_names<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut out: Vec<String> = names.into_iter().map(Into::into).collect();
    out.sort();
    out.dedup();
    out
}
