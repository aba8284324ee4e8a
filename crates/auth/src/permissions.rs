use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission name (e.g. `"user.read"`).
///
/// Matching is exact string equality: no hierarchy, no wildcards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionName(Cow<'static, str>);

impl PermissionName {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for PermissionName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for PermissionName {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Permissions required by the built-in resolvers.
pub mod catalog {
    use super::PermissionName;

    pub const USER_READ: PermissionName = PermissionName::from_static("user.read");
    pub const USER_CREATE: PermissionName = PermissionName::from_static("user.create");
    pub const USER_UPDATE: PermissionName = PermissionName::from_static("user.update");
    pub const USER_DELETE: PermissionName = PermissionName::from_static("user.delete");

    pub const ROLE_READ: PermissionName = PermissionName::from_static("role.read");
    pub const ROLE_CREATE: PermissionName = PermissionName::from_static("role.create");
    pub const ROLE_UPDATE: PermissionName = PermissionName::from_static("role.update");
    pub const ROLE_DELETE: PermissionName = PermissionName::from_static("role.delete");
    pub const ROLE_ASSIGN: PermissionName = PermissionName::from_static("role.assign");

    pub const PERMISSION_READ: PermissionName = PermissionName::from_static("permission.read");
    pub const PERMISSION_CREATE: PermissionName = PermissionName::from_static("permission.create");
    pub const PERMISSION_UPDATE: PermissionName = PermissionName::from_static("permission.update");
    pub const PERMISSION_DELETE: PermissionName = PermissionName::from_static("permission.delete");
    pub const PERMISSION_ASSIGN: PermissionName = PermissionName::from_static("permission.assign");

    /// Every catalogue entry, for seeding.
    pub const ALL: &[PermissionName] = &[
        USER_READ,
        USER_CREATE,
        USER_UPDATE,
        USER_DELETE,
        ROLE_READ,
        ROLE_CREATE,
        ROLE_UPDATE,
        ROLE_DELETE,
        ROLE_ASSIGN,
        PERMISSION_READ,
        PERMISSION_CREATE,
        PERMISSION_UPDATE,
        PERMISSION_DELETE,
        PERMISSION_ASSIGN,
    ];
}
