use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use puppetmaster_core::UserId;

use crate::{PermissionName, RoleName};

/// Identity + authorization payload embedded in an access token.
///
/// Also the shape of the cached snapshot: the cache stores exactly what the
/// token was issued with, keyed by `user_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimBundle {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub roles: Vec<RoleName>,
    pub permissions: Vec<PermissionName>,
}

impl ClaimBundle {
    pub fn has_role(&self, role: &RoleName) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn has_permission(&self, permission: &PermissionName) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

/// Registered + application claims of an access token.
///
/// Timestamps are seconds since the epoch, as the JWT format requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
    /// Unique token id.
    pub jti: Uuid,
    pub auth: ClaimBundle,
}

impl AccessClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// Claims of a refresh token: only the user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
    pub user_id: UserId,
}

/// Token pair returned to the client after authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    pub token: String,
    pub refresh_token: String,
}
