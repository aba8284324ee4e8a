use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use puppetmaster_core::DomainError;

use crate::claims::ClaimBundle;
use crate::principal::Identity;
use crate::snapshot::{ClaimStore, ClaimStoreError};
use crate::{PermissionName, RoleName};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("no identity in request context")]
    Anonymous,

    #[error("no usable authorization snapshot")]
    SnapshotUnavailable,

    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

impl From<AuthzError> for DomainError {
    /// Every denial looks the same to the caller.
    fn from(_: AuthzError) -> Self {
        DomainError::Unauthorized
    }
}

/// What a protected operation asks of its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub permission: PermissionName,
    /// Holding any one of these roles is sufficient.
    pub roles: Vec<RoleName>,
}

impl Requirement {
    pub fn permission(permission: PermissionName) -> Self {
        Self {
            permission,
            roles: Vec::new(),
        }
    }

    pub fn or_roles(mut self, roles: impl IntoIterator<Item = RoleName>) -> Self {
        self.roles.extend(roles);
        self
    }
}

/// Pure policy check over a claim snapshot.
///
/// - No IO
/// - No panics
pub fn authorize(
    snapshot: &ClaimBundle,
    required: &Requirement,
    admin_role: &RoleName,
) -> Result<(), AuthzError> {
    if snapshot.has_role(admin_role) {
        return Ok(());
    }

    if required.roles.iter().any(|r| snapshot.has_role(r)) {
        return Ok(());
    }

    if snapshot.has_permission(&required.permission) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.permission.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateConfig {
    /// Holders of this role pass every check.
    pub admin_role: RoleName,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            admin_role: RoleName::ADMIN,
        }
    }
}

/// Authorization decision point for protected operations.
///
/// Decisions are made against the cached snapshot for the caller, not the
/// token's embedded claims, so dropping a snapshot revokes access for every
/// live token of that user.
#[derive(Clone)]
pub struct AuthorizationGate {
    config: GateConfig,
    snapshots: Arc<dyn ClaimStore>,
}

impl AuthorizationGate {
    pub fn new(config: GateConfig, snapshots: Arc<dyn ClaimStore>) -> Self {
        Self { config, snapshots }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Allow/deny for `identity`; `None` is an anonymous caller.
    pub async fn authorize(
        &self,
        identity: Option<&Identity>,
        required: &PermissionName,
        required_roles: &[RoleName],
    ) -> bool {
        let requirement = Requirement {
            permission: required.clone(),
            roles: required_roles.to_vec(),
        };
        self.check(identity, &requirement).await.is_ok()
    }

    /// Same decision as [`authorize`](Self::authorize), with the reason for a denial.
    pub async fn check(
        &self,
        identity: Option<&Identity>,
        required: &Requirement,
    ) -> Result<(), AuthzError> {
        let Some(identity) = identity else {
            debug!(permission = %required.permission, "denied: anonymous caller");
            return Err(AuthzError::Anonymous);
        };

        let user_id = identity.user_id();
        let snapshot = match self.snapshots.get(user_id).await {
            Ok(snapshot) => snapshot,
            Err(ClaimStoreError::Miss) => {
                debug!(%user_id, "denied: no cached snapshot");
                return Err(AuthzError::SnapshotUnavailable);
            }
            Err(e) => {
                warn!(%user_id, error = %e, "denied: snapshot unreadable");
                return Err(AuthzError::SnapshotUnavailable);
            }
        };

        let decision = authorize(&snapshot, required, &self.config.admin_role);
        if let Err(e) = &decision {
            debug!(%user_id, reason = %e, "denied");
        }
        decision
    }
}
