//! Gate check at the handler boundary.
//!
//! Every protected handler calls [`require`] before touching a usecase, so an
//! unauthorized caller never reaches business logic.

use puppetmaster_auth::{AuthorizationGate, PermissionName};
use puppetmaster_core::{DomainError, DomainResult};

use crate::context::RequestIdentity;

/// `Unauthorized` unless the gate allows `permission` for the caller.
pub async fn require(
    gate: &AuthorizationGate,
    identity: &RequestIdentity,
    permission: &PermissionName,
) -> DomainResult<()> {
    if gate.authorize(identity.get(), permission, &[]).await {
        Ok(())
    } else {
        Err(DomainError::Unauthorized)
    }
}
