use axum::{extract::Extension, http::StatusCode, Json};
use serde_json::{json, Value};

use puppetmaster_core::DomainError;

use crate::app::errors::ApiError;
use crate::context::RequestIdentity;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// Claims carried by the caller's token, as issued. The gate decides on the
/// cached snapshot instead, so `roles` and `permissions` here may be stale;
/// `claims_source` says so in the body.
pub async fn whoami(
    Extension(identity): Extension<RequestIdentity>,
) -> Result<Json<Value>, ApiError> {
    let identity = identity.get().ok_or(DomainError::Unauthorized)?;
    let bundle = identity.bundle();

    Ok(Json(json!({
        "user_id": bundle.user_id,
        "name": bundle.name,
        "email": bundle.email,
        "roles": bundle.roles.iter().map(|r| r.as_str()).collect::<Vec<_>>(),
        "permissions": bundle.permissions.iter().map(|p| p.as_str()).collect::<Vec<_>>(),
        "token_id": identity.token_id().to_string(),
        "expires_at": identity.expires_at(),
        "claims_source": "token",
    })))
}
