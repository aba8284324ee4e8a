use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use puppetmaster_auth::catalog;
use puppetmaster_core::{Permission, PermissionId};

use crate::app::dto::{ListResponse, MessageResponse, PermissionRequest};
use crate::app::errors::{ApiError, ValidJson};
use crate::app::services::AppServices;
use crate::authz::require;
use crate::context::RequestIdentity;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_permissions).post(create_permission))
        .route(
            "/:id",
            get(get_permission)
                .put(update_permission)
                .delete(delete_permission),
        )
}

pub async fn list_permissions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
) -> Result<Json<ListResponse<Permission>>, ApiError> {
    require(&services.gate, &identity, &catalog::PERMISSION_READ).await?;
    Ok(Json(services.permissions.fetch().await?.into()))
}

pub async fn get_permission(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Path(id): Path<String>,
) -> Result<Json<Permission>, ApiError> {
    require(&services.gate, &identity, &catalog::PERMISSION_READ).await?;
    let id: PermissionId = id.parse()?;
    Ok(Json(services.permissions.get_by_id(id).await?))
}

pub async fn create_permission(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    ValidJson(body): ValidJson<PermissionRequest>,
) -> Result<(StatusCode, Json<Permission>), ApiError> {
    require(&services.gate, &identity, &catalog::PERMISSION_CREATE).await?;
    let permission = services.permissions.store(body.into_draft()?).await?;
    Ok((StatusCode::CREATED, Json(permission)))
}

pub async fn update_permission(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<PermissionRequest>,
) -> Result<Json<Permission>, ApiError> {
    require(&services.gate, &identity, &catalog::PERMISSION_UPDATE).await?;
    let id: PermissionId = id.parse()?;
    Ok(Json(services.permissions.update(id, body.into_draft()?).await?))
}

pub async fn delete_permission(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    require(&services.gate, &identity, &catalog::PERMISSION_DELETE).await?;
    let id: PermissionId = id.parse()?;
    services.permissions.delete(id).await?;
    Ok(Json(MessageResponse {
        message: "permission deleted",
    }))
}
