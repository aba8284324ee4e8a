use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use puppetmaster_auth::catalog;
use puppetmaster_core::{Permission, PermissionId, Role, RoleId};

use crate::app::dto::{CreateRoleRequest, IdsRequest, ListResponse, MessageResponse, UpdateRoleRequest};
use crate::app::errors::{ApiError, ValidJson};
use crate::app::services::AppServices;
use crate::authz::require;
use crate::context::RequestIdentity;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_roles).post(create_role))
        .route("/:id", get(get_role).put(update_role).delete(delete_role))
        .route("/by-name/:name/permissions", get(permissions_by_role_name))
        .route("/:id/permissions", get(role_permissions))
        .route("/:id/permissions/assign", post(give_permissions))
        .route("/:id/permissions/remove", post(remove_permissions))
        .route("/:id/permissions/sync", post(sync_permissions))
}

pub async fn list_roles(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
) -> Result<Json<ListResponse<Role>>, ApiError> {
    require(&services.gate, &identity, &catalog::ROLE_READ).await?;
    Ok(Json(services.roles.fetch().await?.into()))
}

pub async fn get_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Path(id): Path<String>,
) -> Result<Json<Role>, ApiError> {
    require(&services.gate, &identity, &catalog::ROLE_READ).await?;
    let id: RoleId = id.parse()?;
    Ok(Json(services.roles.get_by_id(id).await?))
}

pub async fn create_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    ValidJson(body): ValidJson<CreateRoleRequest>,
) -> Result<(StatusCode, Json<Role>), ApiError> {
    require(&services.gate, &identity, &catalog::ROLE_CREATE).await?;
    let role = services.roles.store(body.into_input()?).await?;
    Ok((StatusCode::CREATED, Json(role)))
}

pub async fn update_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<UpdateRoleRequest>,
) -> Result<Json<Role>, ApiError> {
    require(&services.gate, &identity, &catalog::ROLE_UPDATE).await?;
    let id: RoleId = id.parse()?;
    Ok(Json(services.roles.update(body.into_input(id)?).await?))
}

pub async fn delete_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    require(&services.gate, &identity, &catalog::ROLE_DELETE).await?;
    let id: RoleId = id.parse()?;
    services.roles.delete(id).await?;
    Ok(Json(MessageResponse {
        message: "role deleted",
    }))
}

pub async fn role_permissions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Path(id): Path<String>,
) -> Result<Json<ListResponse<Permission>>, ApiError> {
    require(&services.gate, &identity, &catalog::PERMISSION_READ).await?;
    let id: RoleId = id.parse()?;
    Ok(Json(services.permissions.get_by_role_id(id).await?.into()))
}

pub async fn permissions_by_role_name(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Path(name): Path<String>,
) -> Result<Json<ListResponse<Permission>>, ApiError> {
    require(&services.gate, &identity, &catalog::PERMISSION_READ).await?;
    Ok(Json(services.permissions.get_by_role_name(&name).await?.into()))
}

pub async fn give_permissions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<IdsRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    require(&services.gate, &identity, &catalog::PERMISSION_ASSIGN).await?;
    let id: RoleId = id.parse()?;
    let ids: Vec<PermissionId> = body.typed()?;
    services.permissions.give_to_role(&ids, id).await?;
    Ok(Json(MessageResponse {
        message: "permissions assigned",
    }))
}

pub async fn remove_permissions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<IdsRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    require(&services.gate, &identity, &catalog::PERMISSION_ASSIGN).await?;
    let id: RoleId = id.parse()?;
    let ids: Vec<PermissionId> = body.typed()?;
    services.permissions.remove_from_role(&ids, id).await?;
    Ok(Json(MessageResponse {
        message: "permissions removed",
    }))
}

pub async fn sync_permissions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<IdsRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    require(&services.gate, &identity, &catalog::PERMISSION_ASSIGN).await?;
    let id: RoleId = id.parse()?;
    let ids: Vec<PermissionId> = body.typed()?;
    services.permissions.sync_to_role(&ids, id).await?;
    Ok(Json(MessageResponse {
        message: "permissions synced",
    }))
}
