use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use puppetmaster_auth::catalog;
use puppetmaster_core::{Permission, PermissionId, Role, RoleId, User, UserId, UserProfile};

use crate::app::dto::{CreateUserRequest, IdsRequest, ListResponse, MessageResponse, UpdateUserRequest};
use crate::app::errors::{ApiError, ValidJson};
use crate::app::services::AppServices;
use crate::authz::require;
use crate::context::RequestIdentity;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
        .route("/:id/roles", get(user_roles))
        .route("/:id/roles/assign", post(assign_roles))
        .route("/:id/roles/remove", post(remove_roles))
        .route("/:id/roles/sync", post(sync_roles))
        .route("/:id/permissions", get(user_permissions))
        .route("/:id/permissions/assign", post(give_permissions))
        .route("/:id/permissions/remove", post(remove_permissions))
        .route("/:id/permissions/sync", post(sync_permissions))
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
) -> Result<Json<ListResponse<User>>, ApiError> {
    require(&services.gate, &identity, &catalog::USER_READ).await?;
    Ok(Json(services.users.fetch().await?.into()))
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Path(id): Path<String>,
) -> Result<Json<UserProfile>, ApiError> {
    require(&services.gate, &identity, &catalog::USER_READ).await?;
    let id: UserId = id.parse()?;
    Ok(Json(services.users.get_by_id(id).await?))
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    ValidJson(body): ValidJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    require(&services.gate, &identity, &catalog::USER_CREATE).await?;
    let user = services.users.store(body.into_input()?).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    require(&services.gate, &identity, &catalog::USER_UPDATE).await?;
    let id: UserId = id.parse()?;
    Ok(Json(services.users.update(body.into_input(id)?).await?))
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    require(&services.gate, &identity, &catalog::USER_DELETE).await?;
    let id: UserId = id.parse()?;
    services.users.delete(id).await?;
    Ok(Json(MessageResponse {
        message: "user deleted",
    }))
}

pub async fn user_roles(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Path(id): Path<String>,
) -> Result<Json<ListResponse<Role>>, ApiError> {
    require(&services.gate, &identity, &catalog::ROLE_READ).await?;
    let id: UserId = id.parse()?;
    Ok(Json(services.roles.get_by_user_id(id).await?.into()))
}

pub async fn assign_roles(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<IdsRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    require(&services.gate, &identity, &catalog::ROLE_ASSIGN).await?;
    let id: UserId = id.parse()?;
    let ids: Vec<RoleId> = body.typed()?;
    services.roles.assign_role(&ids, id).await?;
    Ok(Json(MessageResponse {
        message: "roles assigned",
    }))
}

pub async fn remove_roles(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<IdsRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    require(&services.gate, &identity, &catalog::ROLE_ASSIGN).await?;
    let id: UserId = id.parse()?;
    let ids: Vec<RoleId> = body.typed()?;
    services.roles.remove_role(&ids, id).await?;
    Ok(Json(MessageResponse {
        message: "roles removed",
    }))
}

pub async fn sync_roles(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<IdsRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    require(&services.gate, &identity, &catalog::ROLE_ASSIGN).await?;
    let id: UserId = id.parse()?;
    let ids: Vec<RoleId> = body.typed()?;
    services.roles.sync_role(&ids, id).await?;
    Ok(Json(MessageResponse {
        message: "roles synced",
    }))
}

pub async fn user_permissions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Path(id): Path<String>,
) -> Result<Json<ListResponse<Permission>>, ApiError> {
    require(&services.gate, &identity, &catalog::PERMISSION_READ).await?;
    let id: UserId = id.parse()?;
    Ok(Json(services.permissions.get_by_user_id(id).await?.into()))
}

pub async fn give_permissions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<IdsRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    require(&services.gate, &identity, &catalog::PERMISSION_ASSIGN).await?;
    let id: UserId = id.parse()?;
    let ids: Vec<PermissionId> = body.typed()?;
    services.permissions.give_to_user(&ids, id).await?;
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
    let id: UserId = id.parse()?;
    let ids: Vec<PermissionId> = body.typed()?;
    services.permissions.remove_from_user(&ids, id).await?;
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
    let id: UserId = id.parse()?;
    let ids: Vec<PermissionId> = body.typed()?;
    services.permissions.sync_to_user(&ids, id).await?;
    Ok(Json(MessageResponse {
        message: "permissions synced",
    }))
}
