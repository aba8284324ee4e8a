use std::sync::Arc;

use axum::{extract::Extension, Json};

use puppetmaster_auth::AuthToken;

use crate::app::dto::{AuthenticateRequest, RefreshRequest};
use crate::app::errors::{ApiError, ValidJson};
use crate::app::services::AppServices;

pub async fn authenticate(
    Extension(services): Extension<Arc<AppServices>>,
    ValidJson(body): ValidJson<AuthenticateRequest>,
) -> Result<Json<AuthToken>, ApiError> {
    let pair = services
        .auth
        .authenticate(&body.email, &body.password)
        .await?;
    Ok(Json(pair))
}

pub async fn refresh(
    Extension(services): Extension<Arc<AppServices>>,
    ValidJson(body): ValidJson<RefreshRequest>,
) -> Result<Json<AuthToken>, ApiError> {
    Ok(Json(services.auth.refresh(&body.refresh_token).await?))
}
