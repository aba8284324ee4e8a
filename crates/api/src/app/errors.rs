use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;

use puppetmaster_core::DomainError;

/// Handler error: a taxonomy kind rendered as a JSON error body.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub DomainError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        domain_error_to_response(self.0)
    }
}

pub fn status_for(err: &DomainError) -> StatusCode {
    match err {
        DomainError::NotFound => StatusCode::NOT_FOUND,
        DomainError::BadRequest(_) => StatusCode::BAD_REQUEST,
        DomainError::ValidationFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        DomainError::Unauthorized
        | DomainError::InvalidToken
        | DomainError::ExpiredToken
        | DomainError::MalformedToken => StatusCode::UNAUTHORIZED,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn domain_error_to_response(err: DomainError) -> Response {
    json_error(status_for(&err), err.code(), err.to_string())
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// `Json<T>` whose rejections become `bad_request` error bodies.
pub struct ValidJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError(rejection_to_domain(rejection))),
        }
    }
}

fn rejection_to_domain(rejection: JsonRejection) -> DomainError {
    DomainError::bad_request(rejection.body_text())
}
