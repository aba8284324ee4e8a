//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store, cache and usecase wiring
//! - `usecases/`: one service per resource, between handlers and repositories
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: typed request bodies and response envelopes
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;

use puppetmaster_infra::Settings;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;
pub mod usecases;

use services::AppServices;

/// Router over already-built services.
pub fn router(services: Arc<AppServices>) -> Router {
    let auth_state = middleware::AuthState {
        tokens: services.tokens.clone(),
    };

    // Protected routes: the middleware resolves the caller, handlers consult the gate.
    let protected = routes::protected_router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    Router::new()
        .merge(routes::public_router())
        .merge(protected)
        .layer(ServiceBuilder::new().layer(Extension(services)))
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(settings: &Settings) -> anyhow::Result<Router> {
    let services = AppServices::from_settings(settings).await?;

    if let Some((email, password)) = settings.admin_credentials() {
        services.seed_admin(email, password).await?;
    }

    Ok(router(Arc::new(services)))
}
