use axum::{
    routing::{get, post},
    Router,
};

pub mod auth;
pub mod permissions;
pub mod roles;
pub mod system;
pub mod users;

/// Endpoints reachable without a token.
pub fn public_router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/auth/authenticate", post(auth::authenticate))
        .route("/auth/refresh", post(auth::refresh))
}

/// Endpoints behind the bearer middleware; each handler consults the gate.
pub fn protected_router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/users", users::router())
        .nest("/roles", roles::router())
        .nest("/permissions", permissions::router())
}
