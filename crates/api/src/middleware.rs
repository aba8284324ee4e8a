use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use puppetmaster_auth::{extract_bearer, Identity, TokenError, TokenService};
use puppetmaster_core::DomainError;

use crate::app::errors::domain_error_to_response;
use crate::context::RequestIdentity;

#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<TokenService>,
}

/// Resolve the bearer token into a [`RequestIdentity`].
///
/// No `Authorization` header means an anonymous caller; a header that does not
/// hold a valid access token is rejected with 401 before reaching a handler.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let identity = match resolve(&state, req.headers()) {
        Ok(identity) => identity,
        Err(e) => {
            debug!(error = %e, "rejected bearer token");
            return Err(domain_error_to_response(DomainError::from(e)));
        }
    };

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

fn resolve(state: &AuthState, headers: &HeaderMap) -> Result<RequestIdentity, TokenError> {
    let Some(header) = headers.get(AUTHORIZATION) else {
        return Ok(RequestIdentity::anonymous());
    };

    let header = header.to_str().map_err(|_| TokenError::Malformed)?;
    let token = extract_bearer(header)?;
    let claims = state.tokens.parse_and_verify(token)?;

    Ok(RequestIdentity::authenticated(Identity::from_claims(claims)))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use chrono::{Duration, Utc};
    use puppetmaster_auth::{ClaimBundle, TokenConfig};
    use puppetmaster_core::UserId;

    use super::*;

    fn state() -> AuthState {
        AuthState {
            tokens: Arc::new(TokenService::new(TokenConfig::new("test-secret")).unwrap()),
        }
    }

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn bundle() -> ClaimBundle {
        ClaimBundle {
            user_id: UserId::new(5),
            name: "Ana".into(),
            email: "a@b.com".into(),
            roles: vec![],
            permissions: vec![],
        }
    }

    #[test]
    fn missing_header_is_anonymous() {
        let identity = resolve(&state(), &HeaderMap::new()).unwrap();
        assert!(identity.get().is_none());
    }

    #[test]
    fn valid_bearer_resolves_identity() {
        let state = state();
        let token = state
            .tokens
            .issue_token(&bundle(), Utc::now() + Duration::minutes(5))
            .unwrap();
        let identity = resolve(&state, &headers(&format!("Bearer {token}"))).unwrap();
        assert_eq!(identity.get().unwrap().user_id(), UserId::new(5));
    }

    #[test]
    fn bad_headers_map_to_token_errors() {
        let state = state();
        let token = state
            .tokens
            .issue_token(&bundle(), Utc::now() - Duration::minutes(5))
            .unwrap();

        assert_eq!(
            resolve(&state, &headers(&token)).unwrap_err(),
            TokenError::Malformed
        );
        assert_eq!(
            resolve(&state, &headers(&format!("Bearer {token}"))).unwrap_err(),
            TokenError::Expired
        );
    }
}
