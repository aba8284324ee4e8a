use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use puppetmaster_api::app::{router, services::AppServices};
use puppetmaster_auth::{AccessClaims, ClaimBundle, GateConfig, HashCost, TokenConfig};
use puppetmaster_core::UserId;
use reqwest::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

const JWT_SECRET: &str = "test-secret";
const ADMIN_EMAIL: &str = "root@example.com";
const ADMIN_PASSWORD: &str = "rootpass1";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod over in-memory stores, bound to an ephemeral port.
        let services = AppServices::in_memory(
            TokenConfig::new(JWT_SECRET),
            GateConfig::default(),
            HashCost::new(1, 64),
        )
        .expect("failed to build services");
        services
            .seed_admin(ADMIN_EMAIL, ADMIN_PASSWORD)
            .await
            .expect("failed to seed admin");

        let app = router(Arc::new(services));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/auth/authenticate"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap()
    }

    async fn token(&self, email: &str, password: &str) -> String {
        let res = self.login(email, password).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    async fn admin_token(&self) -> String {
        self.token(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    async fn post(&self, token: &str, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn get(&self, token: &str, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }

    async fn create(&self, token: &str, path: &str, body: Value) -> i64 {
        let res = self.post(token, path, body).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = res.json().await.unwrap();
        body["id"].as_i64().unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn decode(token: &str) -> AccessClaims {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&["Auth Services"]);
    jsonwebtoken::decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(JWT_SECRET.as_bytes()),
        &validation,
    )
    .expect("failed to decode jwt")
    .claims
}

fn mint_jwt(user_id: i64, expires_in: ChronoDuration) -> String {
    let now = Utc::now();
    let claims = AccessClaims {
        iss: "Puppet Master".into(),
        sub: "https://github.com/cyruzin/puppet_master".into(),
        aud: "Auth Services".into(),
        exp: (now + expires_in).timestamp(),
        iat: now.timestamp(),
        jti: Uuid::now_v7(),
        auth: ClaimBundle {
            user_id: UserId::new(user_id),
            name: "Ana".into(),
            email: "a@b.com".into(),
            roles: vec![],
            permissions: vec![],
        },
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn ids(body: &Value) -> Vec<i64> {
    body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn anonymous_callers_are_unauthorized() {
    let srv = TestServer::spawn().await;

    for path in ["/whoami", "/users", "/roles", "/permissions"] {
        let res = srv.client.get(srv.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{path}");
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["error"], "unauthorized");
    }
}

#[tokio::test]
async fn create_user_then_authenticate() {
    let srv = TestServer::spawn().await;
    let admin = srv.admin_token().await;

    srv.create(
        &admin,
        "/users",
        json!({ "name": "Ana", "email": "a@b.com", "password": "longpass1" }),
    )
    .await;

    let res = srv.login("a@b.com", "longpass1").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let token = body["token"].as_str().unwrap();
    assert!(!token.is_empty());
    assert!(!body["refresh_token"].as_str().unwrap().is_empty());
    assert_eq!(decode(token).auth.email, "a@b.com");

    let res = srv.login("a@b.com", "wrongpass1").await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unauthorized");
    assert!(body.get("token").is_none());
}

#[tokio::test]
async fn admin_bypasses_permission_checks() {
    let srv = TestServer::spawn().await;
    let admin = srv.admin_token().await;

    let roles: Value = srv.get(&admin, "/roles").await.json().await.unwrap();
    let admin_role = ids(&roles)[0];
    let res = srv
        .post(
            &admin,
            &format!("/roles/{admin_role}/permissions/sync"),
            json!({ "ids": [] }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    // Fresh snapshot: the admin role with no permissions at all.
    let admin = srv.admin_token().await;
    let res = srv.get(&admin, "/whoami").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["email"], ADMIN_EMAIL);
    assert_eq!(body["claims_source"], "token");
    assert!(body["roles"].as_array().unwrap().iter().any(|r| r == "admin"));
    assert!(body["permissions"].as_array().unwrap().is_empty());

    assert_eq!(srv.get(&admin, "/users").await.status(), StatusCode::OK);
    assert_eq!(srv.get(&admin, "/permissions").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn assign_then_sync_roles() {
    let srv = TestServer::spawn().await;
    let admin = srv.admin_token().await;

    let user = srv
        .create(
            &admin,
            "/users",
            json!({ "name": "Ana", "email": "a@b.com", "password": "longpass1" }),
        )
        .await;
    let first = srv
        .create(&admin, "/roles", json!({ "name": "reader", "description": "reads" }))
        .await;
    let second = srv
        .create(&admin, "/roles", json!({ "name": "writer", "description": "writes" }))
        .await;

    let res = srv
        .post(&admin, &format!("/users/{user}/roles/assign"), json!({ "ids": [first] }))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = srv
        .get(&admin, &format!("/users/{user}/roles"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(ids(&body), vec![first]);

    let res = srv
        .post(&admin, &format!("/users/{user}/roles/sync"), json!({ "ids": [second] }))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = srv
        .get(&admin, &format!("/users/{user}/roles"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(ids(&body), vec![second]);

    let res = srv
        .post(&admin, &format!("/users/{user}/roles/sync"), json!({ "ids": [] }))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = srv
        .get(&admin, &format!("/users/{user}/roles"))
        .await
        .json()
        .await
        .unwrap();
    assert!(ids(&body).is_empty());
}

#[tokio::test]
async fn assign_without_ids_is_a_bad_request() {
    let srv = TestServer::spawn().await;
    let admin = srv.admin_token().await;

    let res = srv.post(&admin, "/users/1/roles/assign", json!({ "ids": [] })).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = srv.post(&admin, "/users/abc/roles/assign", json!({ "ids": [1] })).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn bad_bearer_headers_are_rejected() {
    let srv = TestServer::spawn().await;

    let res = srv
        .client
        .get(srv.url("/whoami"))
        .header("Authorization", "Token abc")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "malformed_token");

    let expired = mint_jwt(1, ChronoDuration::minutes(-5));
    let body: Value = srv.get(&expired, "/whoami").await.json().await.unwrap();
    assert_eq!(body["error"], "expired_token");

    let forged = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &decode(&mint_jwt(1, ChronoDuration::minutes(5))),
        &EncodingKey::from_secret(b"another-secret"),
    )
    .unwrap();
    let body: Value = srv.get(&forged, "/whoami").await.json().await.unwrap();
    assert_eq!(body["error"], "invalid_token");
}

#[tokio::test]
async fn valid_token_without_snapshot_is_denied() {
    let srv = TestServer::spawn().await;

    // Signed correctly, but the user never authenticated so no snapshot exists.
    let token = mint_jwt(999, ChronoDuration::minutes(5));
    let res = srv.get(&token, "/users").await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn short_password_is_a_field_error() {
    let srv = TestServer::spawn().await;
    let admin = srv.admin_token().await;

    let res = srv
        .post(
            &admin,
            "/users",
            json!({ "name": "Ana", "email": "a@b.com", "password": "short" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_failed");

    let res = srv.post(&admin, "/users", json!({ "name": "Ana" })).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn direct_grant_takes_effect_for_a_live_token() {
    let srv = TestServer::spawn().await;
    let admin = srv.admin_token().await;

    let user = srv
        .create(
            &admin,
            "/users",
            json!({ "name": "Ana", "email": "a@b.com", "password": "longpass1" }),
        )
        .await;
    let permissions: Value = srv.get(&admin, "/permissions").await.json().await.unwrap();
    let user_read = permissions["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["name"] == "user.read")
        .unwrap()["id"]
        .as_i64()
        .unwrap();

    let token = srv.token("a@b.com", "longpass1").await;
    assert_eq!(srv.get(&token, "/users").await.status(), StatusCode::UNAUTHORIZED);

    let res = srv
        .post(
            &admin,
            &format!("/users/{user}/permissions/assign"),
            json!({ "ids": [user_read] }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    assert_eq!(srv.get(&token, "/users").await.status(), StatusCode::OK);
    assert_eq!(srv.get(&token, "/roles").await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn deleted_user_token_stops_working() {
    let srv = TestServer::spawn().await;
    let admin = srv.admin_token().await;

    let user = srv
        .create(
            &admin,
            "/users",
            json!({ "name": "Ana", "email": "a@b.com", "password": "longpass1" }),
        )
        .await;
    let token = srv.token("a@b.com", "longpass1").await;
    assert_eq!(srv.get(&token, "/whoami").await.status(), StatusCode::OK);

    let res = srv
        .client
        .delete(srv.url(&format!("/users/{user}")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    assert_eq!(srv.get(&token, "/users").await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        srv.get(&admin, &format!("/users/{user}")).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn refresh_issues_a_new_pair() {
    let srv = TestServer::spawn().await;

    let res = srv.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let body: Value = res.json().await.unwrap();
    let refresh = body["refresh_token"].as_str().unwrap();

    let res = srv
        .client
        .post(srv.url("/auth/refresh"))
        .json(&json!({ "refresh_token": refresh }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(decode(body["token"].as_str().unwrap()).auth.email, ADMIN_EMAIL);

    let res = srv
        .client
        .post(srv.url("/auth/refresh"))
        .json(&json!({ "refresh_token": "nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn role_permissions_by_id_and_name() {
    let srv = TestServer::spawn().await;
    let admin = srv.admin_token().await;

    let read = srv
        .create(&admin, "/permissions", json!({ "name": "doc.read", "description": "r" }))
        .await;
    let role = srv
        .create(
            &admin,
            "/roles",
            json!({ "name": "viewer", "description": "views", "permissions": [read] }),
        )
        .await;

    let body: Value = srv
        .get(&admin, &format!("/roles/{role}/permissions"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(ids(&body), vec![read]);

    let body: Value = srv
        .get(&admin, "/roles/by-name/viewer/permissions")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(ids(&body), vec![read]);

    let res = srv
        .post(&admin, &format!("/roles/{role}/permissions/remove"), json!({ "ids": [read] }))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = srv
        .get(&admin, &format!("/roles/{role}/permissions"))
        .await
        .json()
        .await
        .unwrap();
    assert!(ids(&body).is_empty());
}

#[tokio::test]
async fn role_with_unknown_permission_is_not_created() {
    let srv = TestServer::spawn().await;
    let admin = srv.admin_token().await;

    let before: Value = srv.get(&admin, "/roles").await.json().await.unwrap();

    let res = srv
        .post(
            &admin,
            "/roles",
            json!({ "name": "editor", "description": "edits", "permissions": [9999] }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "sync_error");

    let after: Value = srv.get(&admin, "/roles").await.json().await.unwrap();
    assert_eq!(ids(&after), ids(&before));
}
