//! Session token issuance and verification (HS256 JWT).

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use uuid::Uuid;

use puppetmaster_core::{DomainError, UserId};

use crate::claims::{AccessClaims, ClaimBundle, RefreshClaims};

const BEARER_PREFIX: &str = "Bearer ";

/// Token issuance settings, passed in explicitly (no ambient lookup).
#[derive(Clone)]
pub struct TokenConfig {
    pub secret: String,
    pub issuer: String,
    pub subject: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl TokenConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: "Puppet Master".to_string(),
            subject: "https://github.com/cyruzin/puppet_master".to_string(),
            audience: "Auth Services".to_string(),
            access_ttl: Duration::hours(2),
            refresh_ttl: Duration::days(7),
        }
    }
}

impl core::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"***")
            .field("issuer", &self.issuer)
            .field("subject", &self.subject)
            .field("audience", &self.audience)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Signature mismatch or a registered claim (iss/aud/sub) that does not match.
    #[error("invalid token")]
    Invalid,

    #[error("token has expired")]
    Expired,

    /// Not a well-formed token (bad prefix, segments, base64 or claim payload).
    #[error("malformed token")]
    Malformed,

    #[error("token configuration error: {0}")]
    Config(String),

    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl From<TokenError> for DomainError {
    fn from(value: TokenError) -> Self {
        match value {
            TokenError::Invalid => DomainError::InvalidToken,
            TokenError::Expired => DomainError::ExpiredToken,
            TokenError::Malformed => DomainError::MalformedToken,
            TokenError::Config(_) | TokenError::Signing(_) => DomainError::Internal,
        }
    }
}

/// Issues and verifies signed session tokens with a shared HMAC secret.
#[derive(Clone)]
pub struct TokenService {
    config: TokenConfig,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenService {
    pub fn new(config: TokenConfig) -> Result<Self, TokenError> {
        if config.secret.is_empty() {
            return Err(TokenError::Config("secret must not be empty".to_string()));
        }
        let encoding = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding = DecodingKey::from_secret(config.secret.as_bytes());
        Ok(Self {
            config,
            encoding,
            decoding,
        })
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Access-token expiry for a token issued now.
    pub fn access_expiry(&self) -> DateTime<Utc> {
        Utc::now() + self.config.access_ttl
    }

    /// Refresh-token expiry for a token issued now.
    pub fn refresh_expiry(&self) -> DateTime<Utc> {
        Utc::now() + self.config.refresh_ttl
    }

    pub fn issue_token(
        &self,
        bundle: &ClaimBundle,
        expires_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = AccessClaims {
            iss: self.config.issuer.clone(),
            sub: self.config.subject.clone(),
            aud: self.config.audience.clone(),
            exp: expires_at.timestamp(),
            iat: Utc::now().timestamp(),
            jti: Uuid::now_v7(),
            auth: bundle.clone(),
        };
        self.sign(&claims)
    }

    pub fn issue_refresh_token(
        &self,
        user_id: UserId,
        expires_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = RefreshClaims {
            iss: self.config.issuer.clone(),
            sub: self.config.subject.clone(),
            aud: self.config.audience.clone(),
            exp: expires_at.timestamp(),
            iat: Utc::now().timestamp(),
            user_id,
        };
        self.sign(&claims)
    }

    /// Verify signature, registered claims and expiry of an access token.
    pub fn parse_and_verify(&self, token: &str) -> Result<AccessClaims, TokenError> {
        self.verify(token)
    }

    pub fn parse_refresh_token(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        self.verify(token)
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, TokenError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    fn verify<T: DeserializeOwned>(&self, token: &str) -> Result<T, TokenError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(TokenError::Malformed);
        }

        jsonwebtoken::decode::<T>(token, &self.decoding, &self.validation())
            .map(|data| data.claims)
            .map_err(|e| map_jwt_error(e.kind()))
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[self.config.issuer.as_str()]);
        validation.set_audience(&[self.config.audience.as_str()]);
        validation.sub = Some(self.config.subject.clone());
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation
    }
}

fn map_jwt_error(kind: &ErrorKind) -> TokenError {
    match kind {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidIssuer
        | ErrorKind::InvalidAudience
        | ErrorKind::InvalidSubject
        | ErrorKind::ImmatureSignature
        | ErrorKind::InvalidAlgorithm => TokenError::Invalid,
        _ => TokenError::Malformed,
    }
}

/// Extract the token from an `Authorization` header value.
///
/// The value must be exactly `Bearer <token>`; anything else is malformed.
pub fn extract_bearer(header: &str) -> Result<&str, TokenError> {
    let token = header
        .strip_prefix(BEARER_PREFIX)
        .ok_or(TokenError::Malformed)?
        .trim();

    if token.is_empty() {
        return Err(TokenError::Malformed);
    }

    Ok(token)
}
