use chrono::{DateTime, Utc};
use uuid::Uuid;

use puppetmaster_core::UserId;

use crate::claims::{AccessClaims, ClaimBundle};

/// A verified caller, as resolved by the transport from a bearer token.
///
/// Only constructible from verified access claims, so holding one means the
/// token's signature and expiry were checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    bundle: ClaimBundle,
    token_id: Uuid,
    expires_at: Option<DateTime<Utc>>,
}

impl Identity {
    pub fn from_claims(claims: AccessClaims) -> Self {
        let expires_at = claims.expires_at();
        Self {
            bundle: claims.auth,
            token_id: claims.jti,
            expires_at,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.bundle.user_id
    }

    pub fn email(&self) -> &str {
        &self.bundle.email
    }

    /// Claims as they were when the token was issued.
    pub fn bundle(&self) -> &ClaimBundle {
        &self.bundle
    }

    pub fn token_id(&self) -> Uuid {
        self.token_id
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }
}
