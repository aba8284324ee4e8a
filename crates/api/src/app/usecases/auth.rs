use std::sync::Arc;

use tracing::{info, instrument, warn};

use puppetmaster_auth::{
    hash_password, AuthToken, ClaimBundle, HashCost, PasswordError, TokenService,
};
use puppetmaster_core::{DomainError, DomainResult, Email, Password};

use super::{verify_blocking, ClaimSnapshots, Repositories};

/// Session issuance: password login and refresh-token rotation.
#[derive(Clone)]
pub struct AuthUsecase {
    repos: Repositories,
    tokens: Arc<TokenService>,
    snapshots: ClaimSnapshots,
    /// Verified against when the e-mail is unknown, so both failures cost
    /// one argon2 run at the configured work factor.
    decoy_hash: Arc<str>,
}

impl AuthUsecase {
    pub fn new(
        repos: Repositories,
        tokens: Arc<TokenService>,
        snapshots: ClaimSnapshots,
        hash_cost: HashCost,
    ) -> Result<Self, PasswordError> {
        let decoy_hash = hash_password("puppetmaster-decoy-password", hash_cost)?;
        Ok(Self {
            repos,
            tokens,
            snapshots,
            decoy_hash: decoy_hash.into(),
        })
    }

    /// Unknown e-mail and wrong password are indistinguishable to the caller,
    /// in outcome and in cost.
    #[instrument(skip(self, email, password))]
    pub async fn authenticate(&self, email: &str, password: &str) -> DomainResult<AuthToken> {
        let email = Email::parse(email)?;
        let password = Password::parse(password)?;

        let user = match self.repos.users.get_by_email(&email).await {
            Ok(user) => user,
            Err(DomainError::NotFound) => {
                let decoy = self.decoy_hash.to_string();
                verify_blocking(password.expose().to_string(), decoy).await?;
                warn!("authentication failed");
                return Err(DomainError::Unauthorized);
            }
            Err(e) => return Err(e),
        };

        let verified =
            verify_blocking(password.expose().to_string(), user.password_hash.clone()).await?;
        if !verified {
            warn!(user_id = %user.id, "authentication failed");
            return Err(DomainError::Unauthorized);
        }

        let snapshot = self.snapshots.publish(&user).await?;
        let pair = self.issue_pair(&snapshot)?;
        info!(user_id = %user.id, "user authenticated");
        Ok(pair)
    }

    /// Exchange a refresh token for a fresh pair with recomputed claims.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh(&self, refresh_token: &str) -> DomainResult<AuthToken> {
        let claims = self.tokens.parse_refresh_token(refresh_token)?;

        let user = match self.repos.users.get_by_id(claims.user_id).await {
            Ok(user) => user,
            Err(DomainError::NotFound) => {
                warn!(user_id = %claims.user_id, "refresh for a deleted user");
                return Err(DomainError::Unauthorized);
            }
            Err(e) => return Err(e),
        };

        let snapshot = self.snapshots.publish(&user).await?;
        let pair = self.issue_pair(&snapshot)?;
        info!(user_id = %user.id, "session refreshed");
        Ok(pair)
    }

    fn issue_pair(&self, snapshot: &ClaimBundle) -> DomainResult<AuthToken> {
        let token = self
            .tokens
            .issue_token(snapshot, self.tokens.access_expiry())?;
        let refresh_token = self
            .tokens
            .issue_refresh_token(snapshot.user_id, self.tokens.refresh_expiry())?;

        Ok(AuthToken {
            token,
            refresh_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use puppetmaster_auth::ClaimStore;
    use puppetmaster_core::NewUser;

    use super::super::fixtures::Fixture;
    use super::*;

    #[tokio::test]
    async fn authenticate_issues_tokens_and_caches_claims() {
        let fx = Fixture::new();
        let user = fx
            .users
            .store(NewUser::parse("Ana", "a@b.com", "longpass1").unwrap())
            .await
            .unwrap();

        let pair = fx.auth.authenticate("A@B.com", "longpass1").await.unwrap();
        assert!(!pair.token.is_empty());
        assert!(!pair.refresh_token.is_empty());

        let claims = fx.tokens.parse_and_verify(&pair.token).unwrap();
        assert_eq!(claims.auth.email, "a@b.com");
        assert_eq!(claims.auth.user_id, user.id);
        assert!(fx.cache.contains(user.id).await.unwrap());
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_look_the_same() {
        let fx = Fixture::new();
        fx.users
            .store(NewUser::parse("Ana", "a@b.com", "longpass1").unwrap())
            .await
            .unwrap();

        let wrong = fx.auth.authenticate("a@b.com", "longpass2").await.unwrap_err();
        let unknown = fx.auth.authenticate("z@b.com", "longpass1").await.unwrap_err();
        assert_eq!(wrong, DomainError::Unauthorized);
        assert_eq!(unknown, DomainError::Unauthorized);
    }

    #[tokio::test]
    async fn decoy_hash_uses_the_configured_cost() {
        let fx = Fixture::new();
        assert!(fx.auth.decoy_hash.starts_with("$argon2id$"));
        assert!(fx.auth.decoy_hash.contains("m=64,t=1"));
        assert!(!puppetmaster_auth::verify_password("longpass1", &fx.auth.decoy_hash));
    }

    #[tokio::test]
    async fn unknown_email_costs_as_much_as_a_wrong_password() {
        let fx = Fixture::with_hash_cost(HashCost::new(2, 4096));
        fx.users
            .store(NewUser::parse("Ana", "a@b.com", "longpass1").unwrap())
            .await
            .unwrap();

        let mut wrong = Duration::MAX;
        let mut unknown = Duration::MAX;
        for _ in 0..3 {
            let started = Instant::now();
            assert!(fx.auth.authenticate("a@b.com", "longpass2").await.is_err());
            wrong = wrong.min(started.elapsed());

            let started = Instant::now();
            assert!(fx.auth.authenticate("z@b.com", "longpass2").await.is_err());
            unknown = unknown.min(started.elapsed());
        }

        // An unknown e-mail still pays for one verification.
        assert!(
            unknown * 4 >= wrong,
            "unknown e-mail took {unknown:?}, wrong password took {wrong:?}"
        );
    }

    #[tokio::test]
    async fn malformed_credentials_are_field_errors() {
        let fx = Fixture::new();
        assert!(matches!(
            fx.auth.authenticate("not-an-email", "longpass1").await,
            Err(DomainError::ValidationFailed { field, .. }) if field == "email"
        ));
        assert!(matches!(
            fx.auth.authenticate("a@b.com", "short").await,
            Err(DomainError::ValidationFailed { field, .. }) if field == "password"
        ));
    }

    #[tokio::test]
    async fn refresh_rotates_the_pair() {
        let fx = Fixture::new();
        let user = fx
            .users
            .store(NewUser::parse("Ana", "a@b.com", "longpass1").unwrap())
            .await
            .unwrap();
        let pair = fx.auth.authenticate("a@b.com", "longpass1").await.unwrap();

        let next = fx.auth.refresh(&pair.refresh_token).await.unwrap();
        let claims = fx.tokens.parse_and_verify(&next.token).unwrap();
        assert_eq!(claims.auth.user_id, user.id);

        assert_eq!(
            fx.auth.refresh(&pair.token).await.unwrap_err(),
            DomainError::MalformedToken
        );
    }

    #[tokio::test]
    async fn refresh_for_a_deleted_user_is_unauthorized() {
        let fx = Fixture::new();
        let user = fx
            .users
            .store(NewUser::parse("Ana", "a@b.com", "longpass1").unwrap())
            .await
            .unwrap();
        let pair = fx.auth.authenticate("a@b.com", "longpass1").await.unwrap();
        fx.users.delete(user.id).await.unwrap();

        assert_eq!(
            fx.auth.refresh(&pair.refresh_token).await.unwrap_err(),
            DomainError::Unauthorized
        );
    }
}
