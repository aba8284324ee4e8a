//! Configuration loading and representation.
//!
//! Settings are read once at startup and handed to constructors explicitly.

use std::net::SocketAddr;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::Duration;

use puppetmaster_auth::{GateConfig, HashCost, RoleName, TokenConfig};
use puppetmaster_observability::LogFormat;

const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Clone)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    /// Postgres connection string; in-memory stores are used when absent.
    pub database_url: Option<String>,
    /// Redis connection string; snapshots are cached in-process when absent.
    pub redis_url: Option<String>,
    pub jwt_secret: String,
    /// `true` when `JWT_SECRET` was not set and the dev secret is in use.
    pub jwt_secret_is_default: bool,
    pub jwt_issuer: String,
    pub jwt_subject: String,
    pub jwt_audience: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub hash_cost: HashCost,
    pub admin_role: RoleName,
    /// Credentials of an administrator seeded at startup, when both are set.
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub log_format: LogFormat,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8000".to_string())
            .parse()
            .with_context(|| "parse BIND_ADDR")?;

        let (jwt_secret, jwt_secret_is_default) = match get("JWT_SECRET") {
            Some(secret) => (secret, false),
            None => (DEV_JWT_SECRET.to_string(), true),
        };

        let access_secs: i64 = parse_or(&get, "ACCESS_TOKEN_TTL_SECS", 7200)?;
        let refresh_secs: i64 = parse_or(&get, "REFRESH_TOKEN_TTL_SECS", 604_800)?;
        if access_secs <= 0 || refresh_secs <= 0 {
            anyhow::bail!("token TTLs must be positive");
        }

        let iterations = parse_or(&get, "PASSWORD_HASH_COST", 3)?;
        let memory_kib = parse_or(&get, "PASSWORD_HASH_MEMORY_KIB", 19_456)?;

        let log_format = match get("LOG_FORMAT") {
            Some(raw) => raw.parse().with_context(|| "parse LOG_FORMAT")?,
            None => LogFormat::default(),
        };

        Ok(Self {
            bind_addr,
            database_url: get("DATABASE_URL"),
            redis_url: get("REDIS_URL"),
            jwt_secret,
            jwt_secret_is_default,
            jwt_issuer: get("JWT_ISSUER").unwrap_or_else(|| "Puppet Master".to_string()),
            jwt_subject: get("JWT_SUBJECT")
                .unwrap_or_else(|| "https://github.com/cyruzin/puppet_master".to_string()),
            jwt_audience: get("JWT_AUDIENCE").unwrap_or_else(|| "Auth Services".to_string()),
            access_token_ttl: Duration::seconds(access_secs),
            refresh_token_ttl: Duration::seconds(refresh_secs),
            hash_cost: HashCost::new(iterations, memory_kib),
            admin_role: RoleName::new(get("ADMIN_ROLE").unwrap_or_else(|| "admin".to_string())),
            admin_email: get("ADMIN_EMAIL"),
            admin_password: get("ADMIN_PASSWORD"),
            log_format,
        })
    }

    pub fn token_config(&self) -> TokenConfig {
        TokenConfig {
            secret: self.jwt_secret.clone(),
            issuer: self.jwt_issuer.clone(),
            subject: self.jwt_subject.clone(),
            audience: self.jwt_audience.clone(),
            access_ttl: self.access_token_ttl,
            refresh_ttl: self.refresh_token_ttl,
        }
    }

    /// Seed credentials, only when both halves are configured.
    pub fn admin_credentials(&self) -> Option<(&str, &str)> {
        match (&self.admin_email, &self.admin_password) {
            (Some(email), Some(password)) => Some((email, password)),
            _ => None,
        }
    }

    pub fn gate_config(&self) -> GateConfig {
        GateConfig {
            admin_role: self.admin_role.clone(),
        }
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("parse {key}")),
        None => Ok(default),
    }
}

impl core::fmt::Debug for Settings {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Settings")
            .field("bind_addr", &self.bind_addr)
            .field("database_url", &self.database_url.as_ref().map(|_| "***"))
            .field("redis_url", &self.redis_url.as_ref().map(|_| "***"))
            .field("jwt_secret", &"***")
            .field("jwt_secret_is_default", &self.jwt_secret_is_default)
            .field("jwt_issuer", &self.jwt_issuer)
            .field("jwt_audience", &self.jwt_audience)
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("hash_cost", &self.hash_cost)
            .field("admin_role", &self.admin_role)
            .field("admin_email", &self.admin_email)
            .field("admin_password", &self.admin_password.as_ref().map(|_| "***"))
            .field("log_format", &self.log_format)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<Settings> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let s = load(&[]).unwrap();
        assert_eq!(s.bind_addr.to_string(), "0.0.0.0:8000");
        assert!(s.database_url.is_none());
        assert!(s.redis_url.is_none());
        assert!(s.jwt_secret_is_default);
        assert_eq!(s.access_token_ttl, Duration::hours(2));
        assert_eq!(s.refresh_token_ttl, Duration::days(7));
        assert_eq!(s.hash_cost, HashCost::new(3, 19_456));
        assert_eq!(s.admin_role, RoleName::ADMIN);
        assert_eq!(s.log_format, LogFormat::Json);

        let token = s.token_config();
        assert_eq!(token.issuer, "Puppet Master");
        assert_eq!(token.audience, "Auth Services");
    }

    #[test]
    fn explicit_values_override_defaults() {
        let s = load(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("DATABASE_URL", "postgres://localhost/pm"),
            ("JWT_SECRET", "s3cret"),
            ("ACCESS_TOKEN_TTL_SECS", "60"),
            ("ADMIN_ROLE", "root"),
            ("LOG_FORMAT", "pretty"),
        ])
        .unwrap();
        assert_eq!(s.bind_addr.port(), 9000);
        assert_eq!(s.database_url.as_deref(), Some("postgres://localhost/pm"));
        assert!(!s.jwt_secret_is_default);
        assert_eq!(s.token_config().access_ttl, Duration::seconds(60));
        assert_eq!(s.gate_config().admin_role, RoleName::new("root"));
        assert_eq!(s.log_format, LogFormat::Pretty);
    }

    #[test]
    fn blank_values_count_as_unset() {
        let s = load(&[("DATABASE_URL", "  "), ("JWT_SECRET", "")]).unwrap();
        assert!(s.database_url.is_none());
        assert!(s.jwt_secret_is_default);
    }

    #[test]
    fn bad_values_are_reported() {
        assert!(load(&[("BIND_ADDR", "nope")]).is_err());
        assert!(load(&[("ACCESS_TOKEN_TTL_SECS", "soon")]).is_err());
        assert!(load(&[("REFRESH_TOKEN_TTL_SECS", "0")]).is_err());
        assert!(load(&[("LOG_FORMAT", "xml")]).is_err());
    }

    #[test]
    fn admin_seed_needs_both_halves() {
        let s = load(&[("ADMIN_EMAIL", "root@example.com")]).unwrap();
        assert!(s.admin_credentials().is_none());

        let s = load(&[("ADMIN_EMAIL", "root@example.com"), ("ADMIN_PASSWORD", "longpass1")])
            .unwrap();
        assert_eq!(s.admin_credentials(), Some(("root@example.com", "longpass1")));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let s = load(&[
            ("JWT_SECRET", "hunter22"),
            ("DATABASE_URL", "postgres://u:p@h/db"),
            ("ADMIN_PASSWORD", "rootpass99"),
        ])
        .unwrap();
        let dump = format!("{s:?}");
        assert!(!dump.contains("hunter22"));
        assert!(!dump.contains("u:p@h"));
        assert!(!dump.contains("rootpass99"));
    }
}
