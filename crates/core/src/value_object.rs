//! Value objects: equality by value, not identity.
//!
//! Two value objects holding the same data are interchangeable. Constructors
//! validate, so a value that exists is a value that is well-formed.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Marker trait for value objects.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 8;

/// A syntactically valid, lower-cased e-mail address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl ValueObject for Email {}

impl Email {
    pub fn parse(raw: impl AsRef<str>) -> DomainResult<Self> {
        let raw = raw.as_ref().trim();
        if raw.is_empty() {
            return Err(DomainError::validation("email", "is required"));
        }

        let Some((local, domain)) = raw.split_once('@') else {
            return Err(DomainError::validation("email", "is not valid"));
        };

        let domain_ok = !domain.is_empty()
            && !domain.contains('@')
            && domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.');

        if local.is_empty() || !domain_ok || raw.chars().any(char::is_whitespace) {
            return Err(DomainError::validation("email", "is not valid"));
        }

        Ok(Self(raw.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Email {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

/// A plaintext password that satisfies the length policy.
///
/// `Debug` is redacted so the secret never ends up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl ValueObject for Password {}

impl Password {
    pub fn parse(raw: impl Into<String>) -> DomainResult<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(DomainError::validation("password", "is required"));
        }
        if raw.chars().count() < MIN_PASSWORD_LEN {
            return Err(DomainError::validation(
                "password",
                format!("minimum length is {MIN_PASSWORD_LEN}"),
            ));
        }
        Ok(Self(raw))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for Password {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Validate a required free-text field (names, descriptions).
pub fn required_text(field: &str, raw: impl AsRef<str>) -> DomainResult<String> {
    let value = raw.as_ref().trim();
    if value.is_empty() {
        return Err(DomainError::validation(field, "is required"));
    }
    Ok(value.to_string())
}
