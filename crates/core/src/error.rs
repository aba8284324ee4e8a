//! Domain error model.
//!
//! Every failure that can leave the system is one of these kinds. Lower layers
//! log the underlying driver/cache detail and then collapse it into the
//! matching variant, so the messages below are all a client ever sees.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The requested resource does not exist (or a write matched zero rows).
    #[error("the resource you requested could not be found")]
    NotFound,

    /// Malformed or missing required arguments.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The gate denied the request, or credentials did not check out.
    #[error("unauthorized")]
    Unauthorized,

    /// A field constraint was violated.
    #[error("{message}")]
    ValidationFailed { field: String, message: String },

    #[error("failed to store")]
    Store,

    #[error("failed to fetch")]
    Fetch,

    #[error("failed to update")]
    Update,

    #[error("failed to delete")]
    Delete,

    #[error("failed to assign")]
    Assignment,

    #[error("failed to remove")]
    Removal,

    #[error("failed to sync")]
    Sync,

    #[error("invalid token")]
    InvalidToken,

    #[error("token has expired")]
    ExpiredToken,

    #[error("malformed token")]
    MalformedToken,

    #[error("cache key not found")]
    CacheMiss,

    #[error("failed to decode cached value")]
    CacheDecode,

    /// Anything else that went wrong on the server side.
    #[error("internal server error")]
    Internal,
}

impl DomainError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    /// Build a validation failure with the conventional `the <field> field <rule>` message.
    pub fn validation(field: impl Into<String>, rule: impl AsRef<str>) -> Self {
        let field = field.into();
        let message = format!("the {} field {}", field, rule.as_ref());
        Self::ValidationFailed { field, message }
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    /// Stable machine-readable code for this kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::BadRequest(_) => "bad_request",
            Self::Unauthorized => "unauthorized",
            Self::ValidationFailed { .. } => "validation_failed",
            Self::Store => "store_error",
            Self::Fetch => "fetch_error",
            Self::Update => "update_error",
            Self::Delete => "delete_error",
            Self::Assignment => "assignment_error",
            Self::Removal => "removal_error",
            Self::Sync => "sync_error",
            Self::InvalidToken => "invalid_token",
            Self::ExpiredToken => "expired_token",
            Self::MalformedToken => "malformed_token",
            Self::CacheMiss => "cache_miss",
            Self::CacheDecode => "cache_decode_error",
            Self::Internal => "internal_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_names_field_and_rule() {
        let err = DomainError::validation("email", "is not valid");
        assert_eq!(err.to_string(), "the email field is not valid");
        assert_eq!(err.code(), "validation_failed");
    }

    #[test]
    fn persistence_kinds_have_generic_messages() {
        assert_eq!(DomainError::Store.to_string(), "failed to store");
        assert_eq!(DomainError::Sync.to_string(), "failed to sync");
        assert_eq!(DomainError::Unauthorized.to_string(), "unauthorized");
    }
}
