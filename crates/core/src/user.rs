//! User entity and its write-side inputs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::DomainResult;
use crate::id::{PermissionId, RoleId, UserId};
use crate::value_object::{Email, Password, required_text};

/// Identity record.
///
/// `password_hash` is never serialized outward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }
}

/// A user together with the authorization state derived from its pivots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
}

/// Validated input for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: Email,
    pub password: Password,
}

impl NewUser {
    pub fn parse(name: &str, email: &str, password: impl Into<String>) -> DomainResult<Self> {
        Ok(Self {
            name: required_text("name", name)?,
            email: Email::parse(email)?,
            password: Password::parse(password)?,
        })
    }
}

/// Validated input for updating a user.
///
/// `roles` / `permissions`, when present, replace the user's current
/// assignments (sync semantics); an empty list clears them.
#[derive(Debug, Clone)]
pub struct UserChanges {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub password: Option<Password>,
    pub roles: Option<Vec<RoleId>>,
    pub permissions: Option<Vec<PermissionId>>,
}

impl UserChanges {
    pub fn parse(
        id: UserId,
        name: &str,
        email: &str,
        password: Option<String>,
        roles: Option<Vec<RoleId>>,
        permissions: Option<Vec<PermissionId>>,
    ) -> DomainResult<Self> {
        Ok(Self {
            id,
            name: required_text("name", name)?,
            email: Email::parse(email)?,
            password: password.map(Password::parse).transpose()?,
            roles,
            permissions,
        })
    }
}

/// Row-level payload handed to the repository on insert (password already hashed).
#[derive(Debug, Clone)]
pub struct UserDraft {
    pub name: String,
    pub email: Email,
    pub password_hash: String,
}

/// Row-level payload handed to the repository on update.
#[derive(Debug, Clone)]
pub struct UserPatch {
    pub name: String,
    pub email: Email,
    pub password_hash: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DomainError;

    #[test]
    fn new_user_validates_every_field() {
        assert!(NewUser::parse("Ana", "a@b.com", "longpass1").is_ok());
        assert!(matches!(
            NewUser::parse("", "a@b.com", "longpass1"),
            Err(DomainError::ValidationFailed { field, .. }) if field == "name"
        ));
        assert!(matches!(
            NewUser::parse("Ana", "a-b.com", "longpass1"),
            Err(DomainError::ValidationFailed { field, .. }) if field == "email"
        ));
        assert!(matches!(
            NewUser::parse("Ana", "a@b.com", "short"),
            Err(DomainError::ValidationFailed { field, .. }) if field == "password"
        ));
    }

    #[test]
    fn changes_only_validate_password_when_given() {
        let c = UserChanges::parse(UserId::new(1), "Ana", "a@b.com", None, None, None).unwrap();
        assert!(c.password.is_none());
        assert!(
            UserChanges::parse(UserId::new(1), "Ana", "a@b.com", Some("x".into()), None, None)
                .is_err()
        );
    }

    #[test]
    fn password_hash_is_not_serialized() {
        let now = Utc::now();
        let user = User {
            id: UserId::new(3),
            name: "Ana".into(),
            email: "a@b.com".into(),
            password_hash: "$argon2id$secret".into(),
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["id"], 3);
    }
}
