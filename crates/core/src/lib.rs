//! `puppetmaster-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** types (no infrastructure concerns):
//! the User / Role / Permission entities, typed ids, validated value objects
//! and the error taxonomy every other layer converts into.

pub mod entity;
pub mod error;
pub mod id;
pub mod permission;
pub mod role;
pub mod user;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{PermissionId, RoleId, UserId};
pub use permission::{Permission, PermissionDraft, dedup_names};
pub use role::{NewRole, Role, RoleChanges, RoleDraft};
pub use user::{NewUser, User, UserChanges, UserDraft, UserPatch, UserProfile};
pub use value_object::{Email, Password, ValueObject};
