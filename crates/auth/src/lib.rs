//! `puppetmaster-auth` — authentication and authorization core.
//!
//! Credential verification, session tokens, claim snapshots and the
//! authorization gate. Decoupled from HTTP and from any particular store:
//! snapshots are reached through the [`ClaimStore`] trait.

pub mod authorize;
pub mod claims;
pub mod password;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod snapshot;
pub mod token;

pub use authorize::{authorize, AuthorizationGate, AuthzError, GateConfig, Requirement};
pub use claims::{AccessClaims, AuthToken, ClaimBundle, RefreshClaims};
pub use password::{hash_password, verify_password, HashCost, PasswordError};
pub use permissions::{catalog, PermissionName};
pub use principal::Identity;
pub use roles::RoleName;
pub use snapshot::{decode_snapshot, encode_snapshot, snapshot_key, ClaimStore, ClaimStoreError};
pub use token::{extract_bearer, TokenConfig, TokenError, TokenService};
