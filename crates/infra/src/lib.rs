//! Infrastructure layer: configuration, Postgres, caches.

pub mod cache;
pub mod config;
pub mod db;
pub mod repository;

pub use cache::InMemoryClaimStore;
#[cfg(feature = "redis")]
pub use cache::RedisClaimStore;
pub use config::Settings;
pub use repository::{
    AssignmentStore, InMemoryStore, PermissionRepository, PostgresStore, Relation, RoleRepository,
    Store, UserRepository,
};
