//! SQLx persistence for Helix.
//!
//! | Type | Implements | Tables |
//! |------|-----------|--------|
//! | [`SqlxEntityStore`] | `helix_data::EntityStore` | `<type>`, `<type>_history` |
//! | [`SqlxAccessBackend`] | `helix_authz::AccessBackend` | `permission`, `context_instance`, `assignment` |
//!
//! # Feature flags
//!
//! | Feature | Database |
//! |---------|----------|
//! | `sqlite` | SQLite via `sqlx/sqlite` |
//!
//! Without a database feature only the error bridge ([`SqlxErrorExt`]) is built.

pub mod error;

#[cfg(feature = "sqlite")]
mod codec;
#[cfg(feature = "sqlite")]
pub mod access_backend;
#[cfg(feature = "sqlite")]
pub mod entity_store;
#[cfg(feature = "sqlite")]
pub mod schema;

pub use error::{SqlxErrorExt, SqlxResult};

#[cfg(feature = "sqlite")]
pub use access_backend::SqlxAccessBackend;
#[cfg(feature = "sqlite")]
pub use entity_store::SqlxEntityStore;
#[cfg(feature = "sqlite")]
pub use schema::{migrate_access, migrate_entity};
