//! Shared access model for Helix.
//!
//! Every other Helix crate speaks in the types defined here:
//!
//! - [`PermissionLevel`]: the ordered capability ladder `Read < Create < Update < Delete`
//! - [`ContextScope`]: the closed scope hierarchy `Node ⊃ Account ⊃ Organization ⊃ Team ⊃ Project`
//! - [`ResourceType`] / [`ResourceScopes`]: which scope a resource is checked against
//! - [`AccessError`]: the caller-facing error taxonomy
//! - [`HelixConfig`]: layered YAML + `.env` + environment configuration

pub mod config;
pub mod error;
pub mod level;
pub mod resource;
pub mod scope;

pub use config::{ConfigError, ConfigProperties, ConfigValue, HelixConfig};
pub use error::{AccessError, InvalidName};
pub use level::PermissionLevel;
pub use resource::{ResourceScopes, ResourceType};
pub use scope::ContextScope;

pub mod prelude {
    //! Re-exports of the most commonly used model types.
    pub use crate::{AccessError, ContextScope, PermissionLevel, ResourceScopes, ResourceType};
}
