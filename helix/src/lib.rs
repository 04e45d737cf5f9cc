//! Helix: the access-and-consistency layer of a multi-tenant tracker.
//!
//! This facade crate re-exports the Helix sub-crates and adds
//! [`AccessLayer`], which strings them together for one request:
//!
//! 1. no actor: `Unauthorized`
//! 2. the resolver denies: `Forbidden`; the resolver fails: `ServiceUnavailable`
//! 3. the versioned write runs (a stale version is a `Conflict`)
//! 4. the accepted write is published as an [`EntityEvent`](helix_events::EntityEvent)
//!
//! ```ignore
//! use helix::prelude::*;
//! ```
//!
//! # Feature flags
//!
//! | Feature  | Default | Crate                       |
//! |----------|---------|-----------------------------|
//! | `sqlite` | no      | `helix-data-sqlx/sqlite`    |

pub mod config;
pub mod layer;
pub mod telemetry;

pub use helix_authz;
pub use helix_core;
pub use helix_data;
pub use helix_events;

#[cfg(feature = "sqlite")]
pub use helix_data_sqlx;

pub use config::{AccessConfig, LogConfig, LogFormat};
pub use helix_core::AccessError;
pub use layer::AccessLayer;
pub use telemetry::init_tracing;

pub mod prelude {
    //! Everything a request handler usually needs.
    pub use crate::{AccessConfig, AccessLayer};
    pub use helix_authz::prelude::*;
    pub use helix_core::prelude::*;
    pub use helix_data::prelude::*;
    pub use helix_events::prelude::*;
}
