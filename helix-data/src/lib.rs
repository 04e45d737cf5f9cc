//! Versioned entities for Helix.
//!
//! Every mutable record carries a version that starts at 1 and moves up by
//! exactly one per accepted write. [`VersionedEntityController`] rejects
//! writes computed from a stale version and stores one [`AuditRecord`] per
//! accepted write, in the same atomic unit as the write itself.
//!
//! Storage is pluggable through [`EntityStore`]: [`MemoryEntityStore`] here,
//! a SQLite store in `helix-data-sqlx`.

pub mod audit;
pub mod controller;
pub mod diff;
pub mod error;
pub mod record;
pub mod store;

pub use audit::{AuditAction, AuditRecord};
pub use controller::{Applied, VersionedEntityController};
pub use diff::{ChangeSet, FieldChange};
pub use error::DataError;
pub use record::{EntityRecord, Fields};
pub use store::{EntityStore, MemoryEntityStore};

pub mod prelude {
    //! Re-exports of the most commonly used data types.
    pub use crate::{
        Applied, AuditRecord, DataError, EntityRecord, EntityStore, Fields,
        VersionedEntityController,
    };
}
