//! Event fan-out for Helix.
//!
//! Every accepted mutation produces an [`EntityEvent`] tagged with a
//! [`ScopeDescriptor`]: the context instance it happened in and the level a
//! subscriber needs there to receive it. Delivery is the job of an
//! [`EventPublisher`]; [`LocalEventBus`] is the in-process implementation
//! and [`NoopPublisher`] drops everything.
//!
//! ```ignore
//! let bus = LocalEventBus::new();
//! bus.subscribe(|event: Arc<EntityEvent>| async move {
//!     println!("{} on {}", event.event_type(), event.object_id);
//! })
//! .await;
//! ```

pub mod error;
pub mod event;
pub mod local;
pub mod publisher;

pub use error::EventError;
pub use event::{EntityEvent, ScopeDescriptor};
pub use local::{LocalEventBus, DEFAULT_MAX_CONCURRENCY};
pub use publisher::{EventPublisher, NoopPublisher};

pub mod prelude {
    //! Re-exports of the most commonly used event types.
    pub use crate::{EntityEvent, EventPublisher, LocalEventBus, ScopeDescriptor};
}
