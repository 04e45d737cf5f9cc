use crate::error::EventError;
use crate::event::EntityEvent;
use std::future::Future;
use std::pin::Pin;

/// Outbound side of the event fan-out.
///
/// Publishing is fire-and-forget for the caller: a failed publish is
/// logged, never turned into a failed mutation.
pub trait EventPublisher: Send + Sync + 'static {
    fn publish(
        &self,
        event: EntityEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventError>> + Send + '_>>;

    fn is_enabled(&self) -> bool {
        true
    }
}

/// Publisher for deployments without fan-out.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPublisher;

impl EventPublisher for NoopPublisher {
    fn publish(
        &self,
        _event: EntityEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventError>> + Send + '_>> {
        Box::pin(async { Ok(()) })
    }

    fn is_enabled(&self) -> bool {
        false
    }
}
