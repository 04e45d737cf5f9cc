use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, RwLock, Semaphore};

use crate::error::EventError;
use crate::event::EntityEvent;
use crate::publisher::EventPublisher;

type BoxedFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

type Handler = Arc<dyn Fn(Arc<dyn Any + Send + Sync>) -> BoxedFuture + Send + Sync>;

/// Default maximum concurrent handlers.
pub const DEFAULT_MAX_CONCURRENCY: usize = 1024;

/// In-process event bus with typed pub/sub and backpressure.
///
/// Events are dispatched by `TypeId`: subscribers register for a concrete
/// event type and receive an `Arc<E>` when that type is emitted.
///
/// A semaphore bounds the number of handlers running at once. When the
/// limit is reached, `emit()` waits for a slot.
///
/// `LocalEventBus` is `Clone`; clones share subscribers and the limit.
#[derive(Clone)]
pub struct LocalEventBus {
    handlers: Arc<RwLock<HashMap<TypeId, Vec<Handler>>>>,
    semaphore: Option<Arc<Semaphore>>,
    max_concurrent: Option<usize>,
}

impl LocalEventBus {
    /// Bus with the default concurrency limit (1024).
    pub fn new() -> Self {
        Self::with_concurrency(DEFAULT_MAX_CONCURRENCY)
    }

    pub fn with_concurrency(max_concurrent: usize) -> Self {
        Self {
            handlers: Arc::new(RwLock::new(HashMap::new())),
            semaphore: Some(Arc::new(Semaphore::new(max_concurrent))),
            max_concurrent: Some(max_concurrent),
        }
    }

    /// Bus without backpressure. Memory grows without bound if events
    /// arrive faster than handlers finish.
    pub fn unbounded() -> Self {
        Self {
            handlers: Arc::new(RwLock::new(HashMap::new())),
            semaphore: None,
            max_concurrent: None,
        }
    }

    /// Subscribe to events of type `E`.
    pub async fn subscribe<E, F, Fut>(&self, handler: F)
    where
        E: Send + Sync + 'static,
        F: Fn(Arc<E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: Handler = Arc::new(move |any| {
            let fut: BoxedFuture = match any.downcast::<E>() {
                Ok(event) => Box::pin(handler(event)),
                Err(_) => Box::pin(async {}),
            };
            fut
        });
        let mut map = self.handlers.write().await;
        map.entry(TypeId::of::<E>()).or_default().push(handler);
    }

    /// Spawn every subscriber of `E`. Returns once all are spawned.
    pub async fn emit<E: Send + Sync + 'static>(&self, event: E) -> Result<(), EventError> {
        self.dispatch(event).await.map(|_| ())
    }

    /// Spawn every subscriber of `E` and wait for them to finish.
    pub async fn emit_and_wait<E: Send + Sync + 'static>(&self, event: E) -> Result<(), EventError> {
        for task in self.dispatch(event).await? {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "event handler panicked");
            }
        }
        Ok(())
    }

    pub async fn subscriber_count<E: 'static>(&self) -> usize {
        self.handlers
            .read()
            .await
            .get(&TypeId::of::<E>())
            .map_or(0, Vec::len)
    }

    /// Remove every subscriber.
    pub async fn clear(&self) {
        self.handlers.write().await.clear();
    }

    /// Configured concurrency limit, `None` if unbounded.
    pub fn concurrency_limit(&self) -> Option<usize> {
        self.max_concurrent
    }

    async fn dispatch<E: Send + Sync + 'static>(
        &self,
        event: E,
    ) -> Result<Vec<tokio::task::JoinHandle<()>>, EventError> {
        let event = Arc::new(event) as Arc<dyn Any + Send + Sync>;
        let map = self.handlers.read().await;
        let Some(subs) = map.get(&TypeId::of::<E>()) else {
            return Ok(Vec::new());
        };
        let mut tasks = Vec::with_capacity(subs.len());
        for handler in subs {
            let h = handler.clone();
            let e = event.clone();
            let permit = self.permit().await?;
            tasks.push(tokio::spawn(async move {
                h(e).await;
                drop(permit);
            }));
        }
        Ok(tasks)
    }

    async fn permit(&self) -> Result<Option<OwnedSemaphorePermit>, EventError> {
        match &self.semaphore {
            Some(sem) => sem
                .clone()
                .acquire_owned()
                .await
                .map(Some)
                .map_err(|_| EventError::Closed),
            None => Ok(None),
        }
    }
}

impl Default for LocalEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPublisher for LocalEventBus {
    fn publish(
        &self,
        event: EntityEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventError>> + Send + '_>> {
        Box::pin(async move {
            tracing::debug!(
                event = %event.id,
                event_type = %event.event_type(),
                object = %event.object_id,
                actor = %event.actor_id,
                "publishing entity event"
            );
            self.emit(event).await
        })
    }
}
