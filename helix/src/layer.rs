//! The request path: authenticate, authorize, write, publish.

use helix_authz::{
    AccessBackend, AccessDirectory, AuthorizationResolver, MembershipProvider, Shareable,
    VisibilityResolver,
};
use helix_core::{AccessError, PermissionLevel};
use helix_data::{Applied, EntityStore, Fields, VersionedEntityController};
use helix_events::{EntityEvent, EventPublisher, LocalEventBus, NoopPublisher, ScopeDescriptor};
use std::sync::Arc;

use crate::config::AccessConfig;

/// Gatekeeper in front of every versioned write and shareable read.
///
/// Writes name the [`VersionedEntityController`] they go through; its
/// entity type doubles as the resource type checked by the resolver.
/// Accepted writes are announced to the [`EventPublisher`] with a `READ`
/// descriptor on the context the write was authorized against.
///
/// ```ignore
/// let layer = AccessLayer::new(directory, membership, bus);
/// let applied = layer
///     .mutate(&tickets, Some("alice"), &project_id, "t1", Some(3), patch)
///     .await?;
/// ```
#[derive(Clone)]
pub struct AccessLayer {
    directory: AccessDirectory,
    resolver: AuthorizationResolver,
    visibility: VisibilityResolver,
    publisher: Arc<dyn EventPublisher>,
}

impl AccessLayer {
    pub fn new(
        directory: AccessDirectory,
        membership: impl MembershipProvider,
        publisher: impl EventPublisher,
    ) -> Self {
        let resolver = directory.resolver(membership);
        Self {
            visibility: VisibilityResolver::new(resolver.clone()),
            resolver,
            directory,
            publisher: Arc::new(publisher),
        }
    }

    /// Layer wired from an [`AccessConfig`] section.
    ///
    /// Returns the [`LocalEventBus`] the layer publishes to, bounded by
    /// `events_max_concurrency`, so callers can subscribe to it.
    pub fn from_config(
        backend: impl AccessBackend,
        membership: impl MembershipProvider,
        config: &AccessConfig,
    ) -> (Self, LocalEventBus) {
        let directory = AccessDirectory::from_config(backend, &config.authz);
        let bus = LocalEventBus::with_concurrency(config.events_max_concurrency);
        tracing::debug!(
            cache = config.authz.cache_enabled,
            max_concurrency = config.events_max_concurrency,
            "access layer configured"
        );
        (Self::new(directory, membership, bus.clone()), bus)
    }

    /// A layer that publishes nothing.
    pub fn without_events(directory: AccessDirectory, membership: impl MembershipProvider) -> Self {
        Self::new(directory, membership, NoopPublisher)
    }

    pub fn directory(&self) -> &AccessDirectory {
        &self.directory
    }

    pub fn resolver(&self) -> &AuthorizationResolver {
        &self.resolver
    }

    pub fn visibility(&self) -> &VisibilityResolver {
        &self.visibility
    }

    /// `Ok` if `actor` holds `required` on `resource_type` at `context_id`.
    pub async fn authorize(
        &self,
        actor: Option<&str>,
        resource_type: &str,
        context_id: &str,
        required: PermissionLevel,
    ) -> Result<(), AccessError> {
        let actor = authenticated(actor)?;
        self.check(actor, resource_type, context_id, required).await
    }

    /// Create `entity_id`; requires `CREATE`.
    pub async fn create<S: EntityStore>(
        &self,
        entities: &VersionedEntityController<S>,
        actor: Option<&str>,
        context_id: &str,
        entity_id: &str,
        fields: Fields,
    ) -> Result<Applied, AccessError> {
        let actor = authenticated(actor)?;
        let resource = entities.entity_type();
        self.check(actor, resource, context_id, PermissionLevel::Create)
            .await?;
        let applied = entities.create(entity_id, fields, actor).await?;
        self.announce("create", resource, entity_id, actor, context_id, &applied)
            .await;
        Ok(applied)
    }

    /// Patch `entity_id`; requires `UPDATE`.
    pub async fn mutate<S: EntityStore>(
        &self,
        entities: &VersionedEntityController<S>,
        actor: Option<&str>,
        context_id: &str,
        entity_id: &str,
        expected_version: Option<u64>,
        patch: Fields,
    ) -> Result<Applied, AccessError> {
        let actor = authenticated(actor)?;
        let resource = entities.entity_type();
        self.check(actor, resource, context_id, PermissionLevel::Update)
            .await?;
        let applied = entities
            .apply_patch(entity_id, expected_version, patch, actor)
            .await?;
        self.announce("update", resource, entity_id, actor, context_id, &applied)
            .await;
        Ok(applied)
    }

    /// Soft-delete `entity_id`; requires `DELETE`.
    pub async fn remove<S: EntityStore>(
        &self,
        entities: &VersionedEntityController<S>,
        actor: Option<&str>,
        context_id: &str,
        entity_id: &str,
        expected_version: Option<u64>,
    ) -> Result<Applied, AccessError> {
        let actor = authenticated(actor)?;
        let resource = entities.entity_type();
        self.check(actor, resource, context_id, PermissionLevel::Delete)
            .await?;
        let applied = entities.remove(entity_id, expected_version, actor).await?;
        self.announce("remove", resource, entity_id, actor, context_id, &applied)
            .await;
        Ok(applied)
    }

    /// Hand back `item` if `actor` may see it.
    pub async fn read_shareable<T: Shareable>(
        &self,
        actor: Option<&str>,
        item: T,
    ) -> Result<T, AccessError> {
        let actor = authenticated(actor)?;
        if self.visibility.can_view(actor, &item).await? {
            Ok(item)
        } else {
            tracing::warn!(actor, owner = item.owner_id(), "shareable read denied");
            Err(AccessError::Forbidden(format!(
                "{actor} may not view this item"
            )))
        }
    }

    /// The subset of `items` visible to `actor`, in order.
    pub async fn list_shareable<T: Shareable>(
        &self,
        actor: Option<&str>,
        items: Vec<T>,
    ) -> Result<Vec<T>, AccessError> {
        let actor = authenticated(actor)?;
        Ok(self.visibility.filter_visible(actor, items).await?)
    }

    /// `Ok` if `actor` may change the sharing of `item`.
    pub fn manage_shareable<T: Shareable + ?Sized>(
        &self,
        actor: Option<&str>,
        item: &T,
    ) -> Result<(), AccessError> {
        let actor = authenticated(actor)?;
        if self.visibility.can_manage(actor, item) {
            Ok(())
        } else {
            tracing::warn!(actor, owner = item.owner_id(), "sharing change denied");
            Err(AccessError::Forbidden(format!(
                "only the owner may change sharing, not {actor}"
            )))
        }
    }

    async fn check(
        &self,
        actor: &str,
        resource_type: &str,
        context_id: &str,
        required: PermissionLevel,
    ) -> Result<(), AccessError> {
        match self
            .resolver
            .check(actor, resource_type, context_id, required)
            .await
        {
            Ok(true) => Ok(()),
            Ok(false) => {
                tracing::warn!(
                    actor,
                    resource = resource_type,
                    context = context_id,
                    level = %required,
                    "access denied"
                );
                Err(AccessError::Forbidden(format!(
                    "{actor} lacks {required} on {resource_type} in context {context_id}"
                )))
            }
            Err(e) => {
                tracing::error!(actor, resource = resource_type, error = %e, "authorization lookup failed");
                Err(AccessError::ServiceUnavailable(e.to_string()))
            }
        }
    }

    async fn announce(
        &self,
        action: &str,
        resource_type: &str,
        entity_id: &str,
        actor: &str,
        context_id: &str,
        applied: &Applied,
    ) {
        if !self.publisher.is_enabled() {
            return;
        }
        let Some(scope) = self.directory.resources().scope_of(resource_type) else {
            return;
        };
        let event = EntityEvent::new(
            action,
            resource_type,
            entity_id,
            actor,
            ScopeDescriptor::new(scope, context_id, PermissionLevel::Read),
        )
        .with_payload(serde_json::json!({
            "new_version": applied.version,
            "old_version": applied.previous_version,
            "changes": applied.audit.changes,
        }));
        if let Err(e) = self.publisher.publish(event).await {
            tracing::warn!(entity = entity_id, error = %e, "event publish failed");
        }
    }
}

fn authenticated(actor: Option<&str>) -> Result<&str, AccessError> {
    match actor.map(str::trim) {
        Some(actor) if !actor.is_empty() => Ok(actor),
        _ => Err(AccessError::Unauthorized("no authenticated actor".into())),
    }
}
