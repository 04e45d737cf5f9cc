//! Clonable handle to the authorization directory.

use crate::assignment::AssignmentStore;
use crate::backend::{AccessBackend, MemoryBackend};
use crate::cache::DecisionCache;
use crate::catalog::PermissionCatalog;
use crate::config::AuthzConfig;
use crate::context::ContextRegistry;
use crate::membership::MembershipProvider;
use crate::resolver::AuthorizationResolver;
use helix_core::ResourceScopes;
use std::sync::Arc;

/// Entry point to permissions, contexts, assignments and checks.
///
/// Wraps any [`AccessBackend`] and optionally a [`DecisionCache`]. Every
/// write made through [`permissions()`](Self::permissions),
/// [`contexts()`](Self::contexts) or [`assignments()`](Self::assignments)
/// clears the cache before returning, so a resolver never answers from a
/// decision older than the last grant or revoke.
///
/// ```ignore
/// let (directory, _backend) = AccessDirectory::memory();
/// let read = directory.permissions().create("READ", None, PermissionLevel::Read).await?;
/// let project = directory.contexts().create(ContextScope::Project, "HLX", None).await?;
/// directory.assignments().grant(&read.id, Grantee::user("alice"), &project.id).await?;
///
/// let resolver = directory.resolver(StaticMembership::new());
/// assert!(resolver.check("alice", "ticket", &project.id, PermissionLevel::Read).await?);
/// ```
#[derive(Clone)]
pub struct AccessDirectory {
    backend: Arc<dyn AccessBackend>,
    cache: Option<Arc<DecisionCache>>,
    resources: Arc<ResourceScopes>,
}

impl AccessDirectory {
    /// Directory over `backend`, uncached, with the built-in resource types.
    pub fn new(backend: impl AccessBackend) -> Self {
        Self {
            backend: Arc::new(backend),
            cache: None,
            resources: Arc::new(ResourceScopes::new()),
        }
    }

    /// Directory configured from an [`AuthzConfig`].
    pub fn from_config(backend: impl AccessBackend, config: &AuthzConfig) -> Self {
        let directory = Self::new(backend).with_resources(config.resources.clone());
        if config.cache_enabled {
            directory.with_cache(config.cache_ttl_secs)
        } else {
            directory
        }
    }

    /// Directory over a fresh [`MemoryBackend`], returning a handle to it.
    pub fn memory() -> (Self, MemoryBackend) {
        let backend = MemoryBackend::new();
        (Self::new(backend.clone()), backend)
    }

    /// Enable decision caching.
    pub fn with_cache(mut self, ttl_secs: u64) -> Self {
        self.cache = Some(Arc::new(DecisionCache::new(ttl_secs)));
        self
    }

    pub fn with_resources(mut self, resources: ResourceScopes) -> Self {
        self.resources = Arc::new(resources);
        self
    }

    pub fn permissions(&self) -> PermissionCatalog {
        PermissionCatalog::new(self.clone())
    }

    pub fn contexts(&self) -> ContextRegistry {
        ContextRegistry::new(self.clone())
    }

    pub fn assignments(&self) -> AssignmentStore {
        AssignmentStore::new(self.clone())
    }

    /// Resolver answering checks against this directory.
    pub fn resolver(&self, membership: impl MembershipProvider) -> AuthorizationResolver {
        AuthorizationResolver::new(self.clone(), Arc::new(membership))
    }

    pub fn backend(&self) -> &Arc<dyn AccessBackend> {
        &self.backend
    }

    pub fn resources(&self) -> &ResourceScopes {
        &self.resources
    }

    pub(crate) fn cache(&self) -> Option<&DecisionCache> {
        self.cache.as_deref()
    }

    /// Clear all cached decisions.
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    /// Number of cached decisions, `0` when caching is off.
    pub fn cached_decisions(&self) -> usize {
        self.cache.as_ref().map_or(0, |cache| cache.len())
    }
}
