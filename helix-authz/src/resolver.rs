//! Answers "may this actor act at this level on this resource?".
//!
//! The walk starts at the context instance supplied with the request and
//! climbs `parent_id` pointers, visiting scopes in
//! [`ContextScope::upward`] order. At each instance it looks for a live
//! assignment held by the actor or one of the actor's teams whose granted
//! level covers the requirement. The first hit allows; running out of
//! ancestors denies.

use crate::cache::CacheKey;
use crate::directory::AccessDirectory;
use crate::error::AuthzError;
use crate::membership::MembershipProvider;
use crate::model::{Assignment, ContextInstance};
use helix_core::{ContextScope, PermissionLevel};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Why a check came out the way it did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub allowed: bool,
    /// The assignment that granted access.
    pub assignment_id: Option<String>,
    /// Scope of the instance the matching assignment is attached to.
    pub scope: Option<ContextScope>,
    /// Scopes inspected, narrowest first.
    pub visited: Vec<ContextScope>,
}

impl Decision {
    fn deny(visited: Vec<ContextScope>) -> Self {
        Self {
            allowed: false,
            assignment_id: None,
            scope: None,
            visited,
        }
    }
}

/// Clonable resolver bound to a directory and a membership provider.
#[derive(Clone)]
pub struct AuthorizationResolver {
    directory: AccessDirectory,
    membership: Arc<dyn MembershipProvider>,
}

impl AuthorizationResolver {
    pub fn new(directory: AccessDirectory, membership: Arc<dyn MembershipProvider>) -> Self {
        Self {
            directory,
            membership,
        }
    }

    pub fn membership(&self) -> &Arc<dyn MembershipProvider> {
        &self.membership
    }

    /// Check whether `actor` holds `required` on a `resource_type` living
    /// at context instance `context_id`.
    ///
    /// Unknown resource types, missing or deleted target instances, and an
    /// instance of the wrong scope for the resource type all deny.
    /// Lookup failures are returned as [`AuthzError::Unavailable`].
    pub async fn check(
        &self,
        actor: &str,
        resource_type: &str,
        context_id: &str,
        required: PermissionLevel,
    ) -> Result<bool, AuthzError> {
        match self.scope_of(actor, resource_type) {
            Some(scope) => self.check_in_scope(actor, scope, context_id, required).await,
            None => Ok(false),
        }
    }

    /// Like [`check`](Self::check) with the scope given directly, bypassing
    /// the resource type table.
    pub async fn check_in_scope(
        &self,
        actor: &str,
        scope: ContextScope,
        context_id: &str,
        required: PermissionLevel,
    ) -> Result<bool, AuthzError> {
        // Read before any lookup: a write from here on invalidates the result.
        let generation = self.directory.cache().map(|cache| cache.generation());

        let Some(target) = self.admit(actor, Some(scope), context_id).await? else {
            return Ok(false);
        };

        let key = CacheKey::new(actor, context_id, required);
        if let Some(allowed) = self.directory.cache().and_then(|cache| cache.get(&key)) {
            tracing::trace!(actor, context = context_id, level = %required, allowed, "cache hit");
            return Ok(allowed);
        }

        let allowed = self.walk(actor, target, required).await?.allowed;

        if let Some((cache, generation)) = self.directory.cache().zip(generation) {
            cache.set(key, allowed, generation);
        }
        Ok(allowed)
    }

    /// Like [`check`](Self::check), uncached, returning the full [`Decision`].
    pub async fn explain(
        &self,
        actor: &str,
        resource_type: &str,
        context_id: &str,
        required: PermissionLevel,
    ) -> Result<Decision, AuthzError> {
        let Some(scope) = self.scope_of(actor, resource_type) else {
            return Ok(Decision::deny(Vec::new()));
        };
        match self.admit(actor, Some(scope), context_id).await? {
            Some(target) => self.walk(actor, target, required).await,
            None => Ok(Decision::deny(Vec::new())),
        }
    }

    /// Check directly against a context instance, whatever its scope.
    pub async fn check_context(
        &self,
        actor: &str,
        context_id: &str,
        required: PermissionLevel,
    ) -> Result<bool, AuthzError> {
        match self.admit(actor, None, context_id).await? {
            Some(target) => Ok(self.walk(actor, target, required).await?.allowed),
            None => Ok(false),
        }
    }

    fn scope_of(&self, actor: &str, resource_type: &str) -> Option<ContextScope> {
        let scope = self.directory.resources().scope_of(resource_type);
        if scope.is_none() {
            tracing::debug!(actor, resource_type, "unknown resource type, denying");
        }
        scope
    }

    /// The target instance, if the request may be evaluated at all.
    async fn admit(
        &self,
        actor: &str,
        expected_scope: Option<ContextScope>,
        context_id: &str,
    ) -> Result<Option<ContextInstance>, AuthzError> {
        let Some(target) = self.target(context_id).await? else {
            tracing::debug!(actor, context = context_id, "target context missing or deleted, denying");
            return Ok(None);
        };
        if expected_scope.is_some_and(|scope| scope != target.scope) {
            tracing::debug!(
                actor,
                context = context_id,
                scope = %target.scope,
                "context scope does not match resource type, denying"
            );
            return Ok(None);
        }
        Ok(Some(target))
    }

    async fn walk(
        &self,
        actor: &str,
        target: ContextInstance,
        required: PermissionLevel,
    ) -> Result<Decision, AuthzError> {
        let teams = self
            .membership
            .teams_of(actor)
            .await
            .map_err(AuthzError::unavailable)?;

        let context_id = target.id.clone();
        let start = target.scope;
        let mut live_permissions = HashMap::new();
        let mut visited = Vec::new();
        let mut cursor = Some(target);
        for scope in start.upward() {
            let Some(instance) = cursor.take() else { break };
            if instance.scope != scope {
                // No instance at this scope along the chain.
                cursor = Some(instance);
                continue;
            }
            visited.push(scope);

            if !instance.deleted {
                if let Some(hit) = self
                    .matching_assignment(&instance, actor, &teams, required, &mut live_permissions)
                    .await?
                {
                    tracing::trace!(
                        actor,
                        context = %context_id,
                        level = %required,
                        scope = %scope,
                        assignment = %hit.id,
                        "access granted"
                    );
                    return Ok(Decision {
                        allowed: true,
                        assignment_id: Some(hit.id),
                        scope: Some(scope),
                        visited,
                    });
                }
            }

            cursor = match &instance.parent_id {
                Some(parent_id) => self.parent_of(&instance, parent_id).await?,
                None => None,
            };
        }

        tracing::trace!(actor, context = %context_id, level = %required, "access denied");
        Ok(Decision::deny(visited))
    }

    async fn target(&self, context_id: &str) -> Result<Option<ContextInstance>, AuthzError> {
        let target = self
            .directory
            .backend()
            .context(context_id)
            .await
            .map_err(AuthzError::unavailable)?;
        Ok(target.filter(|c| !c.deleted))
    }

    async fn parent_of(
        &self,
        child: &ContextInstance,
        parent_id: &str,
    ) -> Result<Option<ContextInstance>, AuthzError> {
        let parent = self
            .directory
            .backend()
            .context(parent_id)
            .await
            .map_err(AuthzError::unavailable)?;
        match parent {
            Some(parent) if parent.scope.is_broader_than(child.scope) => Ok(Some(parent)),
            Some(parent) => {
                tracing::warn!(
                    context = %child.id,
                    parent = %parent.id,
                    "parent is not broader than child, stopping walk"
                );
                Ok(None)
            }
            None => {
                tracing::warn!(context = %child.id, parent = parent_id, "dangling parent reference");
                Ok(None)
            }
        }
    }

    async fn matching_assignment(
        &self,
        instance: &ContextInstance,
        actor: &str,
        teams: &HashSet<String>,
        required: PermissionLevel,
        live_permissions: &mut HashMap<String, bool>,
    ) -> Result<Option<Assignment>, AuthzError> {
        let backend = self.directory.backend();
        let candidates = backend
            .assignments_at(&instance.id)
            .await
            .map_err(AuthzError::unavailable)?;
        for assignment in candidates {
            if !assignment.grants(actor, teams, required) {
                continue;
            }
            let live = match live_permissions.get(&assignment.permission_id) {
                Some(live) => *live,
                None => {
                    let live = backend
                        .permission(&assignment.permission_id)
                        .await
                        .map_err(AuthzError::unavailable)?
                        .is_some_and(|p| !p.deleted);
                    live_permissions.insert(assignment.permission_id.clone(), live);
                    live
                }
            };
            if live {
                return Ok(Some(assignment));
            }
        }
        Ok(None)
    }
}
