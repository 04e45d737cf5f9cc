//! The context instance registry.

use crate::directory::AccessDirectory;
use crate::error::AuthzError;
use crate::model::{new_id, ContextInstance};
use chrono::Utc;
use helix_core::ContextScope;

/// Create and maintain the concrete scope hierarchy.
///
/// A parent must exist, be live and sit strictly above the child. A
/// `Node` never has a parent. Deleting an instance does not cascade: its
/// children stay in place and authorization keeps walking through it, but
/// assignments attached to it no longer match.
pub struct ContextRegistry {
    directory: AccessDirectory,
}

impl ContextRegistry {
    pub(crate) fn new(directory: AccessDirectory) -> Self {
        Self { directory }
    }

    pub async fn create(
        &self,
        scope: ContextScope,
        key: &str,
        parent_id: Option<&str>,
    ) -> Result<ContextInstance, AuthzError> {
        let key = validate_key(key)?;
        if let Some(parent_id) = parent_id {
            self.check_parent(scope, parent_id).await?;
        }
        let now = Utc::now();
        let context = ContextInstance {
            id: new_id(),
            scope,
            key,
            parent_id: parent_id.map(str::to_string),
            created: now,
            modified: now,
            deleted: false,
        };
        self.directory
            .backend()
            .save_context(context.clone())
            .await?;
        self.directory.clear_cache();
        tracing::debug!(context = %context.id, scope = %scope, key = %context.key, "context created");
        Ok(context)
    }

    /// Live context instance by id.
    pub async fn get(&self, id: &str) -> Result<ContextInstance, AuthzError> {
        match self.directory.backend().context(id).await? {
            Some(c) if !c.deleted => Ok(c),
            _ => Err(AuthzError::NotFound(format!("context {id}"))),
        }
    }

    /// Live instances, optionally restricted to one scope.
    pub async fn list(&self, scope: Option<ContextScope>) -> Result<Vec<ContextInstance>, AuthzError> {
        let mut contexts: Vec<_> = self
            .directory
            .backend()
            .contexts()
            .await?
            .into_iter()
            .filter(|c| !c.deleted && scope.map_or(true, |s| c.scope == s))
            .collect();
        contexts.sort_by(|a, b| {
            a.scope
                .depth()
                .cmp(&b.scope.depth())
                .then_with(|| a.key.cmp(&b.key))
        });
        Ok(contexts)
    }

    /// Live instances whose parent is `id`.
    pub async fn children(&self, id: &str) -> Result<Vec<ContextInstance>, AuthzError> {
        Ok(self
            .list(None)
            .await?
            .into_iter()
            .filter(|c| c.parent_id.as_deref() == Some(id))
            .collect())
    }

    /// `id` followed by its ancestors, narrowest first. Deleted ancestors
    /// are included; the chain stops at a root or a dangling parent.
    pub async fn ancestors(&self, id: &str) -> Result<Vec<ContextInstance>, AuthzError> {
        let mut chain = vec![self.get(id).await?];
        while let Some(parent_id) = chain.last().and_then(|c| c.parent_id.clone()) {
            match self.directory.backend().context(&parent_id).await? {
                // Parents are strictly broader, so the chain is at most five long.
                Some(parent) if chain.len() < ContextScope::HIERARCHY.len() => chain.push(parent),
                _ => break,
            }
        }
        Ok(chain)
    }

    pub async fn rename(&self, id: &str, key: &str) -> Result<ContextInstance, AuthzError> {
        let mut context = self.get(id).await?;
        context.key = validate_key(key)?;
        context.modified = Utc::now();
        self.directory
            .backend()
            .save_context(context.clone())
            .await?;
        self.directory.clear_cache();
        Ok(context)
    }

    /// Soft-delete.
    pub async fn remove(&self, id: &str) -> Result<(), AuthzError> {
        let mut context = self.get(id).await?;
        context.deleted = true;
        context.modified = Utc::now();
        self.directory.backend().save_context(context).await?;
        self.directory.clear_cache();
        tracing::debug!(context = %id, "context deleted");
        Ok(())
    }

    async fn check_parent(&self, scope: ContextScope, parent_id: &str) -> Result<(), AuthzError> {
        let parent = match self.directory.backend().context(parent_id).await? {
            Some(p) if !p.deleted => p,
            _ => {
                return Err(AuthzError::InvalidReference(format!(
                    "parent context {parent_id} does not exist"
                )))
            }
        };
        if !parent.scope.is_broader_than(scope) {
            return Err(AuthzError::InvalidReference(format!(
                "a {} cannot be the parent of a {}",
                parent.scope, scope
            )));
        }
        Ok(())
    }
}

fn validate_key(key: &str) -> Result<String, AuthzError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(AuthzError::InvalidInput("context key cannot be empty".into()));
    }
    Ok(key.to_string())
}
