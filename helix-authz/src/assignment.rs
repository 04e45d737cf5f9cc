//! Grants of permissions to users and teams at context instances.

use crate::directory::AccessDirectory;
use crate::error::AuthzError;
use crate::model::{new_id, Assignment, Grantee};
use chrono::Utc;
use std::collections::HashSet;

pub struct AssignmentStore {
    directory: AccessDirectory,
}

impl AssignmentStore {
    pub(crate) fn new(directory: AccessDirectory) -> Self {
        Self { directory }
    }

    /// Grant `permission_id` to `grantee` at `context_id`.
    ///
    /// The permission's current level is captured on the assignment.
    /// An absent permission or context is `NotFound`; a soft-deleted one is
    /// `InvalidReference`.
    pub async fn grant(
        &self,
        permission_id: &str,
        grantee: Grantee,
        context_id: &str,
    ) -> Result<Assignment, AuthzError> {
        if grantee.id().trim().is_empty() {
            return Err(AuthzError::InvalidInput("grantee id cannot be empty".into()));
        }
        let backend = self.directory.backend();
        let permission = match backend.permission(permission_id).await? {
            Some(p) if p.deleted => {
                return Err(AuthzError::InvalidReference(format!(
                    "permission {permission_id} is deleted"
                )))
            }
            Some(p) => p,
            None => return Err(AuthzError::NotFound(format!("permission {permission_id}"))),
        };
        match backend.context(context_id).await? {
            Some(c) if c.deleted => {
                return Err(AuthzError::InvalidReference(format!(
                    "context {context_id} is deleted"
                )))
            }
            Some(_) => {}
            None => return Err(AuthzError::NotFound(format!("context {context_id}"))),
        }

        let assignment = Assignment {
            id: new_id(),
            permission_id: permission.id,
            grantee,
            context_id: context_id.to_string(),
            granted_level: permission.level,
            created: Utc::now(),
            revoked: false,
            revoked_at: None,
        };
        backend.save_assignment(assignment.clone()).await?;
        self.directory.clear_cache();
        tracing::debug!(
            assignment = %assignment.id,
            grantee = %assignment.grantee,
            context = %context_id,
            level = %assignment.granted_level,
            "permission granted"
        );
        Ok(assignment)
    }

    /// Revoke a live assignment. The row is kept for inspection.
    pub async fn revoke(&self, id: &str) -> Result<Assignment, AuthzError> {
        let mut assignment = match self.directory.backend().assignment(id).await? {
            Some(a) if !a.revoked => a,
            _ => return Err(AuthzError::NotFound(format!("assignment {id}"))),
        };
        assignment.revoked = true;
        assignment.revoked_at = Some(Utc::now());
        self.directory
            .backend()
            .save_assignment(assignment.clone())
            .await?;
        self.directory.clear_cache();
        tracing::debug!(assignment = %id, grantee = %assignment.grantee, "assignment revoked");
        Ok(assignment)
    }

    /// Assignment by id, revoked or not.
    pub async fn get(&self, id: &str) -> Result<Assignment, AuthzError> {
        self.directory
            .backend()
            .assignment(id)
            .await?
            .ok_or_else(|| AuthzError::NotFound(format!("assignment {id}")))
    }

    /// Live assignments attached to `context_id`.
    pub async fn at_context(&self, context_id: &str) -> Result<Vec<Assignment>, AuthzError> {
        let mut assignments: Vec<_> = self
            .directory
            .backend()
            .assignments_at(context_id)
            .await?
            .into_iter()
            .filter(|a| !a.revoked)
            .collect();
        assignments.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)));
        Ok(assignments)
    }

    /// Live assignments held directly by `grantee`.
    pub async fn for_grantee(&self, grantee: &Grantee) -> Result<Vec<Assignment>, AuthzError> {
        let mut assignments: Vec<_> = self
            .directory
            .backend()
            .assignments()
            .await?
            .into_iter()
            .filter(|a| !a.revoked && &a.grantee == grantee)
            .collect();
        assignments.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)));
        Ok(assignments)
    }

    /// Every live assignment that applies to `actor`, directly or through
    /// one of `teams`, whose permission and context are both live.
    pub async fn effective_for(
        &self,
        actor: &str,
        teams: &HashSet<String>,
    ) -> Result<Vec<Assignment>, AuthzError> {
        let backend = self.directory.backend();
        let live_permissions: HashSet<String> = backend
            .permissions()
            .await?
            .into_iter()
            .filter(|p| !p.deleted)
            .map(|p| p.id)
            .collect();
        let live_contexts: HashSet<String> = backend
            .contexts()
            .await?
            .into_iter()
            .filter(|c| !c.deleted)
            .map(|c| c.id)
            .collect();
        let mut assignments: Vec<_> = backend
            .assignments()
            .await?
            .into_iter()
            .filter(|a| {
                !a.revoked
                    && a.grantee.covers(actor, teams)
                    && live_permissions.contains(&a.permission_id)
                    && live_contexts.contains(&a.context_id)
            })
            .collect();
        assignments.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)));
        Ok(assignments)
    }

    /// Refresh the captured level of every live assignment of
    /// `permission_id` from the permission's current level.
    ///
    /// Returns how many assignments changed.
    pub async fn reevaluate(&self, permission_id: &str) -> Result<usize, AuthzError> {
        let backend = self.directory.backend();
        let permission = match backend.permission(permission_id).await? {
            Some(p) if !p.deleted => p,
            _ => return Err(AuthzError::NotFound(format!("permission {permission_id}"))),
        };
        let mut changed = 0;
        for mut assignment in backend.assignments_of(permission_id).await? {
            if assignment.revoked || assignment.granted_level == permission.level {
                continue;
            }
            assignment.granted_level = permission.level;
            backend.save_assignment(assignment).await?;
            changed += 1;
        }
        if changed > 0 {
            self.directory.clear_cache();
        }
        tracing::info!(permission = %permission_id, level = %permission.level, changed, "assignments re-evaluated");
        Ok(changed)
    }
}
