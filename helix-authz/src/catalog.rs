//! The permission catalog.

use crate::directory::AccessDirectory;
use crate::error::AuthzError;
use crate::model::{new_id, Permission};
use chrono::Utc;
use helix_core::PermissionLevel;

/// Partial update of a [`Permission`]. `None` leaves the field as is.
#[derive(Debug, Clone, Default)]
pub struct PermissionUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub level: Option<PermissionLevel>,
}

/// Create, edit and soft-delete permissions.
///
/// Editing a permission's level does not touch existing assignments: they
/// keep the level they were granted with until
/// [`AssignmentStore::reevaluate`](crate::AssignmentStore::reevaluate) runs.
pub struct PermissionCatalog {
    directory: AccessDirectory,
}

impl PermissionCatalog {
    pub(crate) fn new(directory: AccessDirectory) -> Self {
        Self { directory }
    }

    pub async fn create(
        &self,
        title: &str,
        description: Option<&str>,
        level: PermissionLevel,
    ) -> Result<Permission, AuthzError> {
        let title = validate_title(title)?;
        let now = Utc::now();
        let permission = Permission {
            id: new_id(),
            title,
            description: description.map(str::to_string),
            level,
            created: now,
            modified: now,
            deleted: false,
        };
        self.directory
            .backend()
            .save_permission(permission.clone())
            .await?;
        self.directory.clear_cache();
        tracing::debug!(permission = %permission.id, title = %permission.title, level = %level, "permission created");
        Ok(permission)
    }

    /// Live permission by id.
    pub async fn get(&self, id: &str) -> Result<Permission, AuthzError> {
        match self.directory.backend().permission(id).await? {
            Some(p) if !p.deleted => Ok(p),
            _ => Err(AuthzError::NotFound(format!("permission {id}"))),
        }
    }

    /// Live permissions, ordered by title.
    pub async fn list(&self) -> Result<Vec<Permission>, AuthzError> {
        let mut permissions: Vec<_> = self
            .directory
            .backend()
            .permissions()
            .await?
            .into_iter()
            .filter(|p| !p.deleted)
            .collect();
        permissions.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));
        Ok(permissions)
    }

    pub async fn update(&self, id: &str, update: PermissionUpdate) -> Result<Permission, AuthzError> {
        let mut permission = self.get(id).await?;
        if let Some(title) = update.title {
            permission.title = validate_title(&title)?;
        }
        if let Some(description) = update.description {
            permission.description = description;
        }
        if let Some(level) = update.level {
            if level != permission.level {
                tracing::info!(
                    permission = %id,
                    from = %permission.level,
                    to = %level,
                    "permission level changed; existing assignments keep their granted level"
                );
            }
            permission.level = level;
        }
        permission.modified = Utc::now();
        self.directory
            .backend()
            .save_permission(permission.clone())
            .await?;
        self.directory.clear_cache();
        Ok(permission)
    }

    /// Soft-delete. Assignments of a deleted permission stop matching.
    pub async fn remove(&self, id: &str) -> Result<(), AuthzError> {
        let mut permission = self.get(id).await?;
        permission.deleted = true;
        permission.modified = Utc::now();
        self.directory.backend().save_permission(permission).await?;
        self.directory.clear_cache();
        tracing::debug!(permission = %id, "permission deleted");
        Ok(())
    }
}

fn validate_title(title: &str) -> Result<String, AuthzError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AuthzError::InvalidInput("permission title cannot be empty".into()));
    }
    Ok(title.to_string())
}
