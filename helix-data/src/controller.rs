//! Optimistic concurrency and audit for versioned entities.

use crate::audit::{AuditAction, AuditRecord};
use crate::diff;
use crate::error::DataError;
use crate::record::{EntityRecord, Fields};
use crate::store::EntityStore;

/// Result of an accepted write.
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    pub version: u64,
    pub previous_version: u64,
    pub audit: AuditRecord,
}

/// Guards every write to one entity type with a version check.
///
/// A write names the version it was computed from. If the entity moved on
/// in the meantime the write is rejected with [`DataError::Conflict`]
/// carrying both versions; the controller never retries on its own. The
/// check is repeated by the store at write time, so two writers racing on
/// the same version cannot both succeed.
///
/// ```ignore
/// let tickets = VersionedEntityController::new("ticket", MemoryEntityStore::new());
/// tickets.create("t1", fields, "alice").await?;
/// let applied = tickets.apply_patch("t1", Some(1), patch, "alice").await?;
/// assert_eq!(applied.version, 2);
/// ```
pub struct VersionedEntityController<S> {
    entity_type: String,
    store: S,
}

impl<S: EntityStore> VersionedEntityController<S> {
    pub fn new(entity_type: impl Into<String>, store: S) -> Self {
        Self {
            entity_type: entity_type.into(),
            store,
        }
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Insert `entity_id` at version 1.
    ///
    /// An id that is already taken is reported as a conflict against
    /// expected version `0`.
    pub async fn create(
        &self,
        entity_id: &str,
        fields: Fields,
        actor_id: &str,
    ) -> Result<Applied, DataError> {
        let record = EntityRecord::new(entity_id, fields);
        let audit = AuditRecord::new(
            &self.entity_type,
            entity_id,
            record.version,
            AuditAction::Create,
            actor_id,
            None,
            Some(record.fields.clone()),
        );
        if !self.store.insert(&record, &audit).await? {
            let actual = self
                .store
                .load(entity_id)
                .await?
                .map_or(0, |existing| existing.version);
            return Err(self.conflict(entity_id, 0, actual));
        }
        tracing::debug!(entity = %self.entity_type, id = entity_id, actor = actor_id, "entity created");
        Ok(Applied {
            version: record.version,
            previous_version: 0,
            audit,
        })
    }

    /// Live record.
    pub async fn get(&self, entity_id: &str) -> Result<EntityRecord, DataError> {
        match self.store.load(entity_id).await? {
            Some(record) if !record.deleted => Ok(record),
            _ => Err(self.not_found(entity_id)),
        }
    }

    /// Apply `mutation` to the fields of `entity_id`.
    ///
    /// Without `expected_version` the current version is used, which gives
    /// up conflict detection for this caller.
    pub async fn apply<F>(
        &self,
        entity_id: &str,
        expected_version: Option<u64>,
        mutation: F,
        actor_id: &str,
    ) -> Result<Applied, DataError>
    where
        F: FnOnce(&mut Fields) + Send,
    {
        let current = self.get(entity_id).await?;
        let expected = self.expect(&current, expected_version)?;

        let mut fields = current.fields.clone();
        mutation(&mut fields);

        let next = EntityRecord {
            id: current.id.clone(),
            version: current.version + 1,
            deleted: false,
            fields,
        };
        self.write(
            expected,
            AuditAction::Update,
            Some(current.fields),
            next,
            actor_id,
        )
        .await
    }

    /// Merge `patch` into the current fields; a JSON `null` removes a field.
    pub async fn apply_patch(
        &self,
        entity_id: &str,
        expected_version: Option<u64>,
        patch: Fields,
        actor_id: &str,
    ) -> Result<Applied, DataError> {
        self.apply(
            entity_id,
            expected_version,
            move |fields| diff::apply_patch(fields, patch),
            actor_id,
        )
        .await
    }

    /// Soft-delete under the same version rules as [`apply`](Self::apply).
    pub async fn remove(
        &self,
        entity_id: &str,
        expected_version: Option<u64>,
        actor_id: &str,
    ) -> Result<Applied, DataError> {
        let current = self.get(entity_id).await?;
        let expected = self.expect(&current, expected_version)?;
        let next = EntityRecord {
            id: current.id.clone(),
            version: current.version + 1,
            deleted: true,
            fields: current.fields.clone(),
        };
        self.write(
            expected,
            AuditAction::Remove,
            Some(current.fields),
            next,
            actor_id,
        )
        .await
    }

    /// Audit log of `entity_id`, ordered by version. Removed entities keep
    /// their history.
    pub async fn history(&self, entity_id: &str) -> Result<Vec<AuditRecord>, DataError> {
        if self.store.load(entity_id).await?.is_none() {
            return Err(self.not_found(entity_id));
        }
        self.store.history(entity_id).await
    }

    fn expect(&self, current: &EntityRecord, expected: Option<u64>) -> Result<u64, DataError> {
        let expected = expected.unwrap_or(current.version);
        if expected != current.version {
            return Err(self.conflict(&current.id, expected, current.version));
        }
        Ok(expected)
    }

    async fn write(
        &self,
        expected: u64,
        action: AuditAction,
        before: Option<Fields>,
        next: EntityRecord,
        actor_id: &str,
    ) -> Result<Applied, DataError> {
        let after = (!next.deleted).then(|| next.fields.clone());
        let audit = AuditRecord::new(
            &self.entity_type,
            &next.id,
            next.version,
            action,
            actor_id,
            before,
            after,
        );

        if !self.store.compare_and_swap(expected, &next, &audit).await? {
            let actual = match self.store.load(&next.id).await? {
                Some(record) => record.version,
                None => return Err(self.not_found(&next.id)),
            };
            return Err(self.conflict(&next.id, expected, actual));
        }

        tracing::debug!(
            entity = %self.entity_type,
            id = %next.id,
            version = next.version,
            action = %action,
            actor = actor_id,
            summary = %audit.summary,
            "entity written"
        );
        Ok(Applied {
            version: next.version,
            previous_version: expected,
            audit,
        })
    }

    fn conflict(&self, entity_id: &str, expected: u64, actual: u64) -> DataError {
        tracing::debug!(
            entity = %self.entity_type,
            id = entity_id,
            expected,
            actual,
            "version conflict"
        );
        DataError::Conflict {
            entity: format!("{} {}", self.entity_type, entity_id),
            expected,
            actual,
        }
    }

    fn not_found(&self, entity_id: &str) -> DataError {
        DataError::NotFound(format!("{} {}", self.entity_type, entity_id))
    }
}
