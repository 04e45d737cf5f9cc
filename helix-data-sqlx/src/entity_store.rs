use crate::codec::{
    from_json, timestamp_from_db, timestamp_to_db, to_json, version_from_db, version_to_db,
};
use crate::error::{SqlxErrorExt, SqlxResult};
use crate::schema::table_name;
use helix_data::{AuditAction, AuditRecord, DataError, EntityRecord, EntityStore};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

/// SQLite-backed [`EntityStore`] for one entity type.
///
/// The record lives in table `<entity_type>` and its audit trail in
/// `<entity_type>_history`. The version check and the history row share a
/// transaction, so a lost race leaves both tables untouched.
///
/// ```ignore
/// schema::migrate_entity(&pool, "ticket").await?;
/// let store = SqlxEntityStore::new(pool, "ticket")?;
/// let tickets = VersionedEntityController::new("ticket", store);
/// ```
#[derive(Clone)]
pub struct SqlxEntityStore {
    pool: SqlitePool,
    table: String,
}

impl SqlxEntityStore {
    pub fn new(pool: SqlitePool, entity_type: &str) -> SqlxResult<Self> {
        Ok(Self {
            pool,
            table: table_name(entity_type)?,
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn append_history(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        audit: &AuditRecord,
    ) -> SqlxResult<()> {
        let sql = format!(
            "INSERT INTO {}_history \
             (id, entity_id, version, action, actor_id, timestamp, before_fields, after_fields, changes, summary) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            self.table
        );
        let before = audit.before.as_ref().map(to_json).transpose().map_err(DataError::Other)?;
        let after = audit.after.as_ref().map(to_json).transpose().map_err(DataError::Other)?;
        sqlx::query(&sql)
            .bind(&audit.id)
            .bind(&audit.entity_id)
            .bind(version_to_db(audit.version).map_err(DataError::Other)?)
            .bind(audit.action.as_str())
            .bind(&audit.actor_id)
            .bind(timestamp_to_db(&audit.timestamp))
            .bind(before)
            .bind(after)
            .bind(to_json(&audit.changes).map_err(DataError::Other)?)
            .bind(&audit.summary)
            .execute(&mut **tx)
            .await
            .map_err(|e| e.into_data_error())?;
        Ok(())
    }

    fn audit_from_row(&self, row: &SqliteRow) -> SqlxResult<AuditRecord> {
        let get = |e: sqlx::Error| e.into_data_error();
        let action: String = row.try_get("action").map_err(get)?;
        let before: Option<String> = row.try_get("before_fields").map_err(get)?;
        let after: Option<String> = row.try_get("after_fields").map_err(get)?;
        let changes: String = row.try_get("changes").map_err(get)?;
        let timestamp: String = row.try_get("timestamp").map_err(get)?;
        Ok(AuditRecord {
            id: row.try_get("id").map_err(get)?,
            entity_type: self.table.clone(),
            entity_id: row.try_get("entity_id").map_err(get)?,
            version: version_from_db(row.try_get("version").map_err(get)?)
                .map_err(DataError::Other)?,
            action: AuditAction::parse(&action)
                .ok_or_else(|| DataError::Other(format!("unknown audit action {action:?}")))?,
            actor_id: row.try_get("actor_id").map_err(get)?,
            timestamp: timestamp_from_db(&timestamp).map_err(DataError::Other)?,
            before: before.as_deref().map(from_json).transpose().map_err(DataError::Other)?,
            after: after.as_deref().map(from_json).transpose().map_err(DataError::Other)?,
            changes: from_json(&changes).map_err(DataError::Other)?,
            summary: row.try_get("summary").map_err(get)?,
        })
    }
}

fn record_from_row(row: &SqliteRow) -> SqlxResult<EntityRecord> {
    let get = |e: sqlx::Error| e.into_data_error();
    let fields: String = row.try_get("fields").map_err(get)?;
    Ok(EntityRecord {
        id: row.try_get("id").map_err(get)?,
        version: version_from_db(row.try_get("version").map_err(get)?).map_err(DataError::Other)?,
        deleted: row.try_get("deleted").map_err(get)?,
        fields: from_json(&fields).map_err(DataError::Other)?,
    })
}

impl EntityStore for SqlxEntityStore {
    async fn load(&self, id: &str) -> Result<Option<EntityRecord>, DataError> {
        let sql = format!(
            "SELECT id, version, deleted, fields FROM {} WHERE id = ?",
            self.table
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| e.into_data_error())?;
        row.as_ref().map(record_from_row).transpose()
    }

    async fn insert(&self, record: &EntityRecord, audit: &AuditRecord) -> Result<bool, DataError> {
        let mut tx = self.pool.begin().await.map_err(|e| e.into_data_error())?;
        let sql = format!(
            "INSERT INTO {} (id, version, deleted, fields) VALUES (?, ?, ?, ?) \
             ON CONFLICT (id) DO NOTHING",
            self.table
        );
        let inserted = sqlx::query(&sql)
            .bind(&record.id)
            .bind(version_to_db(record.version).map_err(DataError::Other)?)
            .bind(record.deleted)
            .bind(to_json(&record.fields).map_err(DataError::Other)?)
            .execute(&mut *tx)
            .await
            .map_err(|e| e.into_data_error())?
            .rows_affected();
        if inserted == 0 {
            return Ok(false);
        }
        self.append_history(&mut tx, audit).await?;
        tx.commit().await.map_err(|e| e.into_data_error())?;
        Ok(true)
    }

    async fn compare_and_swap(
        &self,
        expected: u64,
        record: &EntityRecord,
        audit: &AuditRecord,
    ) -> Result<bool, DataError> {
        let mut tx = self.pool.begin().await.map_err(|e| e.into_data_error())?;
        let sql = format!(
            "UPDATE {} SET version = ?, deleted = ?, fields = ? WHERE id = ? AND version = ?",
            self.table
        );
        let updated = sqlx::query(&sql)
            .bind(version_to_db(record.version).map_err(DataError::Other)?)
            .bind(record.deleted)
            .bind(to_json(&record.fields).map_err(DataError::Other)?)
            .bind(&record.id)
            .bind(version_to_db(expected).map_err(DataError::Other)?)
            .execute(&mut *tx)
            .await
            .map_err(|e| e.into_data_error())?
            .rows_affected();
        if updated == 0 {
            // Dropping `tx` rolls back.
            return Ok(false);
        }
        self.append_history(&mut tx, audit).await?;
        tx.commit().await.map_err(|e| e.into_data_error())?;
        Ok(true)
    }

    async fn history(&self, id: &str) -> Result<Vec<AuditRecord>, DataError> {
        let sql = format!(
            "SELECT id, entity_id, version, action, actor_id, timestamp, before_fields, after_fields, changes, summary \
             FROM {}_history WHERE entity_id = ? ORDER BY version",
            self.table
        );
        let rows = sqlx::query(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.into_data_error())?;
        rows.iter().map(|row| self.audit_from_row(row)).collect()
    }
}
