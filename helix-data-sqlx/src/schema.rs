//! Table definitions.
//!
//! Authorization tables are fixed. Each versioned entity type gets a
//! `<type>` table holding the current record and a `<type>_history` table
//! holding one audit row per version.

use crate::error::{SqlxErrorExt, SqlxResult};
use helix_data::DataError;
use sqlx::SqlitePool;

const ACCESS_TABLES: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS permission (
        id          TEXT PRIMARY KEY,
        title       TEXT NOT NULL,
        description TEXT,
        level       INTEGER NOT NULL,
        created     TEXT NOT NULL,
        modified    TEXT NOT NULL,
        deleted     INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS context_instance (
        id          TEXT PRIMARY KEY,
        scope       TEXT NOT NULL,
        context_key TEXT NOT NULL,
        parent_id   TEXT,
        created     TEXT NOT NULL,
        modified    TEXT NOT NULL,
        deleted     INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS assignment (
        id            TEXT PRIMARY KEY,
        permission_id TEXT NOT NULL,
        grantee_kind  TEXT NOT NULL,
        grantee_id    TEXT NOT NULL,
        context_id    TEXT NOT NULL,
        granted_level INTEGER NOT NULL,
        created       TEXT NOT NULL,
        revoked       INTEGER NOT NULL DEFAULT 0,
        revoked_at    TEXT
    )",
    "CREATE INDEX IF NOT EXISTS assignment_context ON assignment (context_id)",
    "CREATE INDEX IF NOT EXISTS assignment_permission ON assignment (permission_id)",
];

/// Create the `permission`, `context_instance` and `assignment` tables.
pub async fn migrate_access(pool: &SqlitePool) -> SqlxResult<()> {
    for statement in ACCESS_TABLES {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| e.into_data_error())?;
    }
    tracing::debug!("access tables ready");
    Ok(())
}

/// Create the record and history tables for `entity_type`.
pub async fn migrate_entity(pool: &SqlitePool, entity_type: &str) -> SqlxResult<()> {
    let table = table_name(entity_type)?;
    let statements = [
        format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                id      TEXT PRIMARY KEY,
                version INTEGER NOT NULL,
                deleted INTEGER NOT NULL DEFAULT 0,
                fields  TEXT NOT NULL
            )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {table}_history (
                id            TEXT NOT NULL,
                entity_id     TEXT NOT NULL,
                version       INTEGER NOT NULL,
                action        TEXT NOT NULL,
                actor_id      TEXT NOT NULL,
                timestamp     TEXT NOT NULL,
                before_fields TEXT,
                after_fields  TEXT,
                changes       TEXT NOT NULL,
                summary       TEXT NOT NULL,
                PRIMARY KEY (entity_id, version)
            )"
        ),
    ];
    for statement in &statements {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| e.into_data_error())?;
    }
    tracing::debug!(entity = %table, "entity tables ready");
    Ok(())
}

/// Entity type names are spliced into SQL, so only `[a-z_][a-z0-9_]*` is accepted.
pub(crate) fn table_name(entity_type: &str) -> SqlxResult<String> {
    let valid = entity_type
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && entity_type
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if !valid {
        return Err(DataError::Other(format!(
            "invalid entity type name: {entity_type}"
        )));
    }
    Ok(entity_type.to_string())
}
