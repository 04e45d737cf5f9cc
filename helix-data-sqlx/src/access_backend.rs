use crate::codec::{timestamp_from_db, timestamp_to_db};
use crate::error::SqlxErrorExt;
use helix_authz::{
    AccessBackend, Assignment, AuthzError, BackendFuture, ContextInstance, Grantee, Permission,
};
use helix_core::{ContextScope, PermissionLevel};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

const PERMISSION_COLUMNS: &str = "id, title, description, level, created, modified, deleted";
const CONTEXT_COLUMNS: &str = "id, scope, context_key, parent_id, created, modified, deleted";
const ASSIGNMENT_COLUMNS: &str = "id, permission_id, grantee_kind, grantee_id, context_id, \
                                  granted_level, created, revoked, revoked_at";

/// SQLite-backed [`AccessBackend`].
///
/// Expects the tables created by [`migrate_access`](crate::schema::migrate_access).
#[derive(Clone)]
pub struct SqlxAccessBackend {
    pool: SqlitePool,
}

impl SqlxAccessBackend {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn column<'r, T>(row: &'r SqliteRow, name: &str) -> Result<T, AuthzError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(name).map_err(|e| e.into_authz_error())
}

fn corrupt(msg: String) -> AuthzError {
    AuthzError::Backend(msg)
}

fn level_from_db(value: i64) -> Result<PermissionLevel, AuthzError> {
    PermissionLevel::from_value(value).ok_or_else(|| corrupt(format!("bad level value {value}")))
}

fn permission_from_row(row: &SqliteRow) -> Result<Permission, AuthzError> {
    Ok(Permission {
        id: column(row, "id")?,
        title: column(row, "title")?,
        description: column(row, "description")?,
        level: level_from_db(column(row, "level")?)?,
        created: timestamp_from_db(&column::<String>(row, "created")?).map_err(corrupt)?,
        modified: timestamp_from_db(&column::<String>(row, "modified")?).map_err(corrupt)?,
        deleted: column(row, "deleted")?,
    })
}

fn context_from_row(row: &SqliteRow) -> Result<ContextInstance, AuthzError> {
    let scope: String = column(row, "scope")?;
    Ok(ContextInstance {
        id: column(row, "id")?,
        scope: scope
            .parse::<ContextScope>()
            .map_err(|e| corrupt(e.to_string()))?,
        key: column(row, "context_key")?,
        parent_id: column(row, "parent_id")?,
        created: timestamp_from_db(&column::<String>(row, "created")?).map_err(corrupt)?,
        modified: timestamp_from_db(&column::<String>(row, "modified")?).map_err(corrupt)?,
        deleted: column(row, "deleted")?,
    })
}

fn assignment_from_row(row: &SqliteRow) -> Result<Assignment, AuthzError> {
    let kind: String = column(row, "grantee_kind")?;
    let grantee_id: String = column(row, "grantee_id")?;
    let grantee = match kind.as_str() {
        "user" => Grantee::User(grantee_id),
        "team" => Grantee::Team(grantee_id),
        other => return Err(corrupt(format!("bad grantee kind {other:?}"))),
    };
    let revoked_at: Option<String> = column(row, "revoked_at")?;
    Ok(Assignment {
        id: column(row, "id")?,
        permission_id: column(row, "permission_id")?,
        grantee,
        context_id: column(row, "context_id")?,
        granted_level: level_from_db(column(row, "granted_level")?)?,
        created: timestamp_from_db(&column::<String>(row, "created")?).map_err(corrupt)?,
        revoked: column(row, "revoked")?,
        revoked_at: revoked_at
            .as_deref()
            .map(timestamp_from_db)
            .transpose()
            .map_err(corrupt)?,
    })
}

fn grantee_columns(grantee: &Grantee) -> (&'static str, &str) {
    match grantee {
        Grantee::User(id) => ("user", id),
        Grantee::Team(id) => ("team", id),
    }
}

impl SqlxAccessBackend {
    async fn fetch_assignments(
        &self,
        filter: &str,
        value: Option<&str>,
    ) -> Result<Vec<Assignment>, AuthzError> {
        let sql = format!("SELECT {ASSIGNMENT_COLUMNS} FROM assignment {filter} ORDER BY created");
        let mut query = sqlx::query(&sql);
        if let Some(value) = value {
            query = query.bind(value);
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.into_authz_error())?;
        rows.iter().map(assignment_from_row).collect()
    }
}

impl AccessBackend for SqlxAccessBackend {
    fn permission(&self, id: &str) -> BackendFuture<'_, Option<Permission>> {
        let id = id.to_string();
        Box::pin(async move {
            let sql = format!("SELECT {PERMISSION_COLUMNS} FROM permission WHERE id = ?");
            let row = sqlx::query(&sql)
                .bind(&id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| e.into_authz_error())?;
            row.as_ref().map(permission_from_row).transpose()
        })
    }

    fn permissions(&self) -> BackendFuture<'_, Vec<Permission>> {
        Box::pin(async move {
            let sql = format!("SELECT {PERMISSION_COLUMNS} FROM permission");
            let rows = sqlx::query(&sql)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| e.into_authz_error())?;
            rows.iter().map(permission_from_row).collect()
        })
    }

    fn save_permission(&self, permission: Permission) -> BackendFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query(
                "INSERT INTO permission (id, title, description, level, created, modified, deleted) \
                 VALUES (?, ?, ?, ?, ?, ?, ?) \
                 ON CONFLICT (id) DO UPDATE SET title = excluded.title, \
                 description = excluded.description, level = excluded.level, \
                 modified = excluded.modified, deleted = excluded.deleted",
            )
            .bind(&permission.id)
            .bind(&permission.title)
            .bind(&permission.description)
            .bind(permission.level.value())
            .bind(timestamp_to_db(&permission.created))
            .bind(timestamp_to_db(&permission.modified))
            .bind(permission.deleted)
            .execute(&self.pool)
            .await
            .map_err(|e| e.into_authz_error())?;
            Ok(())
        })
    }

    fn context(&self, id: &str) -> BackendFuture<'_, Option<ContextInstance>> {
        let id = id.to_string();
        Box::pin(async move {
            let sql = format!("SELECT {CONTEXT_COLUMNS} FROM context_instance WHERE id = ?");
            let row = sqlx::query(&sql)
                .bind(&id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| e.into_authz_error())?;
            row.as_ref().map(context_from_row).transpose()
        })
    }

    fn contexts(&self) -> BackendFuture<'_, Vec<ContextInstance>> {
        Box::pin(async move {
            let sql = format!("SELECT {CONTEXT_COLUMNS} FROM context_instance");
            let rows = sqlx::query(&sql)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| e.into_authz_error())?;
            rows.iter().map(context_from_row).collect()
        })
    }

    fn save_context(&self, context: ContextInstance) -> BackendFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query(
                "INSERT INTO context_instance \
                 (id, scope, context_key, parent_id, created, modified, deleted) \
                 VALUES (?, ?, ?, ?, ?, ?, ?) \
                 ON CONFLICT (id) DO UPDATE SET context_key = excluded.context_key, \
                 parent_id = excluded.parent_id, modified = excluded.modified, \
                 deleted = excluded.deleted",
            )
            .bind(&context.id)
            .bind(context.scope.as_str())
            .bind(&context.key)
            .bind(&context.parent_id)
            .bind(timestamp_to_db(&context.created))
            .bind(timestamp_to_db(&context.modified))
            .bind(context.deleted)
            .execute(&self.pool)
            .await
            .map_err(|e| e.into_authz_error())?;
            Ok(())
        })
    }

    fn assignment(&self, id: &str) -> BackendFuture<'_, Option<Assignment>> {
        let id = id.to_string();
        Box::pin(async move {
            let sql = format!("SELECT {ASSIGNMENT_COLUMNS} FROM assignment WHERE id = ?");
            let row = sqlx::query(&sql)
                .bind(&id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| e.into_authz_error())?;
            row.as_ref().map(assignment_from_row).transpose()
        })
    }

    fn assignments_at(&self, context_id: &str) -> BackendFuture<'_, Vec<Assignment>> {
        let context_id = context_id.to_string();
        Box::pin(async move {
            self.fetch_assignments("WHERE context_id = ?", Some(&context_id))
                .await
        })
    }

    fn assignments_of(&self, permission_id: &str) -> BackendFuture<'_, Vec<Assignment>> {
        let permission_id = permission_id.to_string();
        Box::pin(async move {
            self.fetch_assignments("WHERE permission_id = ?", Some(&permission_id))
                .await
        })
    }

    fn assignments(&self) -> BackendFuture<'_, Vec<Assignment>> {
        Box::pin(async move { self.fetch_assignments("", None).await })
    }

    fn save_assignment(&self, assignment: Assignment) -> BackendFuture<'_, ()> {
        Box::pin(async move {
            let (kind, grantee_id) = grantee_columns(&assignment.grantee);
            sqlx::query(
                "INSERT INTO assignment \
                 (id, permission_id, grantee_kind, grantee_id, context_id, granted_level, \
                  created, revoked, revoked_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) \
                 ON CONFLICT (id) DO UPDATE SET granted_level = excluded.granted_level, \
                 revoked = excluded.revoked, revoked_at = excluded.revoked_at",
            )
            .bind(&assignment.id)
            .bind(&assignment.permission_id)
            .bind(kind)
            .bind(grantee_id)
            .bind(&assignment.context_id)
            .bind(assignment.granted_level.value())
            .bind(timestamp_to_db(&assignment.created))
            .bind(assignment.revoked)
            .bind(assignment.revoked_at.as_ref().map(timestamp_to_db))
            .execute(&self.pool)
            .await
            .map_err(|e| e.into_authz_error())?;
            Ok(())
        })
    }
}
