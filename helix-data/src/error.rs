use helix_core::AccessError;

/// Errors that can occur in the data layer.
#[derive(Debug)]
pub enum DataError {
    /// Entity absent or soft-deleted.
    NotFound(String),
    /// The entity is no longer at the version the caller expected.
    ///
    /// `expected` is `0` when a create found the id already taken.
    Conflict {
        entity: String,
        expected: u64,
        actual: u64,
    },
    Database(Box<dyn std::error::Error + Send + Sync>),
    Other(String),
}

impl DataError {
    /// Construct a `Database` variant from any error type.
    ///
    /// Used by store crates (e.g. `helix-data-sqlx`) to wrap driver errors.
    pub fn database(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        DataError::Database(Box::new(err))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, DataError::Conflict { .. })
    }
}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::NotFound(msg) => write!(f, "Not found: {msg}"),
            DataError::Conflict {
                entity,
                expected,
                actual,
            } => write!(
                f,
                "Version conflict on {entity}: expected version {expected}, current version {actual}"
            ),
            DataError::Database(err) => write!(f, "Database error: {err}"),
            DataError::Other(msg) => write!(f, "Data error: {msg}"),
        }
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataError::Database(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<DataError> for AccessError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::NotFound(msg) => AccessError::NotFound(msg),
            DataError::Conflict {
                entity,
                expected,
                actual,
            } => AccessError::Conflict {
                entity,
                expected,
                actual,
            },
            DataError::Database(e) => AccessError::Internal(e.to_string()),
            DataError::Other(msg) => AccessError::Internal(msg),
        }
    }
}
