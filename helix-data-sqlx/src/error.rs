use helix_authz::AuthzError;
use helix_data::DataError;

/// Extension trait for converting `sqlx::Error` into the Helix error types.
///
/// Due to Rust's orphan rules, `From<sqlx::Error>` can't be implemented for
/// `DataError` or `AuthzError` in this crate.
pub trait SqlxErrorExt {
    fn into_data_error(self) -> DataError;

    /// Connection-level failures become [`AuthzError::Unavailable`], the rest
    /// [`AuthzError::Backend`].
    fn into_authz_error(self) -> AuthzError;
}

impl SqlxErrorExt for sqlx::Error {
    fn into_data_error(self) -> DataError {
        match &self {
            sqlx::Error::RowNotFound => DataError::NotFound("Row not found".into()),
            _ => DataError::database(self),
        }
    }

    fn into_authz_error(self) -> AuthzError {
        match &self {
            sqlx::Error::Io(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => AuthzError::Unavailable(self.to_string()),
            _ => AuthzError::Backend(self.to_string()),
        }
    }
}

/// Convenience alias for data-layer results using `DataError`.
pub type SqlxResult<T> = Result<T, DataError>;
