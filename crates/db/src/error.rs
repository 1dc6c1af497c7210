//! Backend-neutral store error.

/// PostgreSQL `unique_violation` SQLSTATE.
const PG_UNIQUE_VIOLATION: &str = "23505";

/// Errors returned by every [`Store`](crate::store::Store) backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint (named by the constraint or index) was violated.
    #[error("Duplicate value violates unique constraint: {0}")]
    UniqueViolation(String),

    /// Any other database failure.
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl StoreError {
    /// True when the violated constraint is the one named `constraint`.
    pub fn is_unique_violation_of(&self, constraint: &str) -> bool {
        matches!(self, StoreError::UniqueViolation(name) if name == constraint)
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(PG_UNIQUE_VIOLATION) {
                let constraint = db_err.constraint().unwrap_or("unknown").to_string();
                return StoreError::UniqueViolation(constraint);
            }
        }
        StoreError::Database(err)
    }
}
