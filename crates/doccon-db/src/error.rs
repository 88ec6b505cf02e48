//! Database-specific error types and conversions.

use doccon_core::error::DocconError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Unique index violated: {entity}.{field}")]
    Duplicate { entity: String, field: String },
}

impl DbError {
    /// Map a failed statement to [`DbError::Duplicate`] when the message
    /// names one of `indexes` (`(index name, field)` pairs).
    pub(crate) fn from_statement(
        err: surrealdb::Error,
        entity: &str,
        indexes: &[(&str, &str)],
    ) -> Self {
        let msg = err.to_string();
        indexes
            .iter()
            .find(|(index, _)| msg.contains(index))
            .map(|(_, field)| DbError::Duplicate {
                entity: entity.into(),
                field: (*field).into(),
            })
            .unwrap_or(DbError::Query(msg))
    }
}

impl From<DbError> for DocconError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => DocconError::NotFound { entity, id },
            DbError::Duplicate { entity, field } => DocconError::AlreadyExists { entity, field },
            DbError::Hash(msg) => DocconError::Crypto(msg),
            other => DocconError::Database(other.to_string()),
        }
    }
}
