//! Database-specific error types and conversions.

use sponsora_core::error::SponsoraError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Cannot reach store at {url} ({step}): {source}")]
    Connect {
        url: String,
        step: &'static str,
        #[source]
        source: surrealdb::Error,
    },

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Write to {entity} {id} was refused: {reason}")]
    Conflict {
        entity: String,
        id: String,
        reason: String,
    },

    #[error("Stored row is invalid: {0}")]
    InvalidRow(String),

    #[error("Query failed: {0}")]
    Query(String),
}

impl From<DbError> for SponsoraError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => SponsoraError::NotFound { entity, id },
            DbError::Conflict { entity, id, .. } => SponsoraError::Conflict { entity, id },
            other => SponsoraError::Database(other.to_string()),
        }
    }
}
