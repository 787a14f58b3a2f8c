use thiserror::Error;

/// Storage-specific error types for the Warden access-control engine.
///
/// These errors represent failures in database operations and in the
/// credential rules enforced before anything is written.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database connection or query execution failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration execution failed
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Credential rejected by validation (format, duplicate, capacity)
    #[error(transparent)]
    Credential(#[from] warden_core::Error),

    /// Entity not found in database
    #[error("Entity not found: {entity_type} with {field}={value}")]
    NotFound {
        entity_type: String,
        field: String,
        value: String,
    },

    /// Stored data failed validation on load
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Specialized result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::CardUid;

    #[test]
    fn test_credential_error_is_transparent() {
        let uid = CardUid::new(0x0102_0304).unwrap();
        let error = StorageError::from(warden_core::Error::DuplicateCard(uid));
        assert_eq!(error.to_string(), "Card 01020304 is already authorized");
    }

    #[test]
    fn test_not_found_display() {
        let error = StorageError::NotFound {
            entity_type: "access_log".into(),
            field: "id".into(),
            value: "7".into(),
        };
        assert_eq!(error.to_string(), "Entity not found: access_log with id=7");
    }
}
