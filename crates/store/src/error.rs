use thiserror::Error;

/// Errors that can occur when interacting with the gift store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced row does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A uniqueness constraint rejected the write. For reservations
    /// this means another claimant's row already references the gift.
    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    /// Transient failure reaching the store.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    /// Builds a `NotFound` for a gift.
    pub fn gift_not_found(id: common::GiftId) -> Self {
        StoreError::NotFound {
            entity: "Gift",
            id: id.to_string(),
        }
    }

    /// Builds a `NotFound` for a profile.
    pub fn profile_not_found(id: common::ProfileId) -> Self {
        StoreError::NotFound {
            entity: "Profile",
            id: id.to_string(),
        }
    }

    /// Returns true when this error is a uniqueness violation.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, StoreError::UniqueViolation { .. })
    }

    /// Returns true when the referenced row was absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
