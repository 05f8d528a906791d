//! Error types for the ppgym_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for ppgym_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Requested template id is not in the catalog
    #[error("Template not found: {template_id}")]
    TemplateNotFound { template_id: String },

    /// Operation referenced a session that is not in the session list
    #[error("Session not found: {session_id}")]
    SessionNotFound { session_id: String },

    /// Session exists but has no exercise instance with this id
    #[error("Exercise {exercise_id} not found in session {session_id}")]
    ExerciseNotFound {
        session_id: String,
        exercise_id: String,
    },

    /// Set index outside `[0, target_sets)`
    #[error("Set index {index} out of range (exercise has {target_sets} sets)")]
    SetIndexOutOfRange { index: usize, target_sets: u32 },

    /// Set flags of a finished session are frozen
    #[error("Session {session_id} is already completed")]
    SessionAlreadyCompleted { session_id: String },

    /// Weight was negative, not finite, or not a number at all
    #[error("Invalid weight: {0}")]
    InvalidWeight(String),

    /// Persistence backend failed to read a key
    #[error("Storage read error for '{key}': {message}")]
    StorageRead { key: String, message: String },

    /// Persistence backend failed to write or remove a key
    #[error("Storage write error for '{key}': {message}")]
    StorageWrite { key: String, message: String },

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog validation error
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),
}

impl Error {
    /// True for persistence failures, which leave in-memory state intact
    pub fn is_storage(&self) -> bool {
        matches!(self, Error::StorageRead { .. } | Error::StorageWrite { .. })
    }
}
