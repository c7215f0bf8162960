use thiserror::Error;

/// Failures of the status / audit store collaborators
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid stored value: {0}")]
    Decode(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Failures of the alert channel
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Alert delivery failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Alert channel unavailable: {0}")]
    Unavailable(String),
}
