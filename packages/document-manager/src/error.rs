use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Configuration error: {message}")]
    Config { message: String },
    #[error("Unknown document: '{name}' has no registered metadata")]
    UnknownDocument { name: String },
    #[error("Invalid document '{name}': {detail}")]
    InvalidDocument { name: String, detail: String },
    #[error("Document manager is not connected; call connect() before {operation}")]
    NotConnected { operation: &'static str },
    #[error("Repository for '{name}' has no method '{method}'")]
    UnknownMethod { name: String, method: String },
    #[error("Repository overrides are disabled for this document manager")]
    RepositoryOverridesDisabled,
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Database error: {0}")]
    Db(#[from] sea_orm::DbErr),
}

impl DocumentError {
    pub fn config(message: impl Into<String>) -> Self {
        DocumentError::Config {
            message: message.into(),
        }
    }

    pub fn invalid(name: impl Into<String>, detail: impl Into<String>) -> Self {
        DocumentError::InvalidDocument {
            name: name.into(),
            detail: detail.into(),
        }
    }
}
