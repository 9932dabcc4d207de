use document_manager::DocumentError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("Module configuration error: {message}")]
    Config { message: String },
    #[error("Unsupported criteria for '{document}': {detail}")]
    UnsupportedCriteria { document: String, detail: String },
    #[error("Invalid fixture for '{document}': {detail}")]
    Fixture { document: String, detail: String },
    #[error("No '{document}' document matches {criteria}")]
    NotFound { document: String, criteria: String },
    #[error(transparent)]
    Document(#[from] DocumentError),
}

impl ModuleError {
    pub fn config(message: impl Into<String>) -> Self {
        ModuleError::Config {
            message: message.into(),
        }
    }

    pub(crate) fn unsupported(document: &str, detail: impl Into<String>) -> Self {
        ModuleError::UnsupportedCriteria {
            document: document.to_string(),
            detail: detail.into(),
        }
    }

    pub(crate) fn fixture(document: &str, detail: impl Into<String>) -> Self {
        ModuleError::Fixture {
            document: document.to_string(),
            detail: detail.into(),
        }
    }
}

impl From<serde_json::Error> for ModuleError {
    fn from(e: serde_json::Error) -> Self {
        ModuleError::Document(DocumentError::from(e))
    }
}
