use std::env;

use crate::error::DocumentError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreKind {
    /// Process-local maps
    Memory,
    /// SeaORM over SQLite (file or `sqlite::memory:`)
    Sqlite { url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub kind: StoreKind,
    pub repository_overrides: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::Memory,
            repository_overrides: true,
        }
    }
}

impl StoreConfig {
    /// Reads `DOCSTORE_URL` and `DOCSTORE_REPOSITORY_OVERRIDES`.
    pub fn from_env() -> Result<Self, DocumentError> {
        let kind = match env::var("DOCSTORE_URL") {
            Ok(url) => parse_store_url(&url)?,
            Err(_) => StoreKind::Memory,
        };
        let repository_overrides = match env::var("DOCSTORE_REPOSITORY_OVERRIDES") {
            Ok(raw) => parse_bool("DOCSTORE_REPOSITORY_OVERRIDES", &raw)?,
            Err(_) => true,
        };
        Ok(Self {
            kind,
            repository_overrides,
        })
    }
}

pub fn parse_store_url(url: &str) -> Result<StoreKind, DocumentError> {
    let url = url.trim();
    if url.is_empty() || url.eq_ignore_ascii_case("memory") {
        Ok(StoreKind::Memory)
    } else if url.starts_with("sqlite:") {
        Ok(StoreKind::Sqlite {
            url: url.to_string(),
        })
    } else {
        Err(DocumentError::config(format!(
            "Unsupported DOCSTORE_URL '{url}': expected 'memory' or a 'sqlite:' URL"
        )))
    }
}

/// Parse a boolean environment value (`true/false/1/0/yes/no`).
pub fn parse_bool(name: &str, raw: &str) -> Result<bool, DocumentError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(DocumentError::config(format!(
            "Environment variable '{name}' must be a boolean, got '{other}'"
        ))),
    }
}
