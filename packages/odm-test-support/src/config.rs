use std::env;

use document_manager::config::parse_bool;
use serde::Deserialize;

use crate::error::ModuleError;

/// Service key the module resolves the document manager from by default.
pub const DEFAULT_DOCUMENT_MANAGER_KEY: &str = "document_manager";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    /// Key of the `DocumentManager` service in the session context.
    pub document_manager: String,
    /// Delete every stored document at teardown.
    pub cleanup: bool,
    /// Connect the document manager during setup.
    pub connect: bool,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            document_manager: DEFAULT_DOCUMENT_MANAGER_KEY.to_string(),
            cleanup: false,
            connect: true,
        }
    }
}

impl ModuleConfig {
    pub fn with_document_manager(mut self, key: impl Into<String>) -> Self {
        self.document_manager = key.into();
        self
    }

    pub fn with_cleanup(mut self, cleanup: bool) -> Self {
        self.cleanup = cleanup;
        self
    }

    pub fn with_connect(mut self, connect: bool) -> Self {
        self.connect = connect;
        self
    }

    /// Reads `ODM_DOCUMENT_MANAGER`, `ODM_CLEANUP` and `ODM_CONNECT`, falling
    /// back to the defaults for unset variables.
    pub fn from_env() -> Result<Self, ModuleError> {
        let defaults = Self::default();
        let document_manager = match env::var("ODM_DOCUMENT_MANAGER") {
            Ok(key) if key.trim().is_empty() => {
                return Err(ModuleError::config(
                    "Environment variable 'ODM_DOCUMENT_MANAGER' is set but empty",
                ))
            }
            Ok(key) => key.trim().to_string(),
            Err(_) => defaults.document_manager,
        };

        Ok(Self {
            document_manager,
            cleanup: bool_var("ODM_CLEANUP", defaults.cleanup)?,
            connect: bool_var("ODM_CONNECT", defaults.connect)?,
        })
    }
}

fn bool_var(name: &str, default: bool) -> Result<bool, ModuleError> {
    match env::var(name) {
        Ok(raw) => parse_bool(name, &raw).map_err(|e| ModuleError::config(e.to_string())),
        Err(_) => Ok(default),
    }
}
