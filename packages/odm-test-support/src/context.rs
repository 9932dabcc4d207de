//! Explicit session context handed to every lifecycle hook.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use document_manager::DocumentManager;

use crate::config::DEFAULT_DOCUMENT_MANAGER_KEY;

type Service = Arc<dyn Any + Send + Sync>;

/// Named services available to the module for one test run.
#[derive(Clone, Default)]
pub struct SessionContext {
    services: HashMap<String, Service>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `document_manager` under the default key.
    pub fn with_document_manager(self, document_manager: Arc<DocumentManager>) -> Self {
        self.with_service(DEFAULT_DOCUMENT_MANAGER_KEY, document_manager)
    }

    pub fn with_service<T: Any + Send + Sync>(
        mut self,
        key: impl Into<String>,
        service: Arc<T>,
    ) -> Self {
        self.services.insert(key.into(), service);
        self
    }

    pub fn service(&self, key: &str) -> Option<Service> {
        self.services.get(key).cloned()
    }

    pub fn remove(&mut self, key: &str) -> Option<Service> {
        self.services.remove(key)
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.services.keys().collect();
        keys.sort();
        f.debug_struct("SessionContext").field("services", &keys).finish()
    }
}
