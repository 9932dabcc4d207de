#![allow(dead_code)]

pub mod documents;
pub mod logging;

use std::sync::Arc;

use document_manager::{DocumentManager, DocumentStore, MemoryStore};
use odm_test_support::{ModuleConfig, ModuleError, OdmModule, SessionContext};

pub use documents::{Address, Post, Product, User};

/// In-memory document manager with the fixture documents registered.
pub fn document_manager() -> Arc<DocumentManager> {
    document_manager_over(Arc::new(MemoryStore::new()))
}

pub fn document_manager_over(store: Arc<dyn DocumentStore>) -> Arc<DocumentManager> {
    Arc::new(
        DocumentManager::builder(store)
            .register::<User>()
            .register::<Post>()
            .register::<Product>()
            .build(),
    )
}

/// Module whose `before` hook already ran against `dm`.
pub async fn started_module(
    dm: &Arc<DocumentManager>,
    config: ModuleConfig,
) -> Result<(OdmModule, SessionContext), ModuleError> {
    let ctx = SessionContext::new().with_document_manager(Arc::clone(dm));
    let mut module = OdmModule::new(config);
    module.before(&ctx).await?;
    Ok((module, ctx))
}

pub fn user(name: &str, email: &str) -> User {
    User {
        id: None,
        name: name.to_string(),
        email: email.to_string(),
        active: false,
        address: None,
    }
}
