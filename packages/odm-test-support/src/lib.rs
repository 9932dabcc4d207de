//! ODM test support
//!
//! Binds a test to a [`DocumentManager`](document_manager::DocumentManager):
//! lifecycle hooks, fixture persistence, repository stubs and assertions on
//! stored documents. The document manager is handed to every hook through a
//! [`SessionContext`] instead of living in a global.

pub mod config;
pub mod context;
mod criteria;
pub mod error;
pub mod logging;
pub mod module;
pub mod stub;

pub use config::{ModuleConfig, DEFAULT_DOCUMENT_MANAGER_KEY};
pub use context::SessionContext;
pub use error::ModuleError;
pub use module::OdmModule;
pub use stub::{StubMethods, StubRepository};

#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    logging::init();
}
