//! Document session used by the ODM test-support module.
//!
//! Documents are JSON objects mapped by [`DocumentMetadata`]. A
//! [`DocumentManager`] queues writes until `flush()`, hands out per-document
//! [`Repository`] objects and lets callers substitute repositories at runtime.

pub mod config;
pub mod document;
pub mod entities;
pub mod error;
pub mod manager;
pub mod query;
pub mod repository;
pub mod store;

#[cfg(test)]
mod test_bootstrap;

pub use config::{StoreConfig, StoreKind};
pub use document::{Association, AssociationKind, Document, DocumentMetadata, MetadataRegistry};
pub use error::DocumentError;
pub use manager::{DocumentManager, DocumentManagerBuilder};
pub use query::{Condition, Criteria, Query, QueryBuilder};
pub use repository::{DefaultRepositoryFactory, DocumentRepository, Repository, RepositoryFactory};
pub use store::{DocumentStore, MemoryStore, SeaStore};

// Auto-initialize logging for unit tests
#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    test_bootstrap::init();
}
