//! Storage backends behind the document manager.

pub mod memory;
pub mod sea;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::DocumentError;

pub use memory::MemoryStore;
pub use sea::SeaStore;

/// Raw document persistence keyed by collection and id.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend label for logs.
    fn backend(&self) -> &'static str;

    async fn connect(&self) -> Result<(), DocumentError>;

    fn is_connected(&self) -> bool;

    async fn upsert(&self, collection: &str, id: &str, body: &Value) -> Result<(), DocumentError>;

    /// All documents of a collection ordered by id.
    async fn load(&self, collection: &str) -> Result<Vec<Value>, DocumentError>;

    /// Delete every stored document.
    async fn purge(&self) -> Result<(), DocumentError>;
}
