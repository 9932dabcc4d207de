//! Per-document repositories and the factory the manager builds them with.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::document::DocumentMetadata;
use crate::error::DocumentError;
use crate::query::{Criteria, Query, QueryBuilder};
use crate::store::DocumentStore;

#[async_trait]
pub trait Repository: Send + Sync {
    fn metadata(&self) -> &DocumentMetadata;

    fn create_query_builder(&self) -> QueryBuilder {
        QueryBuilder::new(self.metadata().collection.clone())
    }

    async fn execute(&self, query: &Query) -> Result<Vec<Value>, DocumentError>;

    /// Look a document up by id. A numeric-looking id also matches a number.
    async fn find(&self, id: &str) -> Result<Option<Value>, DocumentError> {
        let mut ids = vec![Value::from(id)];
        if let Ok(n) = id.parse::<serde_json::Number>() {
            ids.push(Value::Number(n));
        }
        let query = self
            .create_query_builder()
            .field(self.metadata().id_field.clone())
            .in_values(ids)
            .limit(1)
            .get_query();
        Ok(self.execute(&query).await?.into_iter().next())
    }

    async fn find_by(&self, criteria: &Criteria) -> Result<Vec<Value>, DocumentError> {
        let query = self.create_query_builder().criteria(criteria).get_query();
        self.execute(&query).await
    }

    async fn find_one_by(&self, criteria: &Criteria) -> Result<Option<Value>, DocumentError> {
        let query = self
            .create_query_builder()
            .criteria(criteria)
            .limit(1)
            .get_query();
        Ok(self.execute(&query).await?.into_iter().next())
    }

    async fn find_all(&self) -> Result<Vec<Value>, DocumentError> {
        let query = self.create_query_builder().get_query();
        self.execute(&query).await
    }

    /// Dispatch a custom finder by name.
    async fn call(&self, method: &str, _args: &[Value]) -> Result<Value, DocumentError> {
        Err(DocumentError::UnknownMethod {
            name: self.metadata().name.clone(),
            method: method.to_string(),
        })
    }
}

/// Store-backed repository with no custom finders.
pub struct DocumentRepository {
    metadata: DocumentMetadata,
    store: Arc<dyn DocumentStore>,
}

impl DocumentRepository {
    pub fn new(metadata: DocumentMetadata, store: Arc<dyn DocumentStore>) -> Self {
        Self { metadata, store }
    }
}

#[async_trait]
impl Repository for DocumentRepository {
    fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    async fn execute(&self, query: &Query) -> Result<Vec<Value>, DocumentError> {
        if !self.store.is_connected() {
            return Err(DocumentError::NotConnected { operation: "query" });
        }
        let documents = self.store.load(&query.collection).await?;
        Ok(query.apply(documents))
    }
}

pub trait RepositoryFactory: Send + Sync {
    fn create(
        &self,
        metadata: DocumentMetadata,
        store: Arc<dyn DocumentStore>,
    ) -> Arc<dyn Repository>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultRepositoryFactory;

impl RepositoryFactory for DefaultRepositoryFactory {
    fn create(
        &self,
        metadata: DocumentMetadata,
        store: Arc<dyn DocumentStore>,
    ) -> Arc<dyn Repository> {
        Arc::new(DocumentRepository::new(metadata, store))
    }
}
