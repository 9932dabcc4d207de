//! The document session: unit of work, metadata and repository lookup.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tracing::debug;
use ulid::Ulid;

use crate::config::{StoreConfig, StoreKind};
use crate::document::{Document, DocumentMetadata, MetadataRegistry};
use crate::error::DocumentError;
use crate::repository::{DefaultRepositoryFactory, Repository, RepositoryFactory};
use crate::store::{DocumentStore, MemoryStore, SeaStore};

type RepositoryMap = HashMap<String, Arc<dyn Repository>>;

struct PendingWrite {
    collection: String,
    id: String,
    body: Value,
}

pub struct DocumentManager {
    store: Arc<dyn DocumentStore>,
    metadata: MetadataRegistry,
    pending: Mutex<Vec<PendingWrite>>,
    repositories: RwLock<RepositoryMap>,
    overrides: Option<RwLock<RepositoryMap>>,
    factory: Arc<dyn RepositoryFactory>,
}

pub struct DocumentManagerBuilder {
    store: Arc<dyn DocumentStore>,
    factory: Arc<dyn RepositoryFactory>,
    allow_overrides: bool,
    metadata: Vec<DocumentMetadata>,
}

impl DocumentManagerBuilder {
    pub fn repository_factory(mut self, factory: Arc<dyn RepositoryFactory>) -> Self {
        self.factory = factory;
        self
    }

    /// Whether repositories may be substituted at runtime (default: allowed).
    pub fn repository_overrides(mut self, allow: bool) -> Self {
        self.allow_overrides = allow;
        self
    }

    pub fn register<D: Document>(mut self) -> Self {
        self.metadata.push(D::metadata());
        self
    }

    pub fn build(self) -> DocumentManager {
        let metadata = MetadataRegistry::new();
        for meta in self.metadata {
            metadata.register(meta);
        }
        DocumentManager {
            store: self.store,
            metadata,
            pending: Mutex::new(Vec::new()),
            repositories: RwLock::new(HashMap::new()),
            overrides: self.allow_overrides.then(|| RwLock::new(HashMap::new())),
            factory: self.factory,
        }
    }
}

impl DocumentManager {
    pub fn builder(store: Arc<dyn DocumentStore>) -> DocumentManagerBuilder {
        DocumentManagerBuilder {
            store,
            factory: Arc::new(DefaultRepositoryFactory),
            allow_overrides: true,
            metadata: Vec::new(),
        }
    }

    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::builder(store).build()
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        let store: Arc<dyn DocumentStore> = match &config.kind {
            StoreKind::Memory => Arc::new(MemoryStore::new()),
            StoreKind::Sqlite { url } => Arc::new(SeaStore::new(url.clone())),
        };
        Self::builder(store)
            .repository_overrides(config.repository_overrides)
            .build()
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub async fn connect(&self) -> Result<(), DocumentError> {
        self.store.connect().await?;
        debug!(backend = self.store.backend(), "document_manager=connected");
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.store.is_connected()
    }

    pub fn register<D: Document>(&self) {
        self.metadata.register(D::metadata());
    }

    pub fn register_metadata(&self, metadata: DocumentMetadata) {
        self.metadata.register(metadata);
    }

    pub fn get_metadata(&self, name: &str) -> Result<DocumentMetadata, DocumentError> {
        self.metadata.get(name)
    }

    pub fn document_names(&self) -> Vec<String> {
        self.metadata.names()
    }

    /// Queue a document for the next flush and return its id.
    ///
    /// A missing or null id field is filled with a fresh ULID. Persisting the
    /// same id twice before a flush keeps only the latest body.
    pub fn persist(&self, name: &str, mut body: Value) -> Result<String, DocumentError> {
        let meta = self.metadata.get(name)?;
        let fields = body
            .as_object_mut()
            .ok_or_else(|| DocumentError::invalid(name, "document body must be a JSON object"))?;

        let id = match fields.get(&meta.id_field) {
            None | Some(Value::Null) => {
                let id = Ulid::new().to_string();
                fields.insert(meta.id_field.clone(), Value::String(id.clone()));
                id
            }
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(other) => {
                return Err(DocumentError::invalid(
                    name,
                    format!("id field '{}' must be a string or number, got {other}", meta.id_field),
                ))
            }
        };

        let mut pending = self.pending.lock();
        match pending
            .iter_mut()
            .find(|w| w.collection == meta.collection && w.id == id)
        {
            Some(write) => write.body = body,
            None => pending.push(PendingWrite {
                collection: meta.collection,
                id: id.clone(),
                body,
            }),
        }
        Ok(id)
    }

    /// Typed [`persist`](Self::persist); registers the document's metadata on first use.
    pub fn persist_document<D: Document>(&self, document: &D) -> Result<String, DocumentError> {
        let meta = D::metadata();
        if self.metadata.get(&meta.name).is_err() {
            self.metadata.register(meta.clone());
        }
        self.persist(&meta.name, serde_json::to_value(document)?)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Write queued documents to the store in persist order.
    ///
    /// On a store error the unwritten documents stay queued.
    pub async fn flush(&self) -> Result<(), DocumentError> {
        if !self.store.is_connected() {
            return Err(DocumentError::NotConnected { operation: "flush" });
        }

        let writes = std::mem::take(&mut *self.pending.lock());
        let total = writes.len();
        let mut remaining = writes.into_iter();
        while let Some(write) = remaining.next() {
            if let Err(e) = self
                .store
                .upsert(&write.collection, &write.id, &write.body)
                .await
            {
                let mut pending = self.pending.lock();
                let requeued: Vec<PendingWrite> = std::iter::once(write)
                    .chain(remaining)
                    .chain(pending.drain(..))
                    .collect();
                *pending = requeued;
                return Err(e);
            }
        }

        debug!(documents = total, "document_manager=flushed");
        Ok(())
    }

    /// Forget queued writes and cached repositories. Overrides are kept.
    pub fn clear(&self) {
        let dropped = {
            let mut pending = self.pending.lock();
            let n = pending.len();
            pending.clear();
            n
        };
        self.repositories.write().clear();
        debug!(dropped, "document_manager=cleared");
    }

    pub async fn purge(&self) -> Result<(), DocumentError> {
        self.pending.lock().clear();
        self.store.purge().await
    }

    /// Repository for a document: an override if present, else the cached or
    /// newly built one.
    pub fn get_repository(&self, name: &str) -> Result<Arc<dyn Repository>, DocumentError> {
        if let Some(repo) = self
            .overrides
            .as_ref()
            .and_then(|overrides| overrides.read().get(name).cloned())
        {
            return Ok(repo);
        }
        if let Some(repo) = self.repositories.read().get(name).cloned() {
            return Ok(repo);
        }

        let meta = self.metadata.get(name)?;
        let repo = self.factory.create(meta, Arc::clone(&self.store));
        self.repositories
            .write()
            .insert(name.to_string(), Arc::clone(&repo));
        Ok(repo)
    }

    /// Serve `repository` for `name` until restored.
    pub fn override_repository(
        &self,
        name: &str,
        repository: Arc<dyn Repository>,
    ) -> Result<(), DocumentError> {
        let overrides = self
            .overrides
            .as_ref()
            .ok_or(DocumentError::RepositoryOverridesDisabled)?;
        self.metadata.get(name)?;
        overrides.write().insert(name.to_string(), repository);
        Ok(())
    }

    pub fn restore_repository(
        &self,
        name: &str,
    ) -> Result<Option<Arc<dyn Repository>>, DocumentError> {
        let overrides = self
            .overrides
            .as_ref()
            .ok_or(DocumentError::RepositoryOverridesDisabled)?;
        Ok(overrides.write().remove(name))
    }

    pub fn has_repository_override(&self, name: &str) -> bool {
        self.overrides
            .as_ref()
            .is_some_and(|overrides| overrides.read().contains_key(name))
    }
}
