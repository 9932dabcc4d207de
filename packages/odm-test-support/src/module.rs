//! Test-lifecycle module over a [`DocumentManager`].
//!
//! A test calls [`OdmModule::before`] and [`OdmModule::after`] around its body
//! with the same [`SessionContext`]; in between, the helpers persist fixtures,
//! substitute repositories and assert on stored documents.

use std::sync::Arc;

use document_manager::{Document, DocumentError, DocumentManager, Query};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ModuleConfig;
use crate::context::SessionContext;
use crate::criteria::build_query;
use crate::error::ModuleError;
use crate::stub::{StubMethods, StubRepository};

pub struct OdmModule {
    config: ModuleConfig,
    document_manager: Option<Arc<DocumentManager>>,
    faked: Vec<String>,
}

impl OdmModule {
    pub fn new(config: ModuleConfig) -> Self {
        Self {
            config,
            document_manager: None,
            faked: Vec::new(),
        }
    }

    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    /// Setup hook: resolve the document manager and connect it.
    pub async fn before(&mut self, ctx: &SessionContext) -> Result<(), ModuleError> {
        let dm = self.resolve(ctx)?;
        if self.config.connect {
            dm.connect().await?;
        }
        debug!(service = %self.config.document_manager, "odm_module=before");
        self.document_manager = Some(dm);
        Ok(())
    }

    /// Teardown hook: restore faked repositories and clear the session.
    pub async fn after(&mut self, ctx: &SessionContext) -> Result<(), ModuleError> {
        let dm = self.resolve(ctx)?;
        self.document_manager = None;

        for name in self.faked.drain(..) {
            if let Err(e) = dm.restore_repository(&name) {
                warn!(document = %name, error = %e, "odm_module=restore_repository_failed");
            }
        }
        dm.clear();
        if self.config.cleanup {
            dm.purge().await?;
        }

        debug!(
            service = %self.config.document_manager,
            cleanup = self.config.cleanup,
            "odm_module=after"
        );
        Ok(())
    }

    fn resolve(&self, ctx: &SessionContext) -> Result<Arc<DocumentManager>, ModuleError> {
        let key = &self.config.document_manager;
        let service = ctx.service(key).ok_or_else(|| {
            ModuleError::config(format!(
                "Document manager is not set: no service is registered under '{key}'. \
                 Register an Arc<DocumentManager> with SessionContext::with_service(\"{key}\", ..) \
                 before running the ODM module."
            ))
        })?;

        service.downcast::<DocumentManager>().map_err(|_| {
            ModuleError::config(format!(
                "Service '{key}' is not a DocumentManager. \
                 Register an Arc<DocumentManager> under this key or configure another key."
            ))
        })
    }

    /// The document manager bound by [`before`](Self::before).
    pub fn document_manager(&self) -> Result<&Arc<DocumentManager>, ModuleError> {
        self.document_manager.as_ref().ok_or_else(|| {
            ModuleError::config("ODM module is not initialized; call before() first")
        })
    }

    pub async fn flush_to_database(&self) -> Result<(), ModuleError> {
        self.document_manager()?.flush().await?;
        Ok(())
    }

    pub fn clear_document_manager(&self) -> Result<(), ModuleError> {
        self.document_manager()?.clear();
        Ok(())
    }

    /// Persist `document` after overwriting the fields named in `overrides`,
    /// then flush. Returns the stored document, id included.
    ///
    /// `overrides` is a JSON object (or `null` for none). Each key must be a
    /// field of `D` and each value must deserialize into that field.
    pub async fn persist_document<D: Document>(
        &self,
        document: D,
        overrides: Value,
    ) -> Result<D, ModuleError> {
        let dm = self.document_manager()?;
        let meta = D::metadata();
        let name = meta.name.as_str();

        let overrides = match overrides {
            Value::Null => serde_json::Map::new(),
            Value::Object(map) => map,
            other => {
                return Err(ModuleError::fixture(
                    name,
                    format!("overrides must be a JSON object, got {other}"),
                ))
            }
        };

        let mut body = serde_json::to_value(&document)?;
        let fields = body
            .as_object_mut()
            .ok_or_else(|| ModuleError::fixture(name, "document does not serialize to an object"))?;
        for (field, value) in &overrides {
            fields.insert(field.clone(), value.clone());
        }

        let document: D = serde_json::from_value(body)
            .map_err(|e| ModuleError::fixture(name, format!("override rejected: {e}")))?;

        // A `null` may vanish behind `skip_serializing_if`; any other override
        // must survive as a key of the written document.
        let written = serde_json::to_value(&document)?;
        for (field, value) in &overrides {
            if written.get(field).is_none() && !value.is_null() {
                return Err(ModuleError::fixture(
                    name,
                    format!("'{field}' is not a field of {name}"),
                ));
            }
        }

        debug!(document = name, overrides = overrides.len(), "odm_module=persist_document");
        self.store(dm, &meta.id_field, &document).await
    }

    /// Build a `D` from `values`, persist it and flush.
    pub async fn have_in_repository<D: Document>(&self, values: Value) -> Result<D, ModuleError> {
        let dm = self.document_manager()?;
        let meta = D::metadata();
        let document: D = serde_json::from_value(values)
            .map_err(|e| ModuleError::fixture(&meta.name, e.to_string()))?;

        debug!(document = %meta.name, "odm_module=have_in_repository");
        self.store(dm, &meta.id_field, &document).await
    }

    async fn store<D: Document>(
        &self,
        dm: &DocumentManager,
        id_field: &str,
        document: &D,
    ) -> Result<D, ModuleError> {
        let id = dm.persist_document(document)?;
        dm.flush().await?;

        let mut stored = serde_json::to_value(document)?;
        if let Some(fields) = stored.as_object_mut() {
            if fields.get(id_field).map_or(true, Value::is_null) {
                fields.insert(id_field.to_string(), Value::String(id));
            }
        }
        Ok(serde_json::from_value(stored)?)
    }

    /// Replace the repository of `document` with a stub built from `methods`.
    ///
    /// Calls the stub does not configure still reach the real repository. The
    /// replacement is undone by [`after`](Self::after). When the document
    /// manager refuses substitution the stub is returned unused and a warning
    /// is logged.
    pub async fn have_fake_repository(
        &mut self,
        document: &str,
        methods: StubMethods,
    ) -> Result<Arc<StubRepository>, ModuleError> {
        let dm = Arc::clone(self.document_manager()?);
        let real = dm.get_repository(document)?;
        let stub = Arc::new(StubRepository::new(real, methods));

        match dm.override_repository(document, stub.clone()) {
            Ok(()) => {
                if !self.faked.iter().any(|n| n == document) {
                    self.faked.push(document.to_string());
                }
                debug!(document, "odm_module=have_fake_repository");
            }
            Err(DocumentError::RepositoryOverridesDisabled) => {
                warn!(
                    document,
                    "odm_module=fake_repository_skipped reason=repository overrides are disabled"
                );
            }
            Err(e) => return Err(e.into()),
        }
        Ok(stub)
    }

    /// Assert that at least one `document` matches `criteria`.
    pub async fn see_in_repository(
        &self,
        document: &str,
        criteria: Value,
    ) -> Result<(), ModuleError> {
        let found = self.matching(document, &criteria, None).await?;
        assert!(
            !found.is_empty(),
            "Expected a '{document}' document matching {criteria}, but none was found"
        );
        Ok(())
    }

    /// Assert that no `document` matches `criteria`.
    pub async fn dont_see_in_repository(
        &self,
        document: &str,
        criteria: Value,
    ) -> Result<(), ModuleError> {
        let found = self.matching(document, &criteria, None).await?;
        assert!(
            found.is_empty(),
            "Expected no '{document}' document matching {criteria}, but found {}",
            found.len()
        );
        Ok(())
    }

    /// Value of `field` (dot path) on the first `document` matching `criteria`.
    /// A missing field yields `null`.
    pub async fn grab_from_repository(
        &self,
        document: &str,
        field: &str,
        criteria: Value,
    ) -> Result<Value, ModuleError> {
        let first = self
            .matching(document, &criteria, Some(1))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ModuleError::NotFound {
                document: document.to_string(),
                criteria: criteria.to_string(),
            })?;

        let pointer: String = field
            .split('.')
            .map(|segment| format!("/{}", segment.replace('~', "~0").replace('/', "~1")))
            .collect();
        Ok(first.pointer(&pointer).cloned().unwrap_or(Value::Null))
    }

    pub async fn grab_documents_from_repository<D: Document>(
        &self,
        criteria: Value,
    ) -> Result<Vec<D>, ModuleError> {
        let name = D::metadata().name;
        self.matching(&name, &criteria, None)
            .await?
            .into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(ModuleError::from))
            .collect()
    }

    pub async fn grab_document_from_repository<D: Document>(
        &self,
        criteria: Value,
    ) -> Result<D, ModuleError> {
        let name = D::metadata().name;
        let first = self
            .matching(&name, &criteria, Some(1))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ModuleError::NotFound {
                document: name.clone(),
                criteria: criteria.to_string(),
            })?;
        Ok(serde_json::from_value(first)?)
    }

    /// Flush, then run `criteria` against the repository of `document`.
    async fn matching(
        &self,
        document: &str,
        criteria: &Value,
        limit: Option<usize>,
    ) -> Result<Vec<Value>, ModuleError> {
        let dm = self.document_manager()?;
        dm.flush().await?;

        let (repository, query) = build_query(dm, document, criteria).await?;
        let query = Query {
            limit: limit.or(query.limit),
            ..query
        };
        let found = repository.execute(&query).await?;
        debug!(document, criteria = %criteria, matches = found.len(), "odm_module=query");
        Ok(found)
    }
}

