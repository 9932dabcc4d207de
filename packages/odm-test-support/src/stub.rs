//! Repository test doubles.
//!
//! A [`StubRepository`] wraps the real repository of a document. Methods
//! configured in [`StubMethods`] answer from closures; everything else is
//! forwarded to the wrapped repository. Each call is counted per method name.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use document_manager::{Criteria, DocumentError, DocumentMetadata, Query, Repository};
use parking_lot::Mutex;
use serde_json::Value;

type MethodFn = Arc<dyn Fn(&[Value]) -> Result<Value, DocumentError> + Send + Sync>;
type FindFn = Arc<dyn Fn(&str) -> Result<Option<Value>, DocumentError> + Send + Sync>;
type FindByFn = Arc<dyn Fn(&Criteria) -> Result<Vec<Value>, DocumentError> + Send + Sync>;
type FindAllFn = Arc<dyn Fn() -> Result<Vec<Value>, DocumentError> + Send + Sync>;
type ExecuteFn = Arc<dyn Fn(&Query) -> Result<Vec<Value>, DocumentError> + Send + Sync>;

#[derive(Clone, Default)]
pub struct StubMethods {
    execute: Option<ExecuteFn>,
    find: Option<FindFn>,
    find_by: Option<FindByFn>,
    find_all: Option<FindAllFn>,
    methods: HashMap<String, MethodFn>,
}

impl StubMethods {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn execute<F>(mut self, f: F) -> Self
    where
        F: Fn(&Query) -> Result<Vec<Value>, DocumentError> + Send + Sync + 'static,
    {
        self.execute = Some(Arc::new(f));
        self
    }

    pub fn find<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> Result<Option<Value>, DocumentError> + Send + Sync + 'static,
    {
        self.find = Some(Arc::new(f));
        self
    }

    /// Also answers `find_one_by` with the first element.
    pub fn find_by<F>(mut self, f: F) -> Self
    where
        F: Fn(&Criteria) -> Result<Vec<Value>, DocumentError> + Send + Sync + 'static,
    {
        self.find_by = Some(Arc::new(f));
        self
    }

    pub fn find_all<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Result<Vec<Value>, DocumentError> + Send + Sync + 'static,
    {
        self.find_all = Some(Arc::new(f));
        self
    }

    /// Custom finder reached through [`Repository::call`].
    pub fn method<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, DocumentError> + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), Arc::new(f));
        self
    }

    /// Custom finder that always returns `value`.
    pub fn returning(self, name: impl Into<String>, value: Value) -> Self {
        self.method(name, move |_| Ok(value.clone()))
    }

    pub fn method_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

pub struct StubRepository {
    inner: Arc<dyn Repository>,
    methods: StubMethods,
    invocations: Mutex<HashMap<String, usize>>,
}

impl StubRepository {
    pub fn new(inner: Arc<dyn Repository>, methods: StubMethods) -> Self {
        Self {
            inner,
            methods,
            invocations: Mutex::new(HashMap::new()),
        }
    }

    /// How many times `method` was called on this stub.
    pub fn invocations(&self, method: &str) -> usize {
        self.invocations.lock().get(method).copied().unwrap_or(0)
    }

    fn record(&self, method: &str) {
        *self
            .invocations
            .lock()
            .entry(method.to_string())
            .or_insert(0) += 1;
    }
}

#[async_trait]
impl Repository for StubRepository {
    fn metadata(&self) -> &DocumentMetadata {
        self.inner.metadata()
    }

    async fn execute(&self, query: &Query) -> Result<Vec<Value>, DocumentError> {
        self.record("execute");
        match &self.methods.execute {
            Some(f) => f(query),
            None => self.inner.execute(query).await,
        }
    }

    async fn find(&self, id: &str) -> Result<Option<Value>, DocumentError> {
        self.record("find");
        match &self.methods.find {
            Some(f) => f(id),
            None => self.inner.find(id).await,
        }
    }

    async fn find_by(&self, criteria: &Criteria) -> Result<Vec<Value>, DocumentError> {
        self.record("find_by");
        match &self.methods.find_by {
            Some(f) => f(criteria),
            None => self.inner.find_by(criteria).await,
        }
    }

    async fn find_one_by(&self, criteria: &Criteria) -> Result<Option<Value>, DocumentError> {
        self.record("find_one_by");
        match &self.methods.find_by {
            Some(f) => Ok(f(criteria)?.into_iter().next()),
            None => self.inner.find_one_by(criteria).await,
        }
    }

    async fn find_all(&self) -> Result<Vec<Value>, DocumentError> {
        self.record("find_all");
        match &self.methods.find_all {
            Some(f) => f(),
            None => self.inner.find_all().await,
        }
    }

    async fn call(&self, method: &str, args: &[Value]) -> Result<Value, DocumentError> {
        self.record(method);
        match self.methods.methods.get(method) {
            Some(f) => f(args),
            None => self.inner.call(method, args).await,
        }
    }
}
