//! Document types and their mapping metadata.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::DocumentError;

/// A type the document manager can persist.
///
/// Documents are stored as JSON objects; the metadata names the collection,
/// the id field and the associations to other documents.
pub trait Document: Serialize + DeserializeOwned + Send + Sync + 'static {
    fn metadata() -> DocumentMetadata;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationKind {
    /// Stores the id (or ids) of another document.
    Reference,
    /// Stores the associated value inline.
    Embedded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Association {
    pub field: String,
    /// Target document name. Always set for references.
    pub target: Option<String>,
    pub kind: AssociationKind,
    pub many: bool,
}

impl Association {
    pub fn is_reference(&self) -> bool {
        self.kind == AssociationKind::Reference
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub name: String,
    pub collection: String,
    pub id_field: String,
    pub associations: Vec<Association>,
}

impl DocumentMetadata {
    /// Metadata with the collection named after the document and `id` as id field.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            collection: name.to_lowercase(),
            name,
            id_field: "id".to_string(),
            associations: Vec::new(),
        }
    }

    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    pub fn reference_one(self, field: impl Into<String>, target: impl Into<String>) -> Self {
        self.associate(field, Some(target.into()), AssociationKind::Reference, false)
    }

    pub fn reference_many(self, field: impl Into<String>, target: impl Into<String>) -> Self {
        self.associate(field, Some(target.into()), AssociationKind::Reference, true)
    }

    pub fn embed_one(self, field: impl Into<String>) -> Self {
        self.associate(field, None, AssociationKind::Embedded, false)
    }

    pub fn embed_many(self, field: impl Into<String>) -> Self {
        self.associate(field, None, AssociationKind::Embedded, true)
    }

    fn associate(
        mut self,
        field: impl Into<String>,
        target: Option<String>,
        kind: AssociationKind,
        many: bool,
    ) -> Self {
        self.associations.push(Association {
            field: field.into(),
            target,
            kind,
            many,
        });
        self
    }

    pub fn association(&self, field: &str) -> Option<&Association> {
        self.associations.iter().find(|a| a.field == field)
    }
}

/// Metadata lookup by document name.
#[derive(Debug, Default)]
pub struct MetadataRegistry {
    entries: RwLock<HashMap<String, DocumentMetadata>>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, metadata: DocumentMetadata) {
        self.entries.write().insert(metadata.name.clone(), metadata);
    }

    pub fn get(&self, name: &str) -> Result<DocumentMetadata, DocumentError> {
        self.entries
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| DocumentError::UnknownDocument {
                name: name.to_string(),
            })
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.read().keys().cloned().collect();
        names.sort();
        names
    }
}
