//! Field-equality queries over JSON documents.

use std::fmt;

use serde_json::{Map, Value};

/// Flat field-to-value equality mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria(Map<String, Value>);

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for Criteria {
    fn from(map: Map<String, Value>) -> Self {
        Criteria(map)
    }
}

impl fmt::Display for Criteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Value::Object(self.0.clone()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq { path: String, value: Value },
    In { path: String, values: Vec<Value> },
}

impl Condition {
    pub fn matches(&self, document: &Value) -> bool {
        match self {
            Condition::Eq { path, value } => {
                let candidates = resolve_path(document, path);
                if candidates.is_empty() {
                    return value.is_null();
                }
                candidates.into_iter().any(|candidate| {
                    candidate == value
                        || candidate
                            .as_array()
                            .is_some_and(|items| items.contains(value))
                })
            }
            Condition::In { path, values } => {
                resolve_path(document, path)
                    .into_iter()
                    .any(|candidate| match candidate {
                        Value::Array(items) => items.iter().any(|item| values.contains(item)),
                        other => values.contains(other),
                    })
            }
        }
    }
}

/// Collect the values reachable through a dot path. Arrays crossed on the way
/// contribute each element.
fn resolve_path<'a>(document: &'a Value, path: &str) -> Vec<&'a Value> {
    let mut current = vec![document];
    for segment in path.split('.') {
        let mut next = Vec::new();
        for value in current {
            match value {
                Value::Object(map) => {
                    if let Some(child) = map.get(segment) {
                        next.push(child);
                    }
                }
                Value::Array(items) => {
                    for item in items {
                        if let Some(child) = item.as_object().and_then(|m| m.get(segment)) {
                            next.push(child);
                        }
                    }
                }
                _ => {}
            }
        }
        current = next;
    }
    current
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub conditions: Vec<Condition>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn matches(&self, document: &Value) -> bool {
        self.conditions.iter().all(|c| c.matches(document))
    }

    /// Filter documents (already ordered by the store) and apply the limit.
    pub fn apply(&self, documents: Vec<Value>) -> Vec<Value> {
        let matching = documents.into_iter().filter(|d| self.matches(d));
        match self.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            query: Query {
                collection: collection.into(),
                conditions: Vec::new(),
                limit: None,
            },
        }
    }

    pub fn field(self, path: impl Into<String>) -> FieldExpr {
        FieldExpr {
            builder: self,
            path: path.into(),
        }
    }

    pub fn criteria(mut self, criteria: &Criteria) -> Self {
        for (field, value) in criteria.iter() {
            self = self.field(field.clone()).equals(value.clone());
        }
        self
    }

    pub fn condition(mut self, condition: Condition) -> Self {
        self.query.conditions.push(condition);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.query.limit = Some(limit);
        self
    }

    pub fn get_query(self) -> Query {
        self.query
    }
}

pub struct FieldExpr {
    builder: QueryBuilder,
    path: String,
}

impl FieldExpr {
    pub fn equals(self, value: impl Into<Value>) -> QueryBuilder {
        self.builder.condition(Condition::Eq {
            path: self.path,
            value: value.into(),
        })
    }

    pub fn in_values(self, values: Vec<Value>) -> QueryBuilder {
        self.builder.condition(Condition::In {
            path: self.path,
            values,
        })
    }
}
