//! Builds repository queries from the JSON filters used in assertions.
//!
//! A filter maps field names to values. Scalars and arrays become equality
//! conditions. An object value descends exactly one level:
//!
//! * on a reference association, the nested filter selects target documents
//!   and the field must point at one of them;
//! * on any other field, each nested entry becomes an equality on
//!   `field.sub`.

use std::sync::Arc;

use document_manager::{Criteria, DocumentManager, Query, Repository};
use serde_json::{Map, Value};

use crate::error::ModuleError;

pub(crate) async fn build_query(
    dm: &DocumentManager,
    document: &str,
    filter: &Value,
) -> Result<(Arc<dyn Repository>, Query), ModuleError> {
    let fields = filter.as_object().ok_or_else(|| {
        ModuleError::unsupported(document, format!("filter must be a JSON object, got {filter}"))
    })?;

    let repository = dm.get_repository(document)?;
    let metadata = repository.metadata().clone();
    let mut builder = repository.create_query_builder();

    for (field, value) in fields {
        builder = match value {
            Value::Object(nested) => {
                let nested = flat_criteria(document, field, nested)?;
                match metadata.association(field) {
                    Some(assoc) if assoc.is_reference() => {
                        let target = assoc.target.as_deref().ok_or_else(|| {
                            ModuleError::unsupported(
                                document,
                                format!("reference '{field}' has no target document"),
                            )
                        })?;
                        let ids = referenced_ids(dm, target, &nested).await?;
                        builder.field(field.clone()).in_values(ids)
                    }
                    _ => nested.iter().fold(builder, |b, (sub, v)| {
                        b.field(format!("{field}.{sub}")).equals(v.clone())
                    }),
                }
            }
            other => builder.field(field.clone()).equals(other.clone()),
        };
    }

    Ok((repository, builder.get_query()))
}

fn flat_criteria(
    document: &str,
    field: &str,
    nested: &Map<String, Value>,
) -> Result<Criteria, ModuleError> {
    if let Some((sub, _)) = nested.iter().find(|(_, v)| v.is_object()) {
        return Err(ModuleError::unsupported(
            document,
            format!("'{field}.{sub}' nests more than one level"),
        ));
    }
    Ok(Criteria::from(nested.clone()))
}

async fn referenced_ids(
    dm: &DocumentManager,
    target: &str,
    criteria: &Criteria,
) -> Result<Vec<Value>, ModuleError> {
    let repository = dm.get_repository(target)?;
    let id_field = repository.metadata().id_field.clone();
    Ok(repository
        .find_by(criteria)
        .await?
        .into_iter()
        .filter_map(|mut doc| doc.get_mut(&id_field).map(Value::take))
        .collect())
}
