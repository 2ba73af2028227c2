//! Logical-to-physical type mapping.
//!
//! Resolves [`SchemaField`] descriptors into Arrow fields. Resolution is a
//! pure function of the descriptor tree. A field that cannot be mapped is
//! dropped with a warning rather than aborting anything, but a schema with
//! any unresolvable top-level field resolves to `None` so callers treat
//! ingestion as unavailable instead of writing a partial table.
//!
//! Logical types without a native Arrow representation (JSON, geography,
//! civil datetime) are carried as strings or timestamps tagged with
//! extension metadata, so downstream consumers recover the logical type
//! without a schema registry.

use std::collections::HashMap;
use std::sync::Arc;

use arrow::datatypes::{DataType, Field, Fields, Schema, TimeUnit};
use tracing::{error, warn};

use crate::field::{FieldKind, SchemaField};

/// Metadata key naming the logical source type of a column.
pub const EXTENSION_NAME_KEY: &str = "ARROW:extension:name";
/// Metadata key carrying extra encoding details for a logical type.
pub const EXTENSION_METADATA_KEY: &str = "ARROW:extension:metadata";

/// Resolve a whole descriptor list into an Arrow schema.
///
/// Returns `None` (not a partial schema) if any top-level field fails to
/// resolve, or if the schema would be empty. Never panics.
pub fn resolve_schema(fields: &[SchemaField]) -> Option<Schema> {
    let mut resolved = Vec::with_capacity(fields.len());
    for field in fields {
        match resolve_field(field) {
            Some(f) => resolved.push(f),
            None => {
                warn!(field = %field.name, "schema resolution failed, ingestion unavailable");
                return None;
            }
        }
    }
    if resolved.is_empty() {
        warn!("schema resolved to zero fields, ingestion unavailable");
        return None;
    }
    Some(Schema::new(resolved))
}

/// Resolve one descriptor into an Arrow field.
///
/// Returns `None` when the field (or any part of a nested field) has no
/// physical mapping; the failure is logged and scoped to this field only.
pub fn resolve_field(field: &SchemaField) -> Option<Field> {
    let Some(data_type) = resolve_data_type(field) else {
        warn!(field = %field.name, "dropping field with no physical type mapping");
        return None;
    };
    let nullable = !field.required && !field.repeated;
    let mut resolved = Field::new(field.name.clone(), data_type, nullable);
    if let Some(metadata) = type_metadata(&field.kind) {
        resolved = resolved.with_metadata(metadata);
    }
    Some(resolved)
}

fn resolve_data_type(field: &SchemaField) -> Option<DataType> {
    if field.repeated {
        let element = SchemaField {
            repeated: false,
            ..field.clone()
        };
        let inner = resolve_data_type(&element)?;
        return Some(DataType::List(Arc::new(Field::new("item", inner, true))));
    }

    match &field.kind {
        FieldKind::Struct(children) => resolve_struct(field, children),
        FieldKind::Range(element) => resolve_range(field, element),
        FieldKind::List(element) => {
            let inner = resolve_field(element)?;
            Some(DataType::List(Arc::new(inner)))
        }
        kind => scalar_data_type(kind),
    }
}

/// Structs resolve all-or-nothing: a column must have a complete type.
fn resolve_struct(field: &SchemaField, children: &[SchemaField]) -> Option<DataType> {
    let mut fields = Vec::with_capacity(children.len());
    for child in children {
        match resolve_field(child) {
            Some(f) => fields.push(f),
            None => {
                warn!(
                    field = %field.name,
                    child = %child.name,
                    "dropping struct field, child failed to resolve"
                );
                return None;
            }
        }
    }
    Some(DataType::Struct(Fields::from(fields)))
}

/// Ranges resolve to a `{start, end}` record of the scalar element type.
fn resolve_range(field: &SchemaField, element: &FieldKind) -> Option<DataType> {
    let Some(element_type) = scalar_data_type(element) else {
        // Input-contract violation: report it, never default silently.
        error!(field = %field.name, "range element must be a scalar kind");
        return None;
    };
    Some(DataType::Struct(Fields::from(vec![
        Field::new("start", element_type.clone(), true),
        Field::new("end", element_type, true),
    ])))
}

fn scalar_data_type(kind: &FieldKind) -> Option<DataType> {
    let data_type = match kind {
        FieldKind::Bool => DataType::Boolean,
        FieldKind::Bytes => DataType::Binary,
        FieldKind::Date => DataType::Date32,
        FieldKind::DateTime => DataType::Timestamp(TimeUnit::Microsecond, None),
        FieldKind::Float64 => DataType::Float64,
        FieldKind::Int64 => DataType::Int64,
        FieldKind::Geography | FieldKind::Json | FieldKind::String => DataType::Utf8,
        FieldKind::Numeric { precision, scale } => DataType::Decimal128(*precision, *scale),
        FieldKind::Time => DataType::Time64(TimeUnit::Microsecond),
        FieldKind::Timestamp => DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
        FieldKind::Struct(_) | FieldKind::Range(_) | FieldKind::List(_) => return None,
    };
    Some(data_type)
}

fn type_metadata(kind: &FieldKind) -> Option<HashMap<String, String>> {
    let pairs: &[(&str, &str)] = match kind {
        FieldKind::Geography => &[
            (EXTENSION_NAME_KEY, "google:sqlType:geography"),
            (EXTENSION_METADATA_KEY, r#"{"encoding": "WKT"}"#),
        ],
        FieldKind::DateTime => &[(EXTENSION_NAME_KEY, "google:sqlType:datetime")],
        FieldKind::Json => &[(EXTENSION_NAME_KEY, "google:sqlType:json")],
        _ => return None,
    };
    Some(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
}

#[cfg(test)]
#[path = "wire_test.rs"]
mod tests;
