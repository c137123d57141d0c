//! Format transcoder between local entities and CMS documents.
//!
//! Encoding walks the entity's field table and writes every field that has a
//! value; empty fields are left out so a partial update never clobbers a
//! remote default. Decoding is lenient about the shapes WordPress and Pods
//! actually emit, strict about everything else.

mod decode;

use crate::domain::RemoteId;
use crate::registry::{
    EntitySchema, FieldKind, FieldMapping, FieldValue, Placement, RefEncoding, ScalarType,
    SyncEntity,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

pub use decode::{RemoteRef, decode_refs, describe};

/// Post status sent with every write.
pub const PUBLISH: &str = "publish";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscodeError {
    #[error("field '{field}': expected {expected}, found {found}")]
    UnexpectedShape {
        field: String,
        expected: &'static str,
        found: String,
    },

    #[error("field '{field}': invalid value '{value}'")]
    InvalidValue { field: String, value: String },

    #[error("required field '{0}' has no value")]
    MissingRequired(String),

    #[error("remote document has no usable id")]
    MissingId,

    #[error("entity document could not be (de)serialized: {0}")]
    Entity(String),
}

impl From<serde_json::Error> for TranscodeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Entity(err.to_string())
    }
}

/// Request body for a CMS create or update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemotePayload {
    #[serde(flatten)]
    pub root: Map<String, Value>,
    pub status: String,
    pub meta: Map<String, Value>,
}

impl RemotePayload {
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.root.get("title").and_then(Value::as_str)
    }

    /// Renders the payload the way the CMS would echo it back.
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Field values decoded from a CMS document, keyed by local field name.
///
/// Only fields the document actually supplied are present; a field supplied
/// blank is present as [`FieldValue::Cleared`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialEntity {
    values: BTreeMap<&'static str, FieldValue>,
}

impl PartialEntity {
    #[must_use]
    pub fn get(&self, local_name: &str) -> Option<&FieldValue> {
        self.values.get(local_name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.values.keys().copied()
    }
}

/// Bidirectional mapping for one entity type.
pub trait Transcoder<T>: Send + Sync {
    fn to_remote(&self, entity: &T) -> Result<RemotePayload, TranscodeError>;

    fn from_remote(&self, document: &Value) -> Result<PartialEntity, TranscodeError>;

    /// Update semantics: fields absent from `partial` keep their value and
    /// cleared fields are emptied.
    fn merge(&self, entity: &mut T, partial: PartialEntity);

    /// Create semantics: fields absent from `partial` take their default.
    fn materialize(&self, partial: PartialEntity) -> T;
}

/// [`Transcoder`] driven entirely by the entity's registry table.
pub struct SchemaTranscoder<T> {
    schema: Arc<EntitySchema<T>>,
}

impl<T: SyncEntity> SchemaTranscoder<T> {
    #[must_use]
    pub const fn new(schema: Arc<EntitySchema<T>>) -> Self {
        Self { schema }
    }

    #[must_use]
    pub fn for_entity() -> Self {
        Self::new(Arc::new(T::schema()))
    }
}

impl<T: SyncEntity> Transcoder<T> for SchemaTranscoder<T> {
    fn to_remote(&self, entity: &T) -> Result<RemotePayload, TranscodeError> {
        let mut root = Map::new();
        let mut meta = Map::new();

        for field in &self.schema.fields {
            let Some(value) = field.read(entity) else {
                continue;
            };
            let encoded = encode(field, value)?;
            match field.placement {
                Placement::Root => root.insert(field.remote_name.to_string(), encoded),
                Placement::Meta => meta.insert(field.remote_name.to_string(), encoded),
            };
        }

        if !root.contains_key("title") {
            return Err(TranscodeError::MissingRequired("title".to_string()));
        }

        Ok(RemotePayload {
            root,
            status: PUBLISH.to_string(),
            meta,
        })
    }

    fn from_remote(&self, document: &Value) -> Result<PartialEntity, TranscodeError> {
        let mut values = BTreeMap::new();

        for field in &self.schema.fields {
            let Some(raw) = locate(document, field) else {
                continue;
            };
            values.insert(field.local_name, decode::decode_field(field, raw)?);
        }

        Ok(PartialEntity { values })
    }

    fn merge(&self, entity: &mut T, partial: PartialEntity) {
        for (local_name, value) in partial.values {
            if let Some(field) = self.schema.field(local_name) {
                field.write(entity, value);
            }
        }
    }

    fn materialize(&self, partial: PartialEntity) -> T {
        let mut entity = T::default();
        self.merge(&mut entity, partial);
        entity
    }
}

/// Finds the raw value for a field in a CMS document.
///
/// Pods exposes custom fields both under `meta` and, when REST display is
/// enabled for the pod, at the top level; `meta` wins when both exist.
pub fn locate<'a, T>(document: &'a Value, field: &FieldMapping<T>) -> Option<&'a Value> {
    match field.placement {
        Placement::Root => document.get(field.remote_name),
        Placement::Meta => locate_meta(document, field.remote_name),
    }
}

/// Custom field lookup by remote name alone.
pub fn locate_meta<'a>(document: &'a Value, remote_name: &str) -> Option<&'a Value> {
    document
        .get("meta")
        .and_then(|meta| meta.get(remote_name))
        .or_else(|| document.get(remote_name))
}

/// Reads the post id from a CMS document.
pub fn remote_id_of(document: &Value) -> Result<RemoteId, TranscodeError> {
    match document.get("id") {
        Some(Value::Number(n)) => n.as_i64().map(RemoteId::new),
        Some(Value::String(s)) => s.trim().parse().ok().map(RemoteId::new),
        _ => None,
    }
    .filter(|id| id.value() > 0)
    .ok_or(TranscodeError::MissingId)
}

fn encode<T>(field: &FieldMapping<T>, value: FieldValue) -> Result<Value, TranscodeError> {
    let mismatch = |value: &FieldValue| TranscodeError::UnexpectedShape {
        field: field.local_name.to_string(),
        expected: expected_for(field.kind),
        found: format!("{value:?}"),
    };

    let encoded = match (field.kind, value) {
        (FieldKind::Scalar(ScalarType::Text), FieldValue::Text(s)) => Value::String(s),
        (FieldKind::Scalar(ScalarType::Integer), FieldValue::Integer(n)) => Value::from(n),
        (FieldKind::Scalar(ScalarType::Number), FieldValue::Number(n)) => {
            serde_json::Number::from_f64(n)
                .map(Value::Number)
                .ok_or_else(|| TranscodeError::InvalidValue {
                    field: field.local_name.to_string(),
                    value: n.to_string(),
                })?
        }
        (FieldKind::Date, FieldValue::Date(d)) => Value::String(d.format("%Y-%m-%d").to_string()),
        (FieldKind::RepeatableText, FieldValue::TextList(items)) => strings(items),
        (FieldKind::Relationship(rel), FieldValue::TextList(names))
            if rel.encoding == RefEncoding::Names =>
        {
            strings(names)
        }
        (FieldKind::Relationship(rel), FieldValue::IdList(ids))
            if rel.encoding == RefEncoding::RemoteIds =>
        {
            Value::Array(ids.into_iter().map(Value::from).collect())
        }
        (_, other) => return Err(mismatch(&other)),
    };

    Ok(encoded)
}

fn strings(items: Vec<String>) -> Value {
    Value::Array(
        items
            .into_iter()
            .filter(|s| !s.trim().is_empty())
            .map(Value::String)
            .collect(),
    )
}

pub(crate) const fn expected_for(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Scalar(ScalarType::Text) => "text",
        FieldKind::Scalar(ScalarType::Integer) => "integer",
        FieldKind::Scalar(ScalarType::Number) => "number",
        FieldKind::Date => "date",
        FieldKind::RepeatableText => "list of text",
        FieldKind::Relationship(rel) => match rel.encoding {
            RefEncoding::RemoteIds => "list of post ids",
            RefEncoding::Names => "list of names",
        },
    }
}
