//! Content metadata on schemaless JSON records.

use crate::ContentMetadata;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use vellum_error::{MetadataError, MetadataErrorKind, VellumResult};

/// Which fields of a record carry the content metadata.
///
/// Deserializable so record layouts can live in configuration.
///
/// ```toml
/// [claims.fields]
/// id_field = "form_id"
/// length_field = "form_length"
/// id_is_primary_key = false
/// ```
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_setters::Setters,
)]
#[setters(prefix = "with_")]
pub struct ContentFields {
    /// Field holding the content identifier
    #[serde(default = "default_id_field")]
    id_field: String,

    /// Field holding the content length in bytes
    #[serde(default = "default_length_field")]
    length_field: String,

    /// Whether the identifier field is also the record's primary key
    #[serde(default)]
    id_is_primary_key: bool,
}

fn default_id_field() -> String {
    "content_id".to_string()
}

fn default_length_field() -> String {
    "content_length".to_string()
}

impl Default for ContentFields {
    fn default() -> Self {
        Self {
            id_field: default_id_field(),
            length_field: default_length_field(),
            id_is_primary_key: false,
        }
    }
}

/// A JSON object whose content fields are named by a [`ContentFields`]
/// descriptor.
///
/// Identifiers are stored as JSON strings; numeric identifiers already
/// present in the record are read back in their decimal form. A field the
/// record does not declare fails with [`MetadataErrorKind::MissingField`].
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use vellum_core::{ContentFields, ContentMetadata, JsonRecord};
///
/// let mut record = JsonRecord::empty(ContentFields::default());
/// record.set_content_id(Some("a1".to_string())).unwrap();
/// record.set_content_length(5).unwrap();
///
/// assert_eq!(record.values()["content_id"], json!("a1"));
/// assert_eq!(record.content_length().unwrap(), 5);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRecord {
    fields: Arc<ContentFields>,
    values: Map<String, Value>,
}

impl JsonRecord {
    /// Wrap an existing JSON object.
    pub fn new(fields: impl Into<Arc<ContentFields>>, values: Map<String, Value>) -> Self {
        Self {
            fields: fields.into(),
            values,
        }
    }

    /// A record declaring only the content fields, with no content attached.
    pub fn empty(fields: impl Into<Arc<ContentFields>>) -> Self {
        let fields = fields.into();
        let mut values = Map::new();
        values.insert(fields.id_field.clone(), Value::Null);
        values.insert(fields.length_field.clone(), Value::from(0u64));
        Self { fields, values }
    }

    /// The underlying JSON object.
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Consume the record, returning the JSON object.
    pub fn into_values(self) -> Map<String, Value> {
        self.values
    }

    fn declared(&self, field: &str) -> VellumResult<&Value> {
        self.values
            .get(field)
            .ok_or_else(|| MetadataError::new(MetadataErrorKind::MissingField(field.to_string())).into())
    }

    fn declared_mut(&mut self, field: &str) -> VellumResult<&mut Value> {
        self.values
            .get_mut(field)
            .ok_or_else(|| MetadataError::new(MetadataErrorKind::MissingField(field.to_string())).into())
    }
}

fn wrong_type(field: &str, expected: &str) -> MetadataError {
    MetadataError::new(MetadataErrorKind::FieldType {
        field: field.to_string(),
        expected: expected.to_string(),
    })
}

impl ContentMetadata for JsonRecord {
    type Id = String;

    fn content_id(&self) -> VellumResult<Option<String>> {
        let field = &self.fields.id_field;
        match self.declared(field)? {
            Value::Null => Ok(None),
            Value::String(id) => Ok(Some(id.clone())),
            Value::Number(id) => Ok(Some(id.to_string())),
            _ => Err(wrong_type(field, "string or number").into()),
        }
    }

    fn set_content_id(&mut self, id: Option<String>) -> VellumResult<()> {
        let field = self.fields.id_field.clone();
        *self.declared_mut(&field)? = id.map(Value::String).unwrap_or(Value::Null);
        Ok(())
    }

    fn content_length(&self) -> VellumResult<u64> {
        let field = &self.fields.length_field;
        match self.declared(field)? {
            Value::Null => Ok(0),
            Value::Number(length) => length
                .as_u64()
                .ok_or_else(|| wrong_type(field, "non-negative integer").into()),
            _ => Err(wrong_type(field, "non-negative integer").into()),
        }
    }

    fn set_content_length(&mut self, length: u64) -> VellumResult<()> {
        let field = self.fields.length_field.clone();
        *self.declared_mut(&field)? = Value::from(length);
        Ok(())
    }

    fn content_id_is_primary_key(&self) -> bool {
        self.fields.id_is_primary_key
    }
}
