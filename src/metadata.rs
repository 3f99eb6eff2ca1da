//! Table metadata: ordered typed fields, a composite primary key, and
//! per-field defaults.
//!
//! Metadata is a plain value. Nothing in the store keeps it between calls;
//! every operation receives it again and re-derives its statement from it.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TableStoreError};
use crate::sql::sanitize::validate_identifier;
use crate::types::{FieldType, Value};

/// A named, typed field; becomes one table column
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldDefinition {
    /// Column name (must be a valid identifier)
    pub name: String,

    /// Type tag of the column
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }

    /// Create a field from a type tag name such as `"int"` or `"str"`
    pub fn from_tag(name: impl Into<String>, tag: &str) -> Result<Self> {
        let name = name.into();
        let field_type = tag.parse::<FieldType>().map_err(|_| {
            TableStoreError::type_mapping(format!(
                "field '{}' has unrecognized type '{}'",
                name, tag
            ))
        })?;
        Ok(Self { name, field_type })
    }
}

/// Description of a table: fields in column order, primary key, defaults
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    /// Fields in column order
    pub fields: Vec<FieldDefinition>,
    /// Field names forming the composite primary key, in key order
    pub primary_key: Vec<String>,
    /// Values substituted when an inserted record omits the field
    pub defaults: BTreeMap<String, Value>,
}

impl Metadata {
    /// Create a new metadata builder
    pub fn builder() -> MetadataBuilder {
        MetadataBuilder::default()
    }

    /// Parse a JSON metadata document
    ///
    /// ```json
    /// {
    ///   "fields": [{"name": "id", "type": "int"}, {"name": "name", "type": "str"}],
    ///   "primary_key": ["id"],
    ///   "defaults": {"name": "unknown"}
    /// }
    /// ```
    ///
    /// Type tags go through the same alias table as [`FieldType`]'s `FromStr`;
    /// default values are converted according to their field's type. The
    /// result is not validated; store operations validate it on use.
    pub fn from_json(document: &str) -> Result<Self> {
        let raw: RawMetadata = serde_json::from_str(document)?;

        let fields = raw
            .fields
            .into_iter()
            .map(|f| FieldDefinition::from_tag(f.name, &f.field_type))
            .collect::<Result<Vec<_>>>()?;

        let mut defaults = BTreeMap::new();
        for (name, json) in raw.defaults {
            let field_type = fields
                .iter()
                .find(|f| f.name == name)
                .map(|f| f.field_type)
                .ok_or_else(|| {
                    TableStoreError::schema(format!("default given for undeclared field '{}'", name))
                })?;
            let value = value_from_json(field_type, json).map_err(|e| {
                TableStoreError::schema(format!("default for field '{}': {}", name, e))
            })?;
            defaults.insert(name, value);
        }

        Ok(Self {
            fields,
            primary_key: raw.primary_key,
            defaults,
        })
    }

    /// Check the metadata invariants
    ///
    /// - at least one field, no duplicate field names
    /// - every field name is a safe identifier
    /// - primary key and defaults only name declared fields
    /// - default values fit their field's type
    pub fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(TableStoreError::schema("metadata declares no fields"));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            validate_identifier(&field.name).map_err(TableStoreError::validation)?;
            if !seen.insert(field.name.as_str()) {
                return Err(TableStoreError::schema(format!(
                    "field '{}' is declared more than once",
                    field.name
                )));
            }
        }

        let mut key_seen = HashSet::new();
        for key in &self.primary_key {
            if !seen.contains(key.as_str()) {
                return Err(TableStoreError::schema(format!(
                    "primary key references undeclared field '{}'",
                    key
                )));
            }
            if !key_seen.insert(key.as_str()) {
                return Err(TableStoreError::schema(format!(
                    "primary key lists field '{}' more than once",
                    key
                )));
            }
        }

        for (name, value) in &self.defaults {
            let field = self.field(name).ok_or_else(|| {
                TableStoreError::schema(format!("default given for undeclared field '{}'", name))
            })?;
            field.field_type.validate_value(value).map_err(|e| {
                TableStoreError::schema(format!("default for field '{}': {}", name, e))
            })?;
        }

        Ok(())
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn default_for(&self, name: &str) -> Option<&Value> {
        self.defaults.get(name)
    }

    pub fn is_primary_key(&self, name: &str) -> bool {
        self.primary_key.iter().any(|k| k == name)
    }
}

/// Builder for Metadata
#[derive(Debug, Default)]
pub struct MetadataBuilder {
    fields: Vec<FieldDefinition>,
    primary_key: Vec<String>,
    defaults: BTreeMap<String, Value>,
}

impl MetadataBuilder {
    /// Append a typed field
    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.push(FieldDefinition::new(name, field_type));
        self
    }

    /// Append a field given by type tag name
    pub fn field_tag(mut self, name: impl Into<String>, tag: &str) -> Result<Self> {
        self.fields.push(FieldDefinition::from_tag(name, tag)?);
        Ok(self)
    }

    /// Set the composite primary key, in key order
    pub fn primary_key<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = names.into_iter().map(Into::into).collect();
        self
    }

    /// Declare a default value for a field
    pub fn default_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.insert(name.into(), value.into());
        self
    }

    /// Build the metadata (not validated)
    pub fn build(self) -> Metadata {
        Metadata {
            fields: self.fields,
            primary_key: self.primary_key,
            defaults: self.defaults,
        }
    }
}

#[derive(Deserialize)]
struct RawMetadata {
    fields: Vec<RawField>,
    #[serde(default)]
    primary_key: Vec<String>,
    #[serde(default)]
    defaults: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct RawField {
    name: String,
    #[serde(rename = "type")]
    field_type: String,
}

/// Convert a JSON default into a value of the field's type
fn value_from_json(
    field_type: FieldType,
    json: serde_json::Value,
) -> std::result::Result<Value, String> {
    if json.is_null() {
        return Ok(Value::Null);
    }

    let mismatch = |json: &serde_json::Value| format!("expected {}, got {}", field_type, json);

    match field_type {
        FieldType::Integer => json.as_i64().map(Value::Integer).ok_or_else(|| mismatch(&json)),
        FieldType::Real => json.as_f64().map(Value::Real).ok_or_else(|| mismatch(&json)),
        FieldType::Text => match json {
            serde_json::Value::String(s) => Ok(Value::Text(s)),
            other => Err(mismatch(&other)),
        },
        FieldType::Boolean => json.as_bool().map(Value::Boolean).ok_or_else(|| mismatch(&json)),
        FieldType::Blob => json
            .as_array()
            .and_then(|items| {
                items
                    .iter()
                    .map(|b| b.as_u64().and_then(|b| u8::try_from(b).ok()))
                    .collect::<Option<Vec<u8>>>()
            })
            .map(Value::Blob)
            .ok_or_else(|| mismatch(&json)),
        FieldType::Json => Ok(Value::Json(json)),
        FieldType::Timestamp => json
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| Value::Timestamp(dt.with_timezone(&Utc)))
            .ok_or_else(|| mismatch(&json)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> Metadata {
        Metadata::builder()
            .field("id", FieldType::Integer)
            .field("name", FieldType::Text)
            .primary_key(["id"])
            .build()
    }

    // =========================================================================
    // Builder Tests
    // =========================================================================

    #[test]
    fn test_builder_preserves_field_order() {
        let meta = Metadata::builder()
            .field("zeta", FieldType::Text)
            .field("alpha", FieldType::Integer)
            .field("mid", FieldType::Real)
            .build();

        let names: Vec<&str> = meta.field_names().collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_builder_field_tag() {
        let meta = Metadata::builder()
            .field_tag("id", "int")
            .unwrap()
            .field_tag("payload", "dict")
            .unwrap()
            .build();

        assert_eq!(meta.fields[0].field_type, FieldType::Integer);
        assert_eq!(meta.fields[1].field_type, FieldType::Json);
    }

    #[test]
    fn test_builder_field_tag_unknown() {
        let result = Metadata::builder().field_tag("id", "complex");
        let err = result.unwrap_err();
        assert!(matches!(err, TableStoreError::TypeMapping(_)));
        assert!(err.to_string().contains("'id'"));
    }

    #[test]
    fn test_builder_defaults() {
        let meta = Metadata::builder()
            .field("id", FieldType::Integer)
            .field("name", FieldType::Text)
            .default_value("name", "unknown")
            .build();

        assert_eq!(meta.default_for("name"), Some(&Value::from("unknown")));
        assert!(meta.default_for("id").is_none());
    }

    // =========================================================================
    // Validation Tests
    // =========================================================================

    #[test]
    fn test_validate_ok() {
        assert!(users().validate().is_ok());
    }

    #[test]
    fn test_validate_empty_primary_key_ok() {
        let meta = Metadata::builder().field("note", FieldType::Text).build();
        assert!(meta.validate().is_ok());
    }

    #[test]
    fn test_validate_no_fields() {
        let err = Metadata::default().validate().unwrap_err();
        assert!(matches!(err, TableStoreError::Schema(_)));
    }

    #[test]
    fn test_validate_primary_key_unknown_field() {
        let meta = Metadata::builder()
            .field("id", FieldType::Integer)
            .primary_key(["id", "tenant"])
            .build();

        let err = meta.validate().unwrap_err();
        assert!(matches!(err, TableStoreError::Schema(_)));
        assert!(err.to_string().contains("tenant"));
    }

    #[test]
    fn test_validate_primary_key_repeated() {
        let meta = Metadata::builder()
            .field("id", FieldType::Integer)
            .primary_key(["id", "id"])
            .build();

        assert!(matches!(meta.validate(), Err(TableStoreError::Schema(_))));
    }

    #[test]
    fn test_validate_duplicate_field() {
        let meta = Metadata::builder()
            .field("id", FieldType::Integer)
            .field("id", FieldType::Text)
            .build();

        assert!(matches!(meta.validate(), Err(TableStoreError::Schema(_))));
    }

    #[test]
    fn test_validate_unsafe_field_name() {
        let meta = Metadata::builder()
            .field("name; DROP TABLE users", FieldType::Text)
            .build();

        assert!(matches!(meta.validate(), Err(TableStoreError::Validation(_))));
    }

    #[test]
    fn test_validate_field_named_super() {
        let meta = Metadata::builder()
            .field("super", FieldType::Text)
            .primary_key(["super"])
            .build();

        assert!(meta.validate().is_ok());
    }

    #[test]
    fn test_validate_default_for_unknown_field() {
        let meta = Metadata::builder()
            .field("id", FieldType::Integer)
            .default_value("name", "x")
            .build();

        assert!(matches!(meta.validate(), Err(TableStoreError::Schema(_))));
    }

    #[test]
    fn test_validate_default_type_mismatch() {
        let meta = Metadata::builder()
            .field("age", FieldType::Integer)
            .default_value("age", "old")
            .build();

        assert!(matches!(meta.validate(), Err(TableStoreError::Schema(_))));
    }

    // =========================================================================
    // JSON Document Tests
    // =========================================================================

    #[test]
    fn test_from_json() {
        let meta = Metadata::from_json(
            r#"{
                "fields": [
                    {"name": "id", "type": "int"},
                    {"name": "name", "type": "str"},
                    {"name": "meta", "type": "dict"}
                ],
                "primary_key": ["id"],
                "defaults": {"name": "unknown", "meta": {"tags": []}}
            }"#,
        )
        .unwrap();

        let names: Vec<&str> = meta.field_names().collect();
        assert_eq!(names, vec!["id", "name", "meta"]);
        assert_eq!(meta.primary_key, vec!["id".to_string()]);
        assert_eq!(meta.default_for("name"), Some(&Value::from("unknown")));
        assert_eq!(
            meta.default_for("meta"),
            Some(&Value::Json(serde_json::json!({"tags": []})))
        );
        assert!(meta.validate().is_ok());
    }

    #[test]
    fn test_from_json_optional_sections() {
        let meta = Metadata::from_json(r#"{"fields": [{"name": "x", "type": "real"}]}"#).unwrap();
        assert!(meta.primary_key.is_empty());
        assert!(meta.defaults.is_empty());
    }

    #[test]
    fn test_from_json_unknown_type() {
        let err = Metadata::from_json(r#"{"fields": [{"name": "x", "type": "set"}]}"#)
            .unwrap_err();
        assert!(matches!(err, TableStoreError::TypeMapping(_)));
    }

    #[test]
    fn test_from_json_bad_default() {
        let err = Metadata::from_json(
            r#"{"fields": [{"name": "n", "type": "int"}], "defaults": {"n": "ten"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, TableStoreError::Schema(_)));
    }

    #[test]
    fn test_from_json_malformed() {
        let err = Metadata::from_json("{not json").unwrap_err();
        assert!(matches!(err, TableStoreError::Json(_)));
    }

    #[test]
    fn test_value_from_json_conversions() {
        assert_eq!(
            value_from_json(FieldType::Blob, serde_json::json!([1, 2, 255])).unwrap(),
            Value::Blob(vec![1, 2, 255])
        );
        assert!(value_from_json(FieldType::Blob, serde_json::json!([256])).is_err());
        assert_eq!(
            value_from_json(FieldType::Boolean, serde_json::json!(true)).unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            value_from_json(FieldType::Text, serde_json::Value::Null).unwrap(),
            Value::Null
        );
        assert!(matches!(
            value_from_json(FieldType::Timestamp, serde_json::json!("2024-01-15T10:30:00Z")),
            Ok(Value::Timestamp(_))
        ));
    }
}
