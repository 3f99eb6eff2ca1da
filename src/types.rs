//! Core type definitions
//!
//! Includes field type tags and the values stored in table cells.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TableStoreError;

// ============================================================================
// Field Types
// ============================================================================

/// Type tag of a metadata field, mapped to a SQLite column type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// 64-bit signed integer (maps to INTEGER)
    Integer,

    /// UTF-8 text (maps to TEXT)
    Text,

    /// 64-bit float (maps to REAL)
    Real,

    /// Raw bytes (maps to BLOB)
    Blob,

    /// Boolean, stored by SQLite as 0/1 (maps to BOOLEAN)
    Boolean,

    /// Arbitrary JSON document, serialized to TEXT
    Json,

    /// UTC timestamp, stored as RFC 3339 text (maps to TIMESTAMP)
    Timestamp,
}

impl FieldType {
    /// Every supported tag, in declaration order
    pub const ALL: [FieldType; 7] = [
        FieldType::Integer,
        FieldType::Text,
        FieldType::Real,
        FieldType::Blob,
        FieldType::Boolean,
        FieldType::Json,
        FieldType::Timestamp,
    ];

    /// SQLite column type keyword for this tag
    pub fn to_sql_type(&self) -> &'static str {
        match self {
            FieldType::Integer => "INTEGER",
            FieldType::Text => "TEXT",
            FieldType::Real => "REAL",
            FieldType::Blob => "BLOB",
            FieldType::Boolean => "BOOLEAN",
            FieldType::Json => "TEXT",
            FieldType::Timestamp => "TIMESTAMP",
        }
    }

    /// Canonical lowercase tag name
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Integer => "integer",
            FieldType::Text => "text",
            FieldType::Real => "real",
            FieldType::Blob => "blob",
            FieldType::Boolean => "boolean",
            FieldType::Json => "json",
            FieldType::Timestamp => "timestamp",
        }
    }

    /// Check that a value can be stored in a column of this type
    pub fn validate_value(&self, value: &Value) -> Result<(), String> {
        // Null is storable in every column; constraints decide the rest
        if value.is_null() {
            return Ok(());
        }

        match (self, value) {
            (FieldType::Integer, Value::Integer(_)) => Ok(()),
            (FieldType::Text, Value::Text(_)) => Ok(()),
            (FieldType::Real, Value::Real(_) | Value::Integer(_)) => Ok(()),
            (FieldType::Blob, Value::Blob(_)) => Ok(()),
            (FieldType::Boolean, Value::Boolean(_)) => Ok(()),
            (FieldType::Boolean, Value::Integer(0 | 1)) => Ok(()),
            (FieldType::Json, Value::Blob(_)) => {
                Err("Blob values cannot be stored in a json field".to_string())
            }
            (FieldType::Json, Value::Real(v)) if !v.is_finite() => {
                Err(format!("{} has no JSON representation", v))
            }
            (FieldType::Json, _) => Ok(()),
            (FieldType::Timestamp, Value::Timestamp(_)) => Ok(()),
            (FieldType::Timestamp, Value::Text(s)) => DateTime::parse_from_rfc3339(s)
                .map(|_| ())
                .map_err(|e| format!("Invalid timestamp format: {}", e)),
            _ => Err(format!(
                "Type mismatch: expected {}, got {}",
                self.as_str(),
                value.kind()
            )),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = TableStoreError;

    /// Map a type tag name to a field type
    ///
    /// Accepts the canonical names plus the common aliases
    /// (`int`, `str`, `string`, `float`, `bytes`, `bool`, `dict`, `datetime`).
    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "int" | "integer" => Ok(FieldType::Integer),
            "str" | "string" | "text" => Ok(FieldType::Text),
            "float" | "real" => Ok(FieldType::Real),
            "bytes" | "blob" => Ok(FieldType::Blob),
            "bool" | "boolean" => Ok(FieldType::Boolean),
            "dict" | "json" => Ok(FieldType::Json),
            "timestamp" | "datetime" => Ok(FieldType::Timestamp),
            _ => Err(TableStoreError::type_mapping(format!(
                "no column type for tag '{}'",
                tag
            ))),
        }
    }
}

// ============================================================================
// Values
// ============================================================================

/// A single cell value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    Boolean(bool),
    Json(serde_json::Value),
    Timestamp(DateTime<Utc>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the variant, for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Real(_) => "real",
            Value::Text(_) => "text",
            Value::Blob(_) => "blob",
            Value::Boolean(_) => "boolean",
            Value::Json(_) => "json",
            Value::Timestamp(_) => "timestamp",
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    /// JSON representation used when the value lands in a json field
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Integer(v) => serde_json::Value::from(*v),
            Value::Real(v) => serde_json::Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(v) => serde_json::Value::String(v.clone()),
            Value::Blob(v) => serde_json::Value::from(v.clone()),
            Value::Boolean(v) => serde_json::Value::Bool(*v),
            Value::Json(v) => v.clone(),
            Value::Timestamp(v) => serde_json::Value::String(v.to_rfc3339()),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
