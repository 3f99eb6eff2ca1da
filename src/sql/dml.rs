//! DML statement building for metadata-described tables
//!
//! Every statement is returned as SQL text with numbered `?N` placeholders
//! plus the values to bind, in placeholder order. Values never appear in
//! the SQL text.

use chrono::{DateTime, Utc};

use crate::error::{Result, TableStoreError};
use crate::metadata::Metadata;
use crate::record::Record;
use crate::sql::ddl::DdlGenerator;
use crate::sql::sanitize::quote_identifier;
use crate::types::{FieldType, Value};

/// SQL text with its positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// Reject record keys that are not declared fields
pub fn check_record_columns(record: &Record, metadata: &Metadata) -> Result<()> {
    let mut unknown: Vec<&str> = record
        .keys()
        .filter(|k| !metadata.has_field(k))
        .collect();

    if unknown.is_empty() {
        return Ok(());
    }

    unknown.sort_unstable();
    Err(TableStoreError::unknown_column(format!(
        "record references undeclared column(s): {}",
        unknown.join(", ")
    )))
}

/// Build an INSERT for one record
///
/// Columns follow metadata order. A field missing from the record takes its
/// declared default; a field with neither is left out so the store applies
/// its own default (NULL). Every primary-key field must end up non-null.
pub fn build_insert(table_name: &str, record: &Record, metadata: &Metadata) -> Result<Statement> {
    DdlGenerator::validate_table_name(table_name)?;
    metadata.validate()?;
    check_record_columns(record, metadata)?;

    for name in &metadata.primary_key {
        if resolve_insert_value(record, metadata, name).is_none_or(Value::is_null) {
            return Err(TableStoreError::validation(format!(
                "primary key field '{}' is missing or null",
                name
            )));
        }
    }

    let mut column_names = Vec::new();
    let mut placeholders = Vec::new();
    let mut params = Vec::new();
    let mut param_idx = 1;

    for field in &metadata.fields {
        let Some(value) = resolve_insert_value(record, metadata, &field.name) else {
            continue;
        };

        params.push(storage_value(field.field_type, &field.name, value)?);
        column_names.push(quote_identifier(&field.name));
        placeholders.push(format!("?{}", param_idx));
        param_idx += 1;
    }

    let sql = if column_names.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES", quote_identifier(table_name))
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_identifier(table_name),
            column_names.join(", "),
            placeholders.join(", ")
        )
    };

    Ok(Statement::new(sql, params))
}

/// Record value for a field, falling back to its declared default
fn resolve_insert_value<'a>(
    record: &'a Record,
    metadata: &'a Metadata,
    name: &str,
) -> Option<&'a Value> {
    record.get(name).or_else(|| metadata.default_for(name))
}

/// Build a SELECT of one row addressed by primary key
pub fn build_select_by_key(table_name: &str, key: &Record, metadata: &Metadata) -> Result<Statement> {
    DdlGenerator::validate_table_name(table_name)?;
    metadata.validate()?;
    check_record_columns(key, metadata)?;

    let mut param_idx = 1;
    let (condition, params) = key_condition(key, metadata, &mut param_idx)?;

    let sql = format!(
        "SELECT {} FROM {} WHERE {}",
        select_list(metadata),
        quote_identifier(table_name),
        condition
    );

    Ok(Statement::new(sql, params))
}

/// Build a SELECT of every row, in insertion (rowid) order
pub fn build_select_all(table_name: &str, metadata: &Metadata) -> Result<Statement> {
    DdlGenerator::validate_table_name(table_name)?;
    metadata.validate()?;

    let sql = format!(
        "SELECT {} FROM {} ORDER BY rowid",
        select_list(metadata),
        quote_identifier(table_name)
    );

    Ok(Statement::new(sql, Vec::new()))
}

/// Build an UPDATE of the row addressed by the record's primary key values
///
/// Returns `None` when the record carries no non-key fields.
pub fn build_update_by_key(
    table_name: &str,
    record: &Record,
    metadata: &Metadata,
) -> Result<Option<Statement>> {
    DdlGenerator::validate_table_name(table_name)?;
    metadata.validate()?;
    check_record_columns(record, metadata)?;

    let mut set_clauses = Vec::new();
    let mut params = Vec::new();
    let mut param_idx = 1;

    for field in &metadata.fields {
        if metadata.is_primary_key(&field.name) {
            continue;
        }
        if let Some(value) = record.get(&field.name) {
            params.push(storage_value(field.field_type, &field.name, value)?);
            set_clauses.push(format!("{} = ?{}", quote_identifier(&field.name), param_idx));
            param_idx += 1;
        }
    }

    // Key values are still required so a bad key is reported either way
    let (condition, mut key_params) = key_condition(record, metadata, &mut param_idx)?;

    if set_clauses.is_empty() {
        return Ok(None);
    }

    params.append(&mut key_params);

    let sql = format!(
        "UPDATE {} SET {} WHERE {}",
        quote_identifier(table_name),
        set_clauses.join(", "),
        condition
    );

    Ok(Some(Statement::new(sql, params)))
}

/// Build a DELETE of the row addressed by primary key
pub fn build_delete_by_key(table_name: &str, key: &Record, metadata: &Metadata) -> Result<Statement> {
    DdlGenerator::validate_table_name(table_name)?;
    metadata.validate()?;
    check_record_columns(key, metadata)?;

    let mut param_idx = 1;
    let (condition, params) = key_condition(key, metadata, &mut param_idx)?;

    let sql = format!("DELETE FROM {} WHERE {}", quote_identifier(table_name), condition);

    Ok(Statement::new(sql, params))
}

/// WHERE condition matching the primary key, with its parameters
///
/// Every key field must be present in `key` and non-null.
fn key_condition(
    key: &Record,
    metadata: &Metadata,
    param_idx: &mut usize,
) -> Result<(String, Vec<Value>)> {
    if metadata.primary_key.is_empty() {
        return Err(TableStoreError::schema(
            "operation requires a primary key but none is declared",
        ));
    }

    let mut parts = Vec::new();
    let mut params = Vec::new();

    for name in &metadata.primary_key {
        let value = key
            .get(name)
            .filter(|v| !v.is_null())
            .ok_or_else(|| {
                TableStoreError::validation(format!("primary key field '{}' is missing or null", name))
            })?;
        let field_type = metadata
            .field(name)
            .map(|f| f.field_type)
            .ok_or_else(|| TableStoreError::schema(format!("undeclared key field '{}'", name)))?;

        params.push(storage_value(field_type, name, value)?);
        parts.push(format!("{} = ?{}", quote_identifier(name), param_idx));
        *param_idx += 1;
    }

    Ok((parts.join(" AND "), params))
}

fn select_list(metadata: &Metadata) -> String {
    metadata
        .fields
        .iter()
        .map(|f| quote_identifier(&f.name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Largest magnitude an integer may have and still convert to f64 exactly
const MAX_EXACT_F64_INT: u64 = 1 << 53;

/// Check a value against its field type and convert it to the form bound
/// to the statement
///
/// JSON fields are serialized to text; integers in real fields become
/// reals (up to 2^53 in magnitude); 0/1 in boolean fields become booleans; RFC 3339 text in
/// timestamp fields is parsed.
pub fn storage_value(field_type: FieldType, column: &str, value: &Value) -> Result<Value> {
    field_type.validate_value(value).map_err(|e| {
        TableStoreError::validation(format!("Invalid value for column '{}': {}", column, e))
    })?;

    Ok(match (field_type, value) {
        (_, Value::Null) => Value::Null,
        (FieldType::Json, value) => Value::Text(serde_json::to_string(&value.to_json())?),
        (FieldType::Real, Value::Integer(v)) => {
            if v.unsigned_abs() > MAX_EXACT_F64_INT {
                return Err(TableStoreError::validation(format!(
                    "Column '{}' cannot hold integer {} as a real without losing precision",
                    column, v
                )));
            }
            Value::Real(*v as f64)
        }
        (FieldType::Boolean, Value::Integer(v)) => Value::Boolean(*v != 0),
        (FieldType::Timestamp, Value::Text(s)) => {
            let parsed = DateTime::parse_from_rfc3339(s).map_err(|e| {
                TableStoreError::validation(format!(
                    "Column '{}' has invalid timestamp: {}",
                    column, e
                ))
            })?;
            Value::Timestamp(parsed.with_timezone(&Utc))
        }
        (_, value) => value.clone(),
    })
}
