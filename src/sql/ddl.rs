//! DDL Generation from table metadata
//!
//! Generates SQLite DDL statements for metadata-described tables.

use crate::error::{Result, TableStoreError};
use crate::metadata::{FieldDefinition, Metadata};
use crate::sql::sanitize::{quote_identifier, validate_identifier};

/// DDL Generator for metadata-described tables
pub struct DdlGenerator;

impl DdlGenerator {
    /// Generate a CREATE TABLE IF NOT EXISTS statement
    ///
    /// Columns follow the metadata's field order. A table-level
    /// `PRIMARY KEY (...)` clause lists the key fields in key order and is
    /// omitted when the key is empty.
    pub fn generate_create_table(table_name: &str, metadata: &Metadata) -> Result<String> {
        Self::validate_table_name(table_name)?;
        metadata.validate()?;

        let mut column_defs: Vec<String> = metadata
            .fields
            .iter()
            .map(Self::format_column_definition)
            .collect();

        if !metadata.primary_key.is_empty() {
            let key_columns: Vec<String> = metadata
                .primary_key
                .iter()
                .map(|k| quote_identifier(k))
                .collect();
            column_defs.push(format!("PRIMARY KEY ({})", key_columns.join(", ")));
        }

        Ok(format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_identifier(table_name),
            column_defs.join(", ")
        ))
    }

    /// Generate DROP TABLE statement
    pub fn generate_drop_table(table_name: &str) -> Result<String> {
        Self::validate_table_name(table_name)?;
        Ok(format!("DROP TABLE IF EXISTS {}", quote_identifier(table_name)))
    }

    /// Format a single column definition for CREATE TABLE
    pub fn format_column_definition(field: &FieldDefinition) -> String {
        format!(
            "{} {}",
            quote_identifier(&field.name),
            field.field_type.to_sql_type()
        )
    }

    pub(crate) fn validate_table_name(table_name: &str) -> Result<()> {
        validate_identifier(table_name)
            .map_err(|e| TableStoreError::validation(format!("table name: {}", e)))
    }
}
