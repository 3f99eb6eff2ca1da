//! TableStore - Main entry point for metadata-driven SQLite tables
//!
//! This module provides the `TableStore` struct that creates tables from
//! metadata and reads and writes their rows.

use sqlx::sqlite::{
    SqliteArguments, SqliteConnectOptions, SqliteConnection, SqliteQueryResult, SqliteRow,
};
use sqlx::{ConnectOptions, Connection, Row, Sqlite};

use crate::config::StoreConfig;
use crate::error::{Result, TableStoreError};
use crate::metadata::{FieldDefinition, Metadata};
use crate::record::Record;
use crate::sql::ddl::DdlGenerator;
use crate::sql::dml::{self, Statement};
use crate::types::{FieldType, Value};

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// Metadata-driven SQLite table store
///
/// Holds only configuration. Each operation opens its own connection to the
/// database file, runs a single statement, and closes the connection before
/// returning, whether the statement succeeded or not.
pub struct TableStore {
    /// Store configuration
    config: StoreConfig,
}

impl TableStore {
    /// Create a new TableStore from configuration
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    /// Create a TableStore whose database path comes from `CLASS_TO_SQL_DB`
    pub fn from_env() -> Self {
        Self::new(StoreConfig::from_env())
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // =========================================================================
    // Table Operations
    // =========================================================================

    /// Create the table described by `metadata` if it does not exist
    ///
    /// Calling this again with the same arguments is a no-op; an existing
    /// table is never altered.
    pub async fn create_table(&self, table_name: &str, metadata: &Metadata) -> Result<()> {
        let ddl = DdlGenerator::generate_create_table(table_name, metadata)?;
        self.execute(&Statement::new(ddl, Vec::new())).await?;
        log::info!("table {} ready ({} columns)", table_name, metadata.fields.len());
        Ok(())
    }

    /// Drop the table if it exists
    pub async fn drop_table(&self, table_name: &str) -> Result<()> {
        let ddl = DdlGenerator::generate_drop_table(table_name)?;
        self.execute(&Statement::new(ddl, Vec::new())).await?;
        log::info!("table {} dropped", table_name);
        Ok(())
    }

    /// Whether a table with this name exists
    pub async fn table_exists(&self, table_name: &str) -> Result<bool> {
        let mut conn = self.connect().await?;
        let outcome = sqlx::query_as::<_, (i64,)>(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        )
        .bind(table_name)
        .fetch_one(&mut conn)
        .await;

        let (count,) = Self::finish(conn, outcome).await?;
        Ok(count > 0)
    }

    /// Column names of an existing table, in table order
    pub async fn column_names(&self, table_name: &str) -> Result<Vec<String>> {
        let mut conn = self.connect().await?;
        let outcome =
            sqlx::query_as::<_, (String,)>("SELECT name FROM pragma_table_info(?1) ORDER BY cid")
                .bind(table_name)
                .fetch_all(&mut conn)
                .await;

        let rows = Self::finish(conn, outcome).await?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    // =========================================================================
    // Row Operations
    // =========================================================================

    /// Insert one row
    ///
    /// Fields missing from `record` take their declared default; fields with
    /// neither a value nor a default are left to the database. A record key
    /// that is not a declared field fails with `UnknownColumn` before the
    /// database is touched.
    pub async fn insert_row(
        &self,
        table_name: &str,
        record: &Record,
        metadata: &Metadata,
    ) -> Result<()> {
        let statement = dml::build_insert(table_name, record, metadata)?;
        self.execute(&statement).await?;
        Ok(())
    }

    /// Fetch the row whose primary key matches `key`
    pub async fn read_row(
        &self,
        table_name: &str,
        key: &Record,
        metadata: &Metadata,
    ) -> Result<Option<Record>> {
        let statement = dml::build_select_by_key(table_name, key, metadata)?;
        let rows = self.fetch_all(&statement).await?;

        rows.first()
            .map(|row| Self::row_to_record(row, metadata))
            .transpose()
    }

    /// Fetch every row, in insertion order
    pub async fn read_all(&self, table_name: &str, metadata: &Metadata) -> Result<Vec<Record>> {
        let statement = dml::build_select_all(table_name, metadata)?;
        let rows = self.fetch_all(&statement).await?;

        rows.iter()
            .map(|row| Self::row_to_record(row, metadata))
            .collect()
    }

    /// Update the non-key fields present in `record` on the row addressed
    /// by its primary key values
    pub async fn update_row(
        &self,
        table_name: &str,
        record: &Record,
        metadata: &Metadata,
    ) -> Result<()> {
        let Some(statement) = dml::build_update_by_key(table_name, record, metadata)? else {
            log::debug!("update on {} has no non-key fields, skipping", table_name);
            return Ok(());
        };

        let result = self.execute(&statement).await?;

        if result.rows_affected() == 0 {
            log::warn!("update on {} matched no row", table_name);
            return Err(TableStoreError::row_not_found(table_name));
        }

        Ok(())
    }

    /// Delete the row addressed by primary key
    pub async fn delete_row(&self, table_name: &str, key: &Record, metadata: &Metadata) -> Result<()> {
        let statement = dml::build_delete_by_key(table_name, key, metadata)?;
        let result = self.execute(&statement).await?;

        if result.rows_affected() == 0 {
            log::warn!("delete on {} matched no row", table_name);
            return Err(TableStoreError::row_not_found(table_name));
        }

        Ok(())
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    async fn connect(&self) -> Result<SqliteConnection> {
        if self.config.create_parent_dirs {
            if let Some(dir) = self.config.parent_dir() {
                std::fs::create_dir_all(dir)?;
            }
        }

        let conn = SqliteConnectOptions::new()
            .filename(&self.config.database_path)
            .create_if_missing(self.config.create_if_missing)
            .foreign_keys(self.config.foreign_keys)
            .connect()
            .await?;

        Ok(conn)
    }

    /// Close the connection, then surface the statement's outcome
    ///
    /// A statement error wins over a close error.
    async fn finish<T>(
        conn: SqliteConnection,
        outcome: std::result::Result<T, sqlx::Error>,
    ) -> Result<T> {
        let closed = conn.close().await;
        let value = outcome?;
        closed?;
        Ok(value)
    }

    async fn execute(&self, statement: &Statement) -> Result<SqliteQueryResult> {
        log::debug!("execute: {}", statement.sql);

        let mut conn = self.connect().await?;
        let outcome = Self::bind_all(sqlx::query(&statement.sql), &statement.params)
            .execute(&mut conn)
            .await;

        Self::finish(conn, outcome).await
    }

    async fn fetch_all(&self, statement: &Statement) -> Result<Vec<SqliteRow>> {
        log::debug!("fetch: {}", statement.sql);

        let mut conn = self.connect().await?;
        let outcome = Self::bind_all(sqlx::query(&statement.sql), &statement.params)
            .fetch_all(&mut conn)
            .await;

        Self::finish(conn, outcome).await
    }

    fn bind_all<'q>(mut query: SqliteQuery<'q>, params: &[Value]) -> SqliteQuery<'q> {
        for value in params {
            query = Self::bind_value(query, value);
        }
        query
    }

    fn bind_value<'q>(query: SqliteQuery<'q>, value: &Value) -> SqliteQuery<'q> {
        match value {
            Value::Null => query.bind(None::<String>),
            Value::Integer(v) => query.bind(*v),
            Value::Real(v) => query.bind(*v),
            Value::Text(v) => query.bind(v.clone()),
            Value::Blob(v) => query.bind(v.clone()),
            Value::Boolean(v) => query.bind(*v),
            Value::Json(v) => query.bind(v.to_string()),
            Value::Timestamp(v) => query.bind(*v),
        }
    }

    /// Rows are selected with columns in metadata order
    fn row_to_record(row: &SqliteRow, metadata: &Metadata) -> Result<Record> {
        let mut record = Record::new();
        for (index, field) in metadata.fields.iter().enumerate() {
            record.set(field.name.clone(), Self::extract_column_value(row, index, field)?);
        }
        Ok(record)
    }

    fn extract_column_value(row: &SqliteRow, index: usize, field: &FieldDefinition) -> Result<Value> {
        let value = match field.field_type {
            FieldType::Integer => row.try_get::<Option<i64>, _>(index)?.map(Value::Integer),
            FieldType::Real => row.try_get::<Option<f64>, _>(index)?.map(Value::Real),
            FieldType::Text => row.try_get::<Option<String>, _>(index)?.map(Value::Text),
            FieldType::Blob => row.try_get::<Option<Vec<u8>>, _>(index)?.map(Value::Blob),
            FieldType::Boolean => row.try_get::<Option<bool>, _>(index)?.map(Value::Boolean),
            FieldType::Json => match row.try_get::<Option<String>, _>(index)? {
                Some(text) => Some(Value::Json(serde_json::from_str(&text)?)),
                None => None,
            },
            FieldType::Timestamp => row
                .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(index)?
                .map(Value::Timestamp),
        };

        Ok(value.unwrap_or(Value::Null))
    }
}
