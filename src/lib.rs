//! # class-to-sql
//!
//! Metadata-driven SQLite tables.
//!
//! A [`Metadata`] value lists a table's fields in column order with their
//! type tags, an ordered composite primary key, and default values for
//! fields a record may leave out. [`TableStore`] turns that metadata into a
//! `CREATE TABLE IF NOT EXISTS` statement and writes records into the table
//! with parameterized statements.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use class_to_sql::{FieldType, Metadata, Record, StoreConfig, TableStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = TableStore::new(StoreConfig::builder("db/example.db").build());
//!
//!     let meta = Metadata::builder()
//!         .field("id", FieldType::Integer)
//!         .field("name", FieldType::Text)
//!         .primary_key(["id"])
//!         .default_value("name", "unknown")
//!         .build();
//!
//!     store.create_table("users", &meta).await?;
//!     store
//!         .insert_row("users", &Record::new().with("id", 1).with("name", "Alice"), &meta)
//!         .await?;
//!     store.insert_row("users", &Record::new().with("id", 2), &meta).await?;
//!
//!     let bob = store
//!         .read_row("users", &Record::new().with("id", 2), &meta)
//!         .await?;
//!     assert_eq!(bob.and_then(|r| r.get("name").cloned()), Some("unknown".into()));
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! The database file is given explicitly through [`StoreConfig`]:
//!
//! ```rust
//! use class_to_sql::StoreConfig;
//!
//! let config = StoreConfig::builder("db/peppermint.db")
//!     .create_if_missing(true)   // Create the file if absent (default)
//!     .create_parent_dirs(true)  // Create db/ if absent (default)
//!     .foreign_keys(false)       // PRAGMA foreign_keys (default off)
//!     .build();
//! ```
//!
//! [`StoreConfig::from_env`] reads the path from `CLASS_TO_SQL_DB` instead,
//! falling back to `db/peppermint.db`.
//!
//! ## Identifiers
//!
//! Table and column names are interpolated into SQL text, so they are
//! checked against a safe character set and the SQLite keyword list, then
//! quoted. Values are always bound as parameters.

pub mod config;
pub mod error;
pub mod metadata;
pub mod record;
pub mod sql;
pub mod store;
pub mod types;

// Re-export main types for convenience
pub use config::{StoreConfig, StoreConfigBuilder};
pub use error::{Result, TableStoreError};
pub use metadata::{FieldDefinition, Metadata, MetadataBuilder};
pub use record::Record;
pub use store::TableStore;
pub use types::{FieldType, Value};

// Re-export SQL utilities for advanced users
pub use sql::ddl::DdlGenerator;
pub use sql::sanitize::{quote_identifier, validate_identifier};
