//! SQL utilities for the table store
//!
//! Provides DDL and DML generation plus identifier sanitization.

pub mod ddl;
pub mod dml;
pub mod sanitize;

pub use ddl::DdlGenerator;
pub use dml::{
    Statement, build_delete_by_key, build_insert, build_select_all, build_select_by_key,
    build_update_by_key, check_record_columns,
};
pub use sanitize::{SQLITE_KEYWORDS, quote_identifier, validate_identifier};
