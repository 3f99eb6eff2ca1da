//! SQL Identifier Sanitization Utilities
//!
//! Table and column names are interpolated into DDL and DML text, so every
//! identifier is validated against a safe character set and then quoted.

use regex::Regex;

/// Longest identifier accepted by [`validate_identifier`]
pub const MAX_IDENTIFIER_LEN: usize = 64;

/// SQLite keywords that cannot be used as identifiers
pub const SQLITE_KEYWORDS: &[&str] = &[
    "ABORT",
    "ACTION",
    "ADD",
    "AFTER",
    "ALL",
    "ALTER",
    "ALWAYS",
    "ANALYZE",
    "AND",
    "AS",
    "ASC",
    "ATTACH",
    "AUTOINCREMENT",
    "BEFORE",
    "BEGIN",
    "BETWEEN",
    "BY",
    "CASCADE",
    "CASE",
    "CAST",
    "CHECK",
    "COLLATE",
    "COLUMN",
    "COMMIT",
    "CONFLICT",
    "CONSTRAINT",
    "CREATE",
    "CROSS",
    "CURRENT",
    "CURRENT_DATE",
    "CURRENT_TIME",
    "CURRENT_TIMESTAMP",
    "DATABASE",
    "DEFAULT",
    "DEFERRABLE",
    "DEFERRED",
    "DELETE",
    "DESC",
    "DETACH",
    "DISTINCT",
    "DO",
    "DROP",
    "EACH",
    "ELSE",
    "END",
    "ESCAPE",
    "EXCEPT",
    "EXCLUDE",
    "EXCLUSIVE",
    "EXISTS",
    "EXPLAIN",
    "FAIL",
    "FILTER",
    "FIRST",
    "FOLLOWING",
    "FOR",
    "FOREIGN",
    "FROM",
    "FULL",
    "GENERATED",
    "GLOB",
    "GROUP",
    "GROUPS",
    "HAVING",
    "IF",
    "IGNORE",
    "IMMEDIATE",
    "IN",
    "INDEX",
    "INDEXED",
    "INITIALLY",
    "INNER",
    "INSERT",
    "INSTEAD",
    "INTERSECT",
    "INTO",
    "IS",
    "ISNULL",
    "JOIN",
    "KEY",
    "LAST",
    "LEFT",
    "LIKE",
    "LIMIT",
    "MATCH",
    "MATERIALIZED",
    "NATURAL",
    "NO",
    "NOT",
    "NOTHING",
    "NOTNULL",
    "NULL",
    "NULLS",
    "OF",
    "OFFSET",
    "ON",
    "OR",
    "ORDER",
    "OTHERS",
    "OUTER",
    "OVER",
    "PARTITION",
    "PLAN",
    "PRAGMA",
    "PRECEDING",
    "PRIMARY",
    "QUERY",
    "RAISE",
    "RANGE",
    "RECURSIVE",
    "REFERENCES",
    "REGEXP",
    "REINDEX",
    "RELEASE",
    "RENAME",
    "REPLACE",
    "RESTRICT",
    "RETURNING",
    "RIGHT",
    "ROLLBACK",
    "ROW",
    "ROWS",
    "SAVEPOINT",
    "SELECT",
    "SET",
    "TABLE",
    "TEMP",
    "TEMPORARY",
    "THEN",
    "TIES",
    "TO",
    "TRANSACTION",
    "TRIGGER",
    "UNBOUNDED",
    "UNION",
    "UNIQUE",
    "UPDATE",
    "USING",
    "VACUUM",
    "VALUES",
    "VIEW",
    "VIRTUAL",
    "WHEN",
    "WHERE",
    "WINDOW",
    "WITH",
    "WITHOUT",
];

/// Quote a SQL identifier to make it safe for use in queries
///
/// # Example
/// ```
/// use class_to_sql::sql::quote_identifier;
///
/// let quoted = quote_identifier("my_table");
/// assert_eq!(quoted, "\"my_table\"");
/// ```
pub fn quote_identifier(identifier: &str) -> String {
    // Escape any double quotes in the identifier by doubling them
    let escaped = identifier.replace('"', "\"\"");
    format!("\"{}\"", escaped)
}

/// Validate a table or column name
///
/// Rules:
/// - Must start with an ASCII letter or underscore
/// - Can only contain ASCII letters, digits, and underscores
/// - At most 64 bytes long
/// - Cannot be a SQLite keyword (case-insensitive)
/// - Cannot use the `sqlite_` prefix SQLite keeps for its own tables
///
/// # Example
/// ```
/// use class_to_sql::sql::validate_identifier;
///
/// assert!(validate_identifier("users").is_ok());
/// assert!(validate_identifier("select").is_err()); // keyword
/// assert!(validate_identifier("users; DROP TABLE x").is_err());
/// ```
pub fn validate_identifier(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Identifier cannot be empty".to_string());
    }

    if name.len() > MAX_IDENTIFIER_LEN {
        return Err(format!(
            "Identifier '{}' is longer than {} characters.",
            name, MAX_IDENTIFIER_LEN
        ));
    }

    let re = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").map_err(|e| e.to_string())?;
    if !re.is_match(name) {
        return Err(format!(
            "Identifier '{}' is invalid. Must start with a letter or underscore and contain only letters, digits, and underscores.",
            name
        ));
    }

    let upper = name.to_ascii_uppercase();
    if SQLITE_KEYWORDS.contains(&upper.as_str()) {
        return Err(format!(
            "Identifier '{}' is a SQLite keyword and cannot be used.",
            name
        ));
    }

    if upper.starts_with("SQLITE_") {
        return Err(format!(
            "Identifier '{}' uses the reserved 'sqlite_' prefix.",
            name
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // quote_identifier Tests
    // =========================================================================

    #[test]
    fn test_quote_identifier_simple() {
        assert_eq!(quote_identifier("users"), "\"users\"");
        assert_eq!(quote_identifier("a"), "\"a\"");
    }

    #[test]
    fn test_quote_identifier_with_quotes() {
        assert_eq!(
            quote_identifier("table\"with\"quotes"),
            "\"table\"\"with\"\"quotes\""
        );
    }

    // =========================================================================
    // validate_identifier Valid Cases
    // =========================================================================

    #[test]
    fn test_validate_identifier_valid() {
        assert!(validate_identifier("users").is_ok());
        assert!(validate_identifier("my_table_123").is_ok());
        assert!(validate_identifier("_private").is_ok());
        assert!(validate_identifier("CamelCase").is_ok());
        assert!(validate_identifier("x").is_ok());
    }

    #[test]
    fn test_validate_identifier_non_keywords() {
        // Common column names that are not SQLite keywords
        assert!(validate_identifier("id").is_ok());
        assert!(validate_identifier("name").is_ok());
        assert!(validate_identifier("user").is_ok());
        assert!(validate_identifier("super").is_ok());
    }

    #[test]
    fn test_validate_identifier_max_length() {
        let name = "a".repeat(MAX_IDENTIFIER_LEN);
        assert!(validate_identifier(&name).is_ok());

        let name = "a".repeat(MAX_IDENTIFIER_LEN + 1);
        assert!(validate_identifier(&name).is_err());
    }

    // =========================================================================
    // validate_identifier Invalid Cases
    // =========================================================================

    #[test]
    fn test_validate_identifier_empty() {
        let result = validate_identifier("");
        assert!(result.unwrap_err().contains("cannot be empty"));
    }

    #[test]
    fn test_validate_identifier_starts_with_digit() {
        assert!(validate_identifier("1users").is_err());
        assert!(validate_identifier("0abc").is_err());
    }

    #[test]
    fn test_validate_identifier_punctuation() {
        assert!(validate_identifier("my-table").is_err());
        assert!(validate_identifier("schema.table").is_err());
        assert!(validate_identifier("my table").is_err());
        assert!(validate_identifier("name\"").is_err());
        assert!(validate_identifier("users; DROP TABLE users").is_err());
    }

    #[test]
    fn test_validate_identifier_non_ascii() {
        assert!(validate_identifier("tëst").is_err());
        assert!(validate_identifier("日本語").is_err());
    }

    #[test]
    fn test_validate_identifier_keywords() {
        let result = validate_identifier("select");
        assert!(result.unwrap_err().contains("keyword"));

        assert!(validate_identifier("TABLE").is_err());
        assert!(validate_identifier("Order").is_err());
        assert!(validate_identifier("key").is_err());
        assert!(validate_identifier("primary").is_err());
    }

    #[test]
    fn test_validate_identifier_sqlite_prefix() {
        assert!(validate_identifier("sqlite_master").is_err());
        assert!(validate_identifier("SQLITE_sequence").is_err());
        assert!(validate_identifier("sqlitex").is_ok());
    }

    #[test]
    fn test_keywords_are_uppercase() {
        assert!(
            SQLITE_KEYWORDS
                .iter()
                .all(|k| k.chars().all(|c| c.is_ascii_uppercase() || c == '_'))
        );
    }
}
