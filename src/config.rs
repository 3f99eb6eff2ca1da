//! Configuration for TableStore
//!
//! Provides a builder pattern for configuring where and how the SQLite
//! database file is opened.

use std::path::{Path, PathBuf};

/// Environment variable consulted by [`StoreConfig::from_env`]
pub const DB_PATH_ENV: &str = "CLASS_TO_SQL_DB";

/// Database path used when the environment variable is unset
pub const DEFAULT_DB_PATH: &str = "db/peppermint.db";

/// Configuration for the table store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path of the SQLite database file
    pub database_path: PathBuf,
    /// Create the database file when it does not exist (default: true)
    pub create_if_missing: bool,
    /// Create the parent directory of the database file (default: true)
    pub create_parent_dirs: bool,
    /// Enforce foreign key constraints (default: false)
    pub foreign_keys: bool,
}

impl StoreConfig {
    /// Create a new configuration builder
    pub fn builder(database_path: impl Into<PathBuf>) -> StoreConfigBuilder {
        StoreConfigBuilder::new(database_path)
    }

    /// Resolve the database path from `CLASS_TO_SQL_DB`
    ///
    /// Falls back to `db/peppermint.db` relative to the working directory.
    pub fn from_env() -> Self {
        Self::from_env_var(DB_PATH_ENV)
    }

    /// Resolve the database path from the named environment variable
    pub fn from_env_var(var: &str) -> Self {
        let path = match std::env::var(var) {
            Ok(value) if !value.trim().is_empty() => expand_home(value.trim()),
            _ => PathBuf::from(DEFAULT_DB_PATH),
        };
        log::debug!("database path resolved to {}", path.display());
        StoreConfigBuilder::new(path).build()
    }
}

/// Expand a leading `~` to the user's home directory
fn expand_home(value: &str) -> PathBuf {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    match (value.strip_prefix('~'), home) {
        (Some(""), Some(home)) => home,
        (Some(rest), Some(home)) if rest.starts_with('/') => home.join(&rest[1..]),
        _ => PathBuf::from(value),
    }
}

/// Builder for StoreConfig
#[derive(Debug)]
pub struct StoreConfigBuilder {
    database_path: PathBuf,
    create_if_missing: bool,
    create_parent_dirs: bool,
    foreign_keys: bool,
}

impl StoreConfigBuilder {
    /// Create a new builder with the database path
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
            create_if_missing: true,
            create_parent_dirs: true,
            foreign_keys: false,
        }
    }

    /// Create the database file if it is missing (default: true)
    pub fn create_if_missing(mut self, enabled: bool) -> Self {
        self.create_if_missing = enabled;
        self
    }

    /// Create the parent directory of the database file (default: true)
    pub fn create_parent_dirs(mut self, enabled: bool) -> Self {
        self.create_parent_dirs = enabled;
        self
    }

    /// Enable or disable `PRAGMA foreign_keys` (default: false)
    pub fn foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }

    /// Build the configuration
    pub fn build(self) -> StoreConfig {
        StoreConfig {
            database_path: self.database_path,
            create_if_missing: self.create_if_missing,
            create_parent_dirs: self.create_parent_dirs,
            foreign_keys: self.foreign_keys,
        }
    }
}

impl StoreConfig {
    /// Parent directory of the database file, if it has a non-empty one
    pub fn parent_dir(&self) -> Option<&Path> {
        self.database_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Builder Defaults
    // =========================================================================

    #[test]
    fn test_default_config() {
        let config = StoreConfig::builder("/tmp/test.db").build();

        assert_eq!(config.database_path, PathBuf::from("/tmp/test.db"));
        assert!(config.create_if_missing);
        assert!(config.create_parent_dirs);
        assert!(!config.foreign_keys);
    }

    #[test]
    fn test_builder_accepts_pathbuf() {
        let config = StoreConfig::builder(PathBuf::from("data/app.db")).build();
        assert_eq!(config.database_path, PathBuf::from("data/app.db"));
    }

    #[test]
    fn test_full_custom_config() {
        let config = StoreConfig::builder("/tmp/test.db")
            .create_if_missing(false)
            .create_parent_dirs(false)
            .foreign_keys(true)
            .build();

        assert!(!config.create_if_missing);
        assert!(!config.create_parent_dirs);
        assert!(config.foreign_keys);
    }

    // =========================================================================
    // Environment Resolution
    // =========================================================================

    #[test]
    fn test_from_env_var_unset_uses_default() {
        let config = StoreConfig::from_env_var("CLASS_TO_SQL_TEST_UNSET_VARIABLE");
        assert_eq!(config.database_path, PathBuf::from(DEFAULT_DB_PATH));
    }

    #[test]
    fn test_expand_home() {
        let Some(home) = std::env::var_os("HOME").map(PathBuf::from) else {
            return;
        };
        assert_eq!(expand_home("~/x/y.db"), home.join("x/y.db"));
        assert_eq!(expand_home("~"), home);
        assert_eq!(expand_home("/abs/y.db"), PathBuf::from("/abs/y.db"));
        assert_eq!(expand_home("~other/y.db"), PathBuf::from("~other/y.db"));
    }

    #[test]
    fn test_parent_dir() {
        let config = StoreConfig::builder("db/peppermint.db").build();
        assert_eq!(config.parent_dir(), Some(Path::new("db")));

        let config = StoreConfig::builder("peppermint.db").build();
        assert_eq!(config.parent_dir(), None);
    }
}
