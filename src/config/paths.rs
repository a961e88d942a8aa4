//! Path management for Tally
//!
//! Resolves every file location: the shared base directory holding the
//! settings and book catalog, and one directory per book.
//!
//! ## Path Resolution Order
//!
//! 1. `TALLY_DATA_DIR` environment variable (if set)
//! 2. `$XDG_CONFIG_HOME/tally`
//! 3. The platform config directory (`~/.config/tally`, `%APPDATA%\tally`, ...)

use std::path::{Path, PathBuf};

use crate::error::TallyError;
use crate::models::BookId;

/// Environment variable overriding the base directory
pub const DATA_DIR_ENV: &str = "TALLY_DATA_DIR";

/// Manages all paths used by Tally
#[derive(Debug, Clone)]
pub struct TallyPaths {
    /// Base directory for all Tally data
    base_dir: PathBuf,
}

impl TallyPaths {
    /// Create a new TallyPaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if no base directory can be determined.
    pub fn new() -> Result<Self, TallyError> {
        let base_dir = match std::env::var_os(DATA_DIR_ENV) {
            Some(custom) if !custom.is_empty() => PathBuf::from(custom),
            _ => resolve_default_path()?,
        };

        Ok(Self { base_dir })
    }

    /// Create TallyPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to the book catalog
    pub fn catalog_file(&self) -> PathBuf {
        self.base_dir.join("books.json")
    }

    /// Get the path to the registry audit log
    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    /// Directory holding one subdirectory per book
    pub fn books_dir(&self) -> PathBuf {
        self.base_dir.join("books")
    }

    /// Paths of a single book
    pub fn book(&self, id: BookId) -> BookPaths {
        BookPaths::new(self.books_dir().join(id.as_uuid().to_string()))
    }

    /// Ensure the base and books directories exist
    pub fn ensure_directories(&self) -> Result<(), TallyError> {
        std::fs::create_dir_all(self.books_dir())
            .map_err(|e| {
                TallyError::StorageUnavailable(format!(
                    "Failed to create data directory {}: {}",
                    self.books_dir().display(),
                    e
                ))
            })?;
        Ok(())
    }

    /// Check if Tally has been initialized (catalog file exists)
    pub fn is_initialized(&self) -> bool {
        self.catalog_file().exists()
    }
}

/// File locations inside one book's storage directory
#[derive(Debug, Clone)]
pub struct BookPaths {
    dir: PathBuf,
}

impl BookPaths {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn accounts_file(&self) -> PathBuf {
        self.dir.join("accounts.json")
    }

    /// Transactions and their splits
    pub fn transactions_file(&self) -> PathBuf {
        self.dir.join("transactions.json")
    }

    /// Budgets and their amounts
    pub fn budgets_file(&self) -> PathBuf {
        self.dir.join("budgets.json")
    }

    pub fn audit_log(&self) -> PathBuf {
        self.dir.join("audit.log")
    }

    /// Whether the book's directory holds initialized storage
    pub fn is_initialized(&self) -> bool {
        self.accounts_file().exists()
    }
}

fn resolve_default_path() -> Result<PathBuf, TallyError> {
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(xdg).join("tally"));
    }

    directories::BaseDirs::new()
        .map(|dirs| dirs.config_dir().join("tally"))
        .ok_or_else(|| TallyError::Config("Could not determine a config directory".into()))
}
