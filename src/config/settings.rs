//! User settings for Tally
//!
//! Persisted as `config.json` in the base directory. Every field has a serde
//! default so older or hand-edited files keep loading.

use serde::{Deserialize, Serialize};

use super::paths::TallyPaths;
use crate::error::TallyError;
use crate::models::Commodity;
use crate::storage::file_io::write_json_atomic;

/// User settings for Tally
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Commodity of the root account of newly created books
    #[serde(default)]
    pub default_commodity: Commodity,

    /// Period count for budgets whose recurrence never ends
    #[serde(default = "default_budget_period_fallback")]
    pub budget_period_fallback: u32,

    /// Date format preference (strftime format)
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// `tracing` filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_schema_version() -> u32 {
    1
}

fn default_budget_period_fallback() -> u32 {
    12
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

fn default_log_filter() -> String {
    "tally=warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            default_commodity: Commodity::default(),
            budget_period_fallback: default_budget_period_fallback(),
            date_format: default_date_format(),
            log_filter: default_log_filter(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or return defaults if the file doesn't exist
    pub fn load_or_create(paths: &TallyPaths) -> Result<Self, TallyError> {
        let settings_path = paths.settings_file();

        if !settings_path.exists() {
            // Don't save yet - let caller decide when to persist
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(&settings_path)
            .map_err(|e| {
                TallyError::StorageUnavailable(format!("Failed to read settings file: {}", e))
            })?;

        let settings: Settings = serde_json::from_str(&contents)
            .map_err(|e| TallyError::Config(format!("Failed to parse settings file: {}", e)))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to disk
    pub fn save(&self, paths: &TallyPaths) -> Result<(), TallyError> {
        self.validate()?;
        paths.ensure_directories()?;
        write_json_atomic(paths.settings_file(), self)
    }

    fn validate(&self) -> Result<(), TallyError> {
        if self.budget_period_fallback == 0 {
            return Err(TallyError::Config(
                "budget_period_fallback must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.default_commodity, Commodity::usd());
        assert_eq!(settings.budget_period_fallback, 12);
        assert_eq!(settings.log_filter, "tally=warn");
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = TallyPaths::with_base_dir(temp_dir.path().to_path_buf());

        let settings = Settings {
            default_commodity: Commodity::eur(),
            budget_period_fallback: 6,
            ..Settings::default()
        };
        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let paths = TallyPaths::with_base_dir(temp_dir.path().to_path_buf());
        std::fs::write(paths.settings_file(), r#"{"budget_period_fallback": 24}"#).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.budget_period_fallback, 24);
        assert_eq!(loaded.default_commodity, Commodity::usd());
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let paths = TallyPaths::with_base_dir(temp_dir.path().to_path_buf());
        std::fs::write(paths.settings_file(), "not json").unwrap();

        assert!(matches!(
            Settings::load_or_create(&paths),
            Err(TallyError::Config(_))
        ));

        std::fs::write(paths.settings_file(), r#"{"budget_period_fallback": 0}"#).unwrap();
        assert!(matches!(
            Settings::load_or_create(&paths),
            Err(TallyError::Config(_))
        ));
    }

    #[test]
    fn test_unreadable_file_is_storage_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let paths = TallyPaths::with_base_dir(temp_dir.path().to_path_buf());
        std::fs::create_dir(paths.settings_file()).unwrap();

        assert!(matches!(
            Settings::load_or_create(&paths),
            Err(TallyError::StorageUnavailable(_))
        ));
    }
}
