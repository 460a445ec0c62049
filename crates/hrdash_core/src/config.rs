use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

// ---------------------------------------------------------------------------
// HrdashConfig
// ---------------------------------------------------------------------------

/// Application configuration stored at `~/.hrdash/config.json`.
///
/// Missing fields fall back to their defaults, so older files keep loading
/// as new settings are added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HrdashConfig {
    /// Where exported files are written. `None` means `~/.hrdash/exports`.
    pub output_dir: Option<PathBuf>,

    // Workbook metadata
    pub author: String,
    pub subject: String,
    pub column_width: f64,

    // Print document
    pub print_date_format: String,

    // General
    pub log_level: String,
}

impl Default for HrdashConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            author: "HR Dashboard".into(),
            subject: "Report data".into(),
            column_width: 20.0,
            print_date_format: "%d.%m.%Y %H:%M".into(),
            log_level: "info".into(),
        }
    }
}

impl HrdashConfig {
    /// Returns the base config directory: `~/.hrdash/`
    pub fn base_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".hrdash"))
    }

    /// Returns the config file path: `~/.hrdash/config.json`
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("config.json"))
    }

    /// Returns the logs directory: `~/.hrdash/logs/`
    pub fn logs_dir() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("logs"))
    }

    /// Returns the default export directory: `~/.hrdash/exports/`
    pub fn default_exports_dir() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("exports"))
    }

    /// The configured export directory, or the default one.
    pub fn exports_dir(&self) -> Result<PathBuf> {
        match &self.output_dir {
            Some(dir) => Ok(dir.clone()),
            None => Self::default_exports_dir(),
        }
    }

    /// Ensures all required directories exist.
    pub fn ensure_dirs() -> Result<()> {
        let dirs = [Self::base_dir()?, Self::logs_dir()?];
        for dir in &dirs {
            if !dir.exists() {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
            }
        }
        Ok(())
    }

    /// Loads config from disk, or creates default if missing.
    pub fn load() -> Result<Self> {
        Self::ensure_dirs()?;
        let path = Self::config_path()?;
        Self::load_from_path(&path)
    }

    /// Load config from a specific file path.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let config: Self = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            info!("Loaded config from {}", path.display());
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to_path(path)?;
            info!("Created default config at {}", path.display());
            Ok(config)
        }
    }

    /// Save config to a specific file path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = HrdashConfig::default();
        assert_eq!(config.author, "HR Dashboard");
        assert_eq!(config.column_width, 20.0);
        assert_eq!(config.log_level, "info");
        assert!(config.output_dir.is_none());
    }

    #[test]
    fn test_load_from_missing_path_creates_default() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("config.json");

        let config = HrdashConfig::load_from_path(&path).unwrap();
        assert_eq!(config, HrdashConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");

        let config = HrdashConfig {
            output_dir: Some(tmp.path().join("out")),
            author: "People Ops".into(),
            column_width: 28.5,
            ..HrdashConfig::default()
        };
        config.save_to_path(&path).unwrap();

        let loaded = HrdashConfig::load_from_path(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults_for_missing_fields() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, r#"{"author": "Finance"}"#).unwrap();

        let config = HrdashConfig::load_from_path(&path).unwrap();
        assert_eq!(config.author, "Finance");
        assert_eq!(config.subject, "Report data");
        assert_eq!(config.print_date_format, "%d.%m.%Y %H:%M");
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = HrdashConfig::load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn test_exports_dir_prefers_configured_value() {
        let config = HrdashConfig {
            output_dir: Some(PathBuf::from("/tmp/reports")),
            ..HrdashConfig::default()
        };
        assert_eq!(config.exports_dir().unwrap(), PathBuf::from("/tmp/reports"));
    }
}
