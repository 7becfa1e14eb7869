//! Configuration management
//!
//! settings.json in the tally directory:
//! ```json
//! {
//!   "import": { "delimiter": ",", "keepSourceFile": false }
//! }
//! ```

use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::result::Error;
use crate::services::ImportOptions;

const SETTINGS_FILE: &str = "settings.json";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    import: ImportSettings,
}

/// CSV import settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSettings {
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    #[serde(default)]
    pub keep_source_file: bool,
}

fn default_delimiter() -> String {
    ",".to_string()
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            keep_source_file: false,
        }
    }
}

/// Tally configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub import: ImportSettings,
}

impl Config {
    /// Load config from the tally directory
    ///
    /// A missing or unreadable settings file yields defaults. The
    /// TALLY_KEEP_IMPORT_FILE environment variable overrides keepSourceFile.
    pub fn load(tally_dir: &Path) -> Result<Self> {
        let raw = read_settings(tally_dir)?;

        let mut import = raw.import;
        import.keep_source_file = parse_flag(
            std::env::var("TALLY_KEEP_IMPORT_FILE").ok().as_deref(),
            import.keep_source_file,
        );

        Ok(Self { import })
    }

    /// Import options for the import service
    pub fn import_options(&self) -> crate::domain::result::Result<ImportOptions> {
        let delimiter = match self.import.delimiter.as_bytes() {
            [byte] => *byte,
            _ => {
                return Err(Error::config(format!(
                    "Import delimiter must be a single ASCII character, got '{}'",
                    self.import.delimiter
                )))
            }
        };

        Ok(ImportOptions {
            delimiter,
            keep_source_file: self.import.keep_source_file,
        })
    }
}

fn read_settings(tally_dir: &Path) -> Result<SettingsFile> {
    let settings_path = tally_dir.join(SETTINGS_FILE);
    if !settings_path.exists() {
        return Ok(SettingsFile::default());
    }
    let content = std::fs::read_to_string(&settings_path)?;
    Ok(serde_json::from_str(&content).unwrap_or_default())
}

fn parse_flag(value: Option<&str>, default: bool) -> bool {
    match value {
        Some("true" | "1" | "yes" | "TRUE" | "YES") => true,
        Some("false" | "0" | "no" | "FALSE" | "NO") => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_without_settings_file() {
        let dir = tempdir().unwrap();
        let raw = read_settings(dir.path()).unwrap();
        assert_eq!(raw.import, ImportSettings::default());

        let options = Config::default().import_options().unwrap();
        assert_eq!(options.delimiter, b',');
        assert!(!options.keep_source_file);
    }

    #[test]
    fn test_malformed_settings_fall_back_to_defaults() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE), "{ not json").unwrap();

        let raw = read_settings(dir.path()).unwrap();
        assert_eq!(raw.import.delimiter, ",");
    }

    #[test]
    fn test_load_reads_import_settings() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{ "theme": "dark", "import": { "delimiter": ";" } }"#,
        )
        .unwrap();

        let raw = read_settings(dir.path()).unwrap();
        assert_eq!(raw.import.delimiter, ";");
        assert!(!raw.import.keep_source_file);
    }

    #[test]
    fn test_invalid_delimiter() {
        let mut config = Config::default();
        config.import.delimiter = "::".to_string();
        assert!(matches!(config.import_options(), Err(Error::Config(_))));
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag(Some("1"), false));
        assert!(!parse_flag(Some("no"), true));
        assert!(parse_flag(Some("maybe"), true));
        assert!(!parse_flag(None, false));
    }
}
