use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data::filter::FilterCriteria;
use crate::data::loader::{ColumnNames, LoadOptions};
use crate::error::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub filter: FilterCriteria,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Dataset opened at start-up, if any.
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    #[serde(default = "default_exclude_labels")]
    pub exclude_labels: Vec<String>,
    #[serde(default = "default_repair_encoding")]
    pub repair_encoding: bool,
    #[serde(default)]
    pub columns: ColumnNames,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Filter results above this size are randomly sampled down to it; 0 shows every match.
    #[serde(default = "default_sample_cap")]
    pub sample_cap: usize,
    /// Fixed seed for reproducible suggestions; random when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
}

fn default_delimiter() -> char {
    ','
}

fn default_exclude_labels() -> Vec<String> {
    vec!["_PRENOMS_RARES".to_string()]
}

fn default_repair_encoding() -> bool {
    true
}

fn default_sample_cap() -> usize {
    5
}

fn default_search_limit() -> usize {
    20
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: None,
            delimiter: default_delimiter(),
            exclude_labels: default_exclude_labels(),
            repair_encoding: default_repair_encoding(),
            columns: ColumnNames::default(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            sample_cap: default_sample_cap(),
            seed: None,
            search_limit: default_search_limit(),
        }
    }
}

impl DataConfig {
    pub fn load_options(&self) -> Result<LoadOptions, ConfigError> {
        let delimiter = u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| {
                ConfigError::Invalid(format!("delimiter {:?} is not ASCII", self.delimiter))
            })?;
        Ok(LoadOptions {
            columns: self.columns.clone(),
            delimiter,
            exclude_labels: self.exclude_labels.iter().cloned().collect::<BTreeSet<_>>(),
            repair_encoding: self.repair_encoding,
        })
    }
}

impl Config {
    /// Read `explicit` if given, else the per-user file if it exists, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => match Self::config_path() {
                Ok(p) if p.exists() => p,
                _ => return Ok(Self::default()),
            },
        };
        log::debug!("reading config from {}", path.display());
        Self::from_file(&path)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.filter
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.data.load_options()?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let home = std::env::var("HOME").map_err(|_| ConfigError::NoHome)?;
        Ok(PathBuf::from(home).join(".config/name-trends/config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::ZeroBaselinePolicy;
    use crate::data::model::Category;
    use tempfile::Builder;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [filter]
            window = 5
            category = "girl"
            zero_baseline = "exclude"

            [display]
            sample_cap = 8
            "#,
        )
        .unwrap();

        assert_eq!(config.filter.window, 5);
        assert_eq!(config.filter.category, Category::Girl);
        assert_eq!(config.filter.zero_baseline, ZeroBaselinePolicy::Exclude);
        assert_eq!(config.filter.max_count, 100_000);
        assert_eq!(config.display.sample_cap, 8);
        assert_eq!(config.display.search_limit, 20);
        assert_eq!(config.data.columns.label, "preusuel");
        assert_eq!(config.data.exclude_labels, vec!["_PRENOMS_RARES".to_string()]);
    }

    #[test]
    fn test_save_then_load() {
        let dir = Builder::new().tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");

        let mut config = Config::default();
        config.data.delimiter = ';';
        config.filter.recent_activity_years = Some(10);
        config.display.seed = Some(42);

        let written = config.save(Some(&path)).unwrap();
        assert_eq!(written, path);
        assert_eq!(Config::load(Some(&path)).unwrap(), config);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = Builder::new().tempdir().unwrap();
        let path = dir.path().join("config.toml");

        std::fs::write(&path, "[filter]\nwindow = 0\n").unwrap();
        assert!(matches!(Config::load(Some(&path)), Err(ConfigError::Invalid(_))));

        std::fs::write(&path, "[data]\ndelimiter = \"é\"\n").unwrap();
        assert!(matches!(Config::load(Some(&path)), Err(ConfigError::Invalid(_))));

        std::fs::write(&path, "[filter\n").unwrap();
        assert!(matches!(Config::load(Some(&path)), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_options_from_data_config() {
        let options = DataConfig::default().load_options().unwrap();
        assert_eq!(options, LoadOptions::default());
    }
}
