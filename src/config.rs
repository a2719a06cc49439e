// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{PipelineError, Result};
use crate::utils::Validator;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Settings for one import run. Every field has a default so a partial
/// file or environment overlay is merged over the built-in values.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub source_directory: PathBuf,
    pub file_patterns: Vec<String>,
    pub batch_size: usize,
    pub max_retries: u32,
    pub enable_logging: bool,
    pub skip_existing: bool,
    pub validation_strict: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_directory: PathBuf::from("./scraped"),
            file_patterns: vec!["*.html".to_string(), "*.js".to_string()],
            batch_size: 10,
            max_retries: 3,
            enable_logging: true,
            skip_existing: true,
            validation_strict: false,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        Validator::validate_batch_size(self.batch_size)?;

        if self.file_patterns.is_empty() {
            return Err(PipelineError::Config(
                "at least one file pattern is required".to_string(),
            ));
        }

        if self.file_patterns.iter().any(|p| p.trim().is_empty()) {
            return Err(PipelineError::Config(
                "file patterns must not be blank".to_string(),
            ));
        }

        if self.source_directory.as_os_str().is_empty() {
            return Err(PipelineError::Config(
                "source_directory must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/brokers.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub log_export_path: Option<PathBuf>,
    pub colored: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            log_export_path: None,
            colored: true,
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder.add_source(
                config::File::from(Path::new("config/default.toml")).required(false),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix("BROKER_IMPORT")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("pipeline.file_patterns")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        self.pipeline.validate()?;

        if self.store.path.as_os_str().is_empty() {
            return Err(PipelineError::Config(
                "store.path must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.pipeline.batch_size, 10);
        assert!(config.pipeline.skip_existing);
        assert!(!config.pipeline.validation_strict);
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let config = PipelineConfig {
            batch_size: 0,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_patterns_rejected() {
        let config = PipelineConfig {
            file_patterns: vec![],
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_file_merges_over_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("import.toml");
        std::fs::write(
            &path,
            "[pipeline]\nbatch_size = 5\nvalidation_strict = true\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();

        assert_eq!(config.pipeline.batch_size, 5);
        assert!(config.pipeline.validation_strict);
        assert_eq!(
            config.pipeline.file_patterns,
            PipelineConfig::default().file_patterns
        );
        assert_eq!(config.store.path, PathBuf::from("data/brokers.json"));
    }
}
