//! Configuration management for mailtriage
//!
//! Loads, validates and saves the TOML configuration. Every section has defaults,
//! so a missing config file yields a working setup with the built-in taxonomy.

use crate::error::{Result, TriageError};
use crate::patterns::PatternsConfig;
use crate::routing::DEFAULT_URGENCY_KEYWORDS;
use crate::taxonomy::Taxonomy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

mod validator;

pub use validator::ConfigValidator;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub patterns: PatternsConfig,
    #[serde(default)]
    pub taxonomy: Taxonomy,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Which files in the input directory are messages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// File extension without the dot
    pub extension: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            extension: "eml".to_string(),
        }
    }
}

/// Output locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// JSON array of routing results
    pub results_file: PathBuf,
    /// Append-only classification decision log
    pub audit_log: PathBuf,
    /// Optional application log file (in addition to the console)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_file: PathBuf::from("results.json"),
            audit_log: PathBuf::from("classification_log.txt"),
            log_file: None,
        }
    }
}

/// Record store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database: PathBuf,
    pub pool_size: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("~/.mailtriage/records.sqlite"),
            pool_size: 16,
        }
    }
}

/// Orchestrator configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Phase-2 worker count; 0 means available parallelism
    #[serde(default)]
    pub workers: usize,
    /// Bounded wait for each phase-1 collaborator call, e.g. "30s" or "500ms"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collaborator_timeout: Option<String>,
}

impl PipelineConfig {
    /// Effective worker pool size
    pub fn worker_count(&self) -> usize {
        if self.workers > 0 {
            self.workers
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }

    /// Parsed collaborator timeout, if configured
    pub fn timeout(&self) -> Result<Option<Duration>> {
        self.collaborator_timeout
            .as_deref()
            .map(|s| {
                parse_duration(s).ok_or_else(|| TriageError::InvalidConfigValue {
                    path: "pipeline.collaborator_timeout".to_string(),
                    message: format!("Invalid duration: {}", s),
                })
            })
            .transpose()
    }
}

/// Priority scoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub urgency_keywords: Vec<String>,
    /// Base priority for categories missing from the taxonomy
    pub default_priority: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            urgency_keywords: DEFAULT_URGENCY_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            default_priority: 1,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(TriageError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| TriageError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        // Apply environment variable overrides
        config.apply_env_overrides();

        // Validate configuration
        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| TriageError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: MAILTRIAGE_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        for (key, value) in std::env::vars() {
            if let Some(config_key) = key.strip_prefix("MAILTRIAGE_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "PIPELINE__WORKERS" => {
                self.pipeline.workers =
                    value.parse().map_err(|_| TriageError::InvalidConfigValue {
                        path: path.to_string(),
                        message: format!("Cannot parse '{}' as integer", value),
                    })?;
            }
            "PIPELINE__COLLABORATOR_TIMEOUT" => {
                self.pipeline.collaborator_timeout = Some(value.to_string());
            }
            "STORAGE__DATABASE" => {
                self.storage.database = PathBuf::from(value);
            }
            "OUTPUT__RESULTS_FILE" => {
                self.output.results_file = PathBuf::from(value);
            }
            "OUTPUT__AUDIT_LOG" => {
                self.output.audit_log = PathBuf::from(value);
            }
            "OUTPUT__LOG_FILE" => {
                self.output.log_file = Some(PathBuf::from(value));
            }
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| TriageError::Config("Cannot determine config directory".to_string()))?;

        Ok(config_dir.join("mailtriage").join("config.toml"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meta: MetaConfig {
                schema_version: "1.0.0".to_string(),
                created_at: current_timestamp(),
            },
            input: InputConfig::default(),
            output: OutputConfig::default(),
            storage: StorageConfig::default(),
            pipeline: PipelineConfig::default(),
            scoring: ScoringConfig::default(),
            patterns: PatternsConfig::default(),
            taxonomy: Taxonomy::default(),
        }
    }
}

/// Parse duration strings such as "500ms", "30s", "2m" or a bare number of seconds
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();

    // Check "ms" before "s" because "ms" ends with "s"
    if let Some(ms) = s.strip_suffix("ms") {
        ms.trim().parse().ok().map(Duration::from_millis)
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.trim().parse().ok().map(Duration::from_secs)
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.trim()
            .parse::<u64>()
            .ok()
            .map(|m| Duration::from_secs(m * 60))
    } else {
        s.parse().ok().map(Duration::from_secs)
    }
}

/// Expand a leading `~/` to the home directory
pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("5s"), Some(Duration::from_secs(5)));
        assert_eq!(parse_duration("250ms"), Some(Duration::from_millis(250)));
        assert_eq!(parse_duration("2m"), Some(Duration::from_secs(120)));
        assert_eq!(parse_duration("7"), Some(Duration::from_secs(7)));
        assert_eq!(parse_duration("soon"), None);
        assert_eq!(parse_duration(""), None);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut config = Config::default();
        config.pipeline.workers = 3;
        config.pipeline.collaborator_timeout = Some("10s".to_string());
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.pipeline.collaborator_timeout.as_deref(), Some("10s"));
        assert_eq!(loaded.taxonomy, Taxonomy::default());
        assert_eq!(loaded.patterns, PatternsConfig::default());
        assert_eq!(loaded.input.extension, "eml");
    }

    #[test]
    fn test_minimal_file_uses_section_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[_meta]\nschema_version = \"1.0.0\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.output.results_file, PathBuf::from("results.json"));
        assert_eq!(config.scoring.urgency_keywords, vec!["urgent", "immediate"]);
        assert_eq!(config.taxonomy.categories.len(), 3);
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = Config::load(Path::new("/nonexistent/mailtriage.toml")).unwrap_err();
        assert!(matches!(err, TriageError::ConfigNotFound { .. }));
    }

    #[test]
    fn test_worker_count_defaults_to_parallelism() {
        let config = PipelineConfig::default();
        assert!(config.worker_count() >= 1);

        let config = PipelineConfig {
            workers: 2,
            collaborator_timeout: None,
        };
        assert_eq!(config.worker_count(), 2);
    }

    #[test]
    fn test_timeout_parsing() {
        let mut config = PipelineConfig::default();
        assert_eq!(config.timeout().unwrap(), None);

        config.collaborator_timeout = Some("1500ms".to_string());
        assert_eq!(config.timeout().unwrap(), Some(Duration::from_millis(1500)));

        config.collaborator_timeout = Some("later".to_string());
        assert!(config.timeout().is_err());
    }

    #[test]
    fn test_expand_tilde() {
        let plain = Path::new("/var/data/records.sqlite");
        assert_eq!(expand_tilde(plain), plain.to_path_buf());

        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                expand_tilde(Path::new("~/.mailtriage/records.sqlite")),
                home.join(".mailtriage/records.sqlite")
            );
        }
    }
}
