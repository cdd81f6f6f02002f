use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ingest::FailurePolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub store: StoreConfig,
    pub import: ImportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Store file location; only meaningful for the jsonl backend.
    pub path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// In-process only; records do not survive the run. Useful when
    /// importing and reporting in one embedding process.
    Memory,
    /// Append-only JSON-lines file.
    Jsonl,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub on_failure: FailurePolicy,
}

impl AnalyzerConfig {
    /// Load configuration from file or environment variables.
    /// Priority: Environment Variables > Config File > Defaults
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = std::env::var("ANALYZER_CONFIG_FILE")
            .unwrap_or_else(|_| "/etc/lbtrail/analyzer.toml".to_string());

        let mut config = if Path::new(&config_path).exists() {
            tracing::info!("Loading configuration from: {}", config_path);
            Self::from_file(&config_path)?
        } else {
            tracing::debug!(
                "Config file not found at {}, using environment variables",
                config_path
            );
            Self::default()
        };

        if let Ok(backend) = std::env::var("ANALYZER_STORE_BACKEND") {
            config.store.backend = parse_backend(&backend)
                .ok_or_else(|| format!("unknown store backend: {:?}", backend))?;
        }
        if let Ok(path) = std::env::var("ANALYZER_STORE_PATH") {
            config.store.path = path;
        }
        if let Ok(policy) = std::env::var("ANALYZER_IMPORT_ON_FAILURE") {
            config.import.on_failure = policy.parse()?;
        }

        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: AnalyzerConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.store.backend == StoreBackend::Jsonl && self.store.path.is_empty() {
            return Err("store.path must not be empty for the jsonl backend".to_string());
        }
        Ok(())
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            import: ImportConfig::default(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Jsonl,
            path: "analyzer.jsonl".to_string(),
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            on_failure: FailurePolicy::Skip,
        }
    }
}

fn parse_backend(s: &str) -> Option<StoreBackend> {
    match s {
        "memory" => Some(StoreBackend::Memory),
        "jsonl" => Some(StoreBackend::Jsonl),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.store.backend, StoreBackend::Jsonl);
        assert_eq!(config.store.path, "analyzer.jsonl");
        assert_eq!(config.import.on_failure, FailurePolicy::Skip);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_jsonl_requires_path() {
        let mut config = AnalyzerConfig::default();
        config.store.path = String::new();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("store.path"));
    }

    #[test]
    fn test_validate_memory_allows_empty_path() {
        let mut config = AnalyzerConfig::default();
        config.store.backend = StoreBackend::Memory;
        config.store.path = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml() {
        let config: AnalyzerConfig = toml::from_str(
            r#"
            [store]
            backend = "memory"

            [import]
            on_failure = "abort"
            "#,
        )
        .unwrap();
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.import.on_failure, FailurePolicy::Abort);
        // Unset fields keep their defaults.
        assert_eq!(config.store.path, "analyzer.jsonl");
    }

    #[test]
    fn test_parse_backend() {
        assert_eq!(parse_backend("memory"), Some(StoreBackend::Memory));
        assert_eq!(parse_backend("jsonl"), Some(StoreBackend::Jsonl));
        assert_eq!(parse_backend("postgres"), None);
    }
}
