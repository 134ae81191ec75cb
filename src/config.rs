//! Configuration management for the prediction service.

use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Deployment variant selecting how many model pipelines are served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ServiceVariant {
    /// One scaler/classifier pair; response carries a single result.
    #[default]
    Single,
    /// Independent "flag" and "source" pipelines over the same input.
    Dual,
}

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub models: ModelsConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
}

/// Model artifact configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    /// Deployment variant: "single" or "dual"
    #[serde(default)]
    pub variant: ServiceVariant,
    /// Number of threads for ONNX inference per model (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
    /// Artifact paths for the single variant
    pub single: Option<BundlePaths>,
    /// Artifact paths for the dual variant
    pub dual: Option<DualPaths>,
}

/// On-disk locations of one fitted scaler/classifier pair.
#[derive(Debug, Clone, Deserialize)]
pub struct BundlePaths {
    pub classifier: PathBuf,
    pub scaler: PathBuf,
}

/// Artifact paths for the dual variant: each pipeline carries its own
/// scaler and classifier.
#[derive(Debug, Clone, Deserialize)]
pub struct DualPaths {
    pub flag: BundlePaths,
    pub source: BundlePaths,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

fn default_onnx_threads() -> usize {
    1
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
            },
            models: ModelsConfig {
                variant: ServiceVariant::Single,
                onnx_threads: 1,
                single: Some(BundlePaths {
                    classifier: PathBuf::from("models/classifier.onnx"),
                    scaler: PathBuf::from("models/scaler.json"),
                }),
                dual: None,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.models.variant, ServiceVariant::Single);
        assert!(config.models.single.is_some());
        assert!(config.models.dual.is_none());
    }

    #[test]
    fn test_variant_parsing() {
        let single: ServiceVariant = serde_json::from_value(serde_json::json!("single")).unwrap();
        let dual: ServiceVariant = serde_json::from_value(serde_json::json!("dual")).unwrap();
        assert_eq!(single, ServiceVariant::Single);
        assert_eq!(dual, ServiceVariant::Dual);
    }

    #[test]
    fn test_dual_paths_deserialization() {
        let models: ModelsConfig = serde_json::from_value(serde_json::json!({
            "variant": "dual",
            "dual": {
                "flag": { "classifier": "models/flag.onnx", "scaler": "models/flag_scaler.json" },
                "source": { "classifier": "models/source.onnx", "scaler": "models/source_scaler.json" }
            }
        }))
        .unwrap();

        assert_eq!(models.variant, ServiceVariant::Dual);
        assert_eq!(models.onnx_threads, 1);
        let dual = models.dual.unwrap();
        assert_eq!(dual.flag.classifier, PathBuf::from("models/flag.onnx"));
        assert_eq!(dual.source.scaler, PathBuf::from("models/source_scaler.json"));
    }
}
