use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_CLASSIFICATION: &str = "Customs Duties";
pub const DEFAULT_FIELD: &str = "current_month_net_rcpt_amt";

fn default_classification() -> String {
    DEFAULT_CLASSIFICATION.to_string()
}

fn default_field() -> String {
    DEFAULT_FIELD.to_string()
}

/// A dashboard metric backed by one adapter call.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricConfig {
    Fred {
        label: String,
        id: String,
    },
    TreasuryMts {
        label: String,
        #[serde(default = "default_classification")]
        classification: String,
        #[serde(default = "default_field")]
        field: String,
    },
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FredProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TreasuryProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub fred: Option<FredProviderConfig>,
    pub treasury: Option<TreasuryProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            fred: Some(FredProviderConfig {
                base_url: "https://fred.stlouisfed.org".to_string(),
            }),
            treasury: Some(TreasuryProviderConfig {
                base_url: "https://api.fiscaldata.treasury.gov".to_string(),
            }),
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub metrics: Vec<MetricConfig>,
}

impl AppConfig {
    /// Loads the config from the default path, falling back to built-in
    /// defaults when no config file exists yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!("No config file at {}, using defaults", config_path.display());
            return Ok(AppConfig::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "macrodash", "macrodash")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
server:
  host: "0.0.0.0"
  port: 9000
providers:
  fred:
    base_url: "http://example.com/fred"
  treasury:
    base_url: "http://example.com/treasury"
metrics:
  - kind: fred
    label: "Manufacturing construction spending"
    id: "TLMFGCONS"
  - kind: treasury_mts
    label: "Customs duties receipts"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(
            config.providers.fred.unwrap().base_url,
            "http://example.com/fred"
        );
        assert_eq!(
            config.providers.treasury.unwrap().base_url,
            "http://example.com/treasury"
        );

        assert_eq!(config.metrics.len(), 2);
        match &config.metrics[0] {
            MetricConfig::Fred { label, id } => {
                assert_eq!(label, "Manufacturing construction spending");
                assert_eq!(id, "TLMFGCONS");
            }
            other => panic!("Expected FRED metric, got {other:?}"),
        }
        match &config.metrics[1] {
            MetricConfig::TreasuryMts {
                label,
                classification,
                field,
            } => {
                assert_eq!(label, "Customs duties receipts");
                assert_eq!(classification, DEFAULT_CLASSIFICATION);
                assert_eq!(field, DEFAULT_FIELD);
            }
            other => panic!("Expected Treasury metric, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").expect("Failed to deserialize");
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert!(config.metrics.is_empty());
        assert_eq!(
            config.providers.fred.unwrap().base_url,
            "https://fred.stlouisfed.org"
        );
    }
}
