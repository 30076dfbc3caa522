//! Configuration file loading and pre-flight checks

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.climatiq.io/data/v1";
pub const PLACEHOLDER_API_KEY: &str = "YOUR_CLIMATIQ_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Climatiq,
    Local,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClimatiqConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ClimatiqConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl ClimatiqConfig {
    /// The API key, unless it is missing, blank or still the placeholder
    pub fn usable_api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty() && *k != PLACEHOLDER_API_KEY)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: PathBuf,
    pub provider: ProviderKind,
    pub climatiq: ClimatiqConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: PathBuf::from("carbon_factors.db"),
            provider: ProviderKind::default(),
            climatiq: ClimatiqConfig::default(),
        }
    }
}

impl Config {
    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Check provider settings without touching the network.
    ///
    /// Returns human-readable warnings; an empty list means the configuration
    /// looks usable.
    pub fn preflight(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.provider == ProviderKind::Climatiq {
            if self.climatiq.usable_api_key().is_none() {
                warnings.push(
                    "Climatiq API key not configured; set CLIMATIQ_API_KEY or climatiq.api_key \
                     (free keys at https://www.climatiq.io/)"
                        .to_string(),
                );
            }
            let url = self.climatiq.base_url.as_str();
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                warnings.push(format!("Climatiq base_url '{}' is not an http(s) URL", url));
            }
            if self.climatiq.timeout_secs == 0 {
                warnings.push("climatiq.timeout_secs is 0; every request will time out".to_string());
            }
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.climatiq.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn parses_partial_sections() {
        let config = Config::from_toml(
            r#"
            provider = "local"
            database = "/tmp/f.db"

            [climatiq]
            timeout_secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.provider, ProviderKind::Local);
        assert_eq!(config.database, PathBuf::from("/tmp/f.db"));
        assert_eq!(config.climatiq.timeout_secs, 5);
        assert_eq!(config.climatiq.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn rejects_unknown_provider() {
        assert!(Config::from_toml(r#"provider = "carbonapi""#).is_err());
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("carbon.toml");
        fs::write(&path, "provider = [").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("carbon.toml"));
    }

    #[test]
    fn preflight_flags_placeholder_key() {
        let mut config = Config::default();
        config.climatiq.api_key = Some(PLACEHOLDER_API_KEY.to_string());
        assert_eq!(config.preflight().len(), 1);

        config.climatiq.api_key = Some("live-key".to_string());
        assert!(config.preflight().is_empty());
    }

    #[test]
    fn preflight_ignores_climatiq_for_local_provider() {
        let config = Config {
            provider: ProviderKind::Local,
            ..Default::default()
        };
        assert!(config.preflight().is_empty());
    }

    #[test]
    fn preflight_flags_bad_url_and_timeout() {
        let mut config = Config::default();
        config.climatiq.api_key = Some("k".to_string());
        config.climatiq.base_url = "api.climatiq.io".to_string();
        config.climatiq.timeout_secs = 0;
        assert_eq!(config.preflight().len(), 2);
    }
}
