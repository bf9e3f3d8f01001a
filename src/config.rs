//! Configuration loader and validator for the lead dashboard.
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::api::DEFAULT_API_BASE;

/// Environment variable that overrides `api.base_url`.
pub const API_URL_ENV: &str = "LEAD_DESK_API_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Config {
    #[serde(default)]
    pub api: Api,
    #[serde(default)]
    pub display: Display,
}

/// Remote leads service settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Api {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for Api {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

/// Terminal rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Display {
    #[serde(default = "default_color")]
    pub color: bool,
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,
}

impl Default for Display {
    fn default() -> Self {
        Self {
            color: default_color(),
            timestamp_format: default_timestamp_format(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_user_agent() -> String {
    concat!("lead-desk/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_color() -> bool {
    true
}

fn default_timestamp_format() -> String {
    "%Y-%m-%d %H:%M".to_string()
}

impl Config {
    /// Replace `api.base_url` with `LEAD_DESK_API_URL` when it is set and non-empty.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            self.override_base_url(&url)?;
        }
        Ok(())
    }

    fn override_base_url(&mut self, url: &str) -> Result<(), ConfigError> {
        if url.trim().is_empty() {
            return Ok(());
        }
        let mut next = self.clone();
        next.api.base_url = url.trim().to_string();
        validate(&next)?;
        *self = next;
        Ok(())
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Like [`load`], but a missing file yields the defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<Config, ConfigError> {
    match load(path) {
        Err(ConfigError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
            Ok(Config::default())
        }
        other => other,
    }
}

/// Validate a configuration instance.
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    let base = cfg.api.base_url.trim();
    if base.is_empty() {
        return Err(ConfigError::Invalid("api.base_url must be non-empty"));
    }
    let url = Url::parse(base).map_err(|_| ConfigError::Invalid("api.base_url must be a valid URL"))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Invalid("api.base_url must use http or https"));
    }
    if cfg.api.timeout_secs == 0 {
        return Err(ConfigError::Invalid("api.timeout_secs must be > 0"));
    }
    if cfg.api.user_agent.trim().is_empty() {
        return Err(ConfigError::Invalid("api.user_agent must be non-empty"));
    }
    if cfg.display.timestamp_format.trim().is_empty() {
        return Err(ConfigError::Invalid("display.timestamp_format must be non-empty"));
    }
    Ok(())
}

/// Returns the example YAML content.
pub fn example() -> &'static str {
    r#"api:
  base_url: "http://localhost:7777"
  timeout_secs: 15
  user_agent: "lead-desk/0.1"

display:
  color: true
  timestamp_format: "%Y-%m-%d %H:%M"
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parse_example_ok() {
        let cfg: Config = serde_yaml::from_str(example()).unwrap();
        validate(&cfg).unwrap();
        assert_eq!(cfg.api.base_url, "http://localhost:7777");
        assert!(cfg.display.color);
    }

    #[test]
    fn missing_sections_use_defaults() {
        let cfg: Config = serde_yaml::from_str("api:\n  base_url: \"https://crm.example.com\"\n").unwrap();
        validate(&cfg).unwrap();
        assert_eq!(cfg.api.timeout_secs, 15);
        assert_eq!(cfg.display, Display::default());
    }

    #[test]
    fn invalid_base_url() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.api.base_url = "".into();
        let err = validate(&cfg).unwrap_err();
        match err { ConfigError::Invalid(msg) => assert!(msg.contains("api.base_url")), _ => panic!("wrong error") }

        cfg.api.base_url = "ftp://crm.example.com".into();
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));

        cfg.api.base_url = "localhost:7777 /leads".into();
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn invalid_timeout_and_format() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.api.timeout_secs = 0;
        let err = validate(&cfg).unwrap_err();
        match err { ConfigError::Invalid(msg) => assert!(msg.contains("timeout_secs")), _ => panic!("wrong error") }

        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.display.timestamp_format = " ".into();
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));

        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.api.user_agent = "".into();
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn base_url_override_is_validated() {
        let mut cfg = Config::default();
        cfg.override_base_url("https://crm.example.com/api").unwrap();
        assert_eq!(cfg.api.base_url, "https://crm.example.com/api");

        cfg.override_base_url("   ").unwrap();
        assert_eq!(cfg.api.base_url, "https://crm.example.com/api");

        assert!(cfg.override_base_url("nonsense").is_err());
    }

    #[test]
    fn load_from_file_ok() {
        let td = tempdir().unwrap();
        let p = td.path().join("config.yaml");
        fs::write(&p, example()).unwrap();
        let cfg = load(Some(&p)).unwrap();
        assert_eq!(cfg.api.timeout_secs, 15);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let td = tempdir().unwrap();
        let cfg = load_or_default(Some(&td.path().join("absent.yaml"))).unwrap();
        assert_eq!(cfg, Config::default());

        let p = td.path().join("broken.yaml");
        fs::write(&p, "api: [").unwrap();
        assert!(matches!(load_or_default(Some(&p)), Err(ConfigError::Parse(_))));
    }
}
