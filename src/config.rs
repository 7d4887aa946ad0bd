//! Process configuration: registry and source-hub endpoints, credentials
//! and organization names.
//!
//! Loaded once at startup and passed by reference into each component so
//! the pipelines stay testable in isolation. Read-only after startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_REGISTRY_URL: &str = "https://app.terraform.io/api/v2";
pub const DEFAULT_HUB_URL: &str = "https://api.github.com";

/// Terraform-Cloud-compatible registry endpoint and credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_registry_url")]
    pub base_url: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub organization: String,
}

/// GitHub-compatible source-hosting endpoint and credentials. Module
/// repositories live under `organization` and are named
/// `terraform-<provider>-<module>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    #[serde(default = "default_hub_url")]
    pub api_url: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub organization: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub hub: HubConfig,
}

fn default_registry_url() -> String {
    DEFAULT_REGISTRY_URL.to_string()
}

fn default_hub_url() -> String {
    DEFAULT_HUB_URL.to_string()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: default_registry_url(),
            token: String::new(),
            organization: String::new(),
        }
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            api_url: default_hub_url(),
            token: String::new(),
            organization: String::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registry: RegistryConfig::default(),
            hub: HubConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from an explicit path, the default config file,
    /// or built-in defaults, then apply environment-variable overrides.
    pub fn load(path: Option<&str>) -> anyhow::Result<Config> {
        let mut config = match path {
            Some(path) => {
                info!(path, "loading configuration file");
                Self::from_file(Path::new(path))?
            }
            None => {
                let default_path = Self::default_path();
                match &default_path {
                    Some(p) if p.exists() => {
                        info!(path = %p.display(), "loading default configuration file");
                        Self::from_file(p)?
                    }
                    _ => Config::default(),
                }
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn from_file(path: &Path) -> anyhow::Result<Config> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// `~/.config/tfscaffold/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tfscaffold").join("config.json"))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("TFSCAFFOLD_REGISTRY_URL") {
            self.registry.base_url = url;
        }
        if let Ok(token) = std::env::var("TFSCAFFOLD_REGISTRY_TOKEN") {
            self.registry.token = token;
        }
        if let Ok(org) = std::env::var("TFSCAFFOLD_ORGANIZATION") {
            self.registry.organization = org;
        }
        if let Ok(url) = std::env::var("TFSCAFFOLD_HUB_URL") {
            self.hub.api_url = url;
        }
        if let Ok(token) = std::env::var("TFSCAFFOLD_HUB_TOKEN") {
            self.hub.token = token;
        }
        if let Ok(org) = std::env::var("TFSCAFFOLD_HUB_ORGANIZATION") {
            self.hub.organization = org;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_public_endpoints() {
        let config = Config::default();
        assert_eq!(config.registry.base_url, DEFAULT_REGISTRY_URL);
        assert_eq!(config.hub.api_url, DEFAULT_HUB_URL);
        assert!(config.registry.token.is_empty());
    }

    #[test]
    fn partial_config_file_fills_defaults() {
        let json = r#"{ "registry": { "organization": "acme" } }"#;
        let config: Config = serde_json::from_str(json).expect("parse");
        assert_eq!(config.registry.organization, "acme");
        assert_eq!(config.registry.base_url, DEFAULT_REGISTRY_URL);
        assert_eq!(config.hub.organization, "");
    }
}
