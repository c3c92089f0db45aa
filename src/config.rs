//! Configuration Management
//!
//! Handles persistent configuration storage for the cortex CLI.
//! Passwords are only ever read from the environment.

use anyhow::Result;
use cortex_sdk::sdk::auth::{DEFAULT_HEADER_NAME, DEFAULT_HEADER_PREFIX};
use cortex_sdk::HeaderScheme;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Token endpoint, relative to the base URL
const DEFAULT_TOKEN_PATH: &str = "oauth2/tokens";

const ENV_BASE_URL: &str = "CORTEX_BASE_URL";
const ENV_TOKEN_URL: &str = "CORTEX_TOKEN_URL";
const ENV_SCOPE: &str = "CORTEX_SCOPE";
const ENV_USERNAME: &str = "CORTEX_USERNAME";
const ENV_PASSWORD: &str = "CORTEX_PASSWORD";

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// API root that relative addresses are resolved against
    #[serde(default)]
    pub base_url: Option<String>,
    /// Token endpoint (absolute, or relative to the base URL)
    #[serde(default)]
    pub token_url: Option<String>,
    /// Store scope used for authentication
    #[serde(default)]
    pub scope: Option<String>,
    /// Registered user name; anonymous (public) auth when unset
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub header_name: Option<String>,
    /// Token prefix; an empty string sends the bare token
    #[serde(default)]
    pub header_prefix: Option<String>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("cortex").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Overwrite every field set in `other`
    pub fn merge(&mut self, other: Config) {
        let Config {
            base_url,
            token_url,
            scope,
            username,
            header_name,
            header_prefix,
        } = other;
        self.base_url = base_url.or(self.base_url.take());
        self.token_url = token_url.or(self.token_url.take());
        self.scope = scope.or(self.scope.take());
        self.username = username.or(self.username.take());
        self.header_name = header_name.or(self.header_name.take());
        self.header_prefix = header_prefix.or(self.header_prefix.take());
    }

    /// Get effective base URL (CLI > env > config)
    pub fn effective_base_url(&self, cli: Option<&str>) -> Option<String> {
        pick(cli, env_var(ENV_BASE_URL), &self.base_url)
    }

    /// Get effective token URL (CLI > env > config > default)
    pub fn effective_token_url(&self, cli: Option<&str>) -> String {
        pick(cli, env_var(ENV_TOKEN_URL), &self.token_url)
            .unwrap_or_else(|| DEFAULT_TOKEN_PATH.to_string())
    }

    /// Get effective scope (CLI > env > config)
    pub fn effective_scope(&self, cli: Option<&str>) -> Option<String> {
        pick(cli, env_var(ENV_SCOPE), &self.scope)
    }

    /// Get effective username (CLI > env > config)
    pub fn effective_username(&self, cli: Option<&str>) -> Option<String> {
        pick(cli, env_var(ENV_USERNAME), &self.username)
    }

    /// Password from the environment
    pub fn password() -> Option<String> {
        env_var(ENV_PASSWORD)
    }

    pub fn header_scheme(&self) -> HeaderScheme {
        let name = self
            .header_name
            .clone()
            .unwrap_or_else(|| DEFAULT_HEADER_NAME.to_string());
        let prefix = match self.header_prefix.as_deref() {
            None => Some(DEFAULT_HEADER_PREFIX.to_string()),
            Some("") => None,
            Some(prefix) => Some(prefix.to_string()),
        };
        HeaderScheme::new(name, prefix)
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn pick(cli: Option<&str>, env: Option<String>, config: &Option<String>) -> Option<String> {
    cli.map(str::to_string).or(env).or_else(|| config.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_precedence() {
        let config = Some("from-config".to_string());
        assert_eq!(
            pick(Some("from-cli"), Some("from-env".to_string()), &config).as_deref(),
            Some("from-cli")
        );
        assert_eq!(pick(None, Some("from-env".to_string()), &config).as_deref(), Some("from-env"));
        assert_eq!(pick(None, None, &config).as_deref(), Some("from-config"));
        assert_eq!(pick(None, None, &None), None);
    }

    #[test]
    fn test_header_scheme_defaults_and_overrides() {
        assert_eq!(Config::default().header_scheme(), HeaderScheme::default());

        let config = Config {
            header_name: Some("x-ep-user-token".to_string()),
            header_prefix: Some(String::new()),
            ..Config::default()
        };
        assert_eq!(config.header_scheme(), HeaderScheme::new("x-ep-user-token", None));
    }

    #[test]
    fn test_merge_keeps_unset_fields() {
        let mut config = Config {
            base_url: Some("https://old.example.com".to_string()),
            scope: Some("mobee".to_string()),
            ..Config::default()
        };
        config.merge(Config {
            base_url: Some("https://new.example.com".to_string()),
            ..Config::default()
        });
        assert_eq!(config.base_url.as_deref(), Some("https://new.example.com"));
        assert_eq!(config.scope.as_deref(), Some("mobee"));
    }

    #[test]
    fn test_config_roundtrip_ignores_missing_fields() {
        let config: Config = serde_json::from_str(r#"{"scope":"mobee"}"#).unwrap();
        assert_eq!(config.scope.as_deref(), Some("mobee"));
        assert!(config.base_url.is_none());
    }
}
