//! # Client Configuration
//!
//! Where the back-office API lives and how to talk to it.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SOUQ_API_URL=https://backoffice.example.com/api                    │
//! │     SOUQ_API_TOKEN=…   SOUQ_TIMEOUT_SECS=30                            │
//! │     SOUQ_USER_ID=4     SOUQ_PAGE_SIZE=25                               │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/backoffice/souq.toml (Linux)                             │
//! │     ~/Library/Application Support/com.souq.backoffice/souq.toml (macOS)│
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     http://localhost:8000/api, 30 s timeout, 10 rows per page          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # souq.toml
//! [api]
//! url = "https://backoffice.example.com/api"
//! token = "eyJhbGciOi..."
//! timeout_secs = 30
//!
//! [session]
//! user_id = 4
//!
//! [lists]
//! page_size = 25
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ClientError, ClientResult};

// =============================================================================
// API Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL every resource path is appended to.
    #[serde(default = "default_api_url")]
    pub url: String,

    /// Bearer token sent with every request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Per-request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            url: default_api_url(),
            token: None,
            timeout_secs: default_timeout(),
        }
    }
}

// =============================================================================
// Session & List Settings
// =============================================================================

/// Signed-in user, used to resolve the user's branch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListSettings {
    /// Rows per page for list endpoints.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page_size() -> u32 {
    10
}

impl Default for ListSettings {
    fn default() -> Self {
        ListSettings {
            page_size: default_page_size(),
        }
    }
}

// =============================================================================
// Main Client Configuration
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub session: SessionSettings,

    #[serde(default)]
    pub lists: ListSettings,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (souq.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ClientResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading client config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ClientResult<PathBuf> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ClientError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Client config saved");
        Ok(path)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ClientResult<()> {
        let url = Url::parse(&self.api.url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", self.api.url, e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ClientError::InvalidUrl(format!(
                "API URL must start with http:// or https://, got: {}",
                self.api.url
            )));
        }

        if self.api.timeout_secs == 0 {
            return Err(ClientError::InvalidConfig(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if self.lists.page_size == 0 {
            return Err(ClientError::InvalidConfig(
                "page_size must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("SOUQ_API_URL") {
            debug!(url = %url, "Overriding API URL from environment");
            self.api.url = url;
        }

        if let Some(token) = var("SOUQ_API_TOKEN") {
            debug!("Overriding API token from environment");
            self.api.token = Some(token).filter(|t| !t.is_empty());
        }

        if let Some(timeout) = var("SOUQ_TIMEOUT_SECS") {
            match timeout.parse::<u64>() {
                Ok(secs) => self.api.timeout_secs = secs,
                Err(_) => warn!(value = %timeout, "Ignoring invalid SOUQ_TIMEOUT_SECS"),
            }
        }

        if let Some(user_id) = var("SOUQ_USER_ID") {
            match user_id.parse::<i64>() {
                Ok(id) => self.session.user_id = Some(id),
                Err(_) => warn!(value = %user_id, "Ignoring invalid SOUQ_USER_ID"),
            }
        }

        if let Some(size) = var("SOUQ_PAGE_SIZE") {
            match size.parse::<u32>() {
                Ok(n) => self.lists.page_size = n,
                Err(_) => warn!(value = %size, "Ignoring invalid SOUQ_PAGE_SIZE"),
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "souq", "backoffice")
            .map(|dirs| dirs.config_dir().join("souq.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn api_url(&self) -> &str {
        &self.api.url
    }

    pub fn token(&self) -> Option<&str> {
        self.api.token.as_deref()
    }

    pub fn user_id(&self) -> Option<i64> {
        self.session.user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.api.url, "http://localhost:8000/api");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.lists.page_size, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ClientConfig::default();

        config.api.url = "not a url".to_string();
        assert!(matches!(config.validate(), Err(ClientError::InvalidUrl(_))));

        config.api.url = "ftp://files.example.com".to_string();
        assert!(config.validate().is_err());

        config.api.url = "https://backoffice.example.com/api".to_string();
        config.api.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(ClientError::InvalidConfig(_))));

        config.api.timeout_secs = 5;
        config.lists.page_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("SOUQ_API_URL", "https://example.com/api"),
            ("SOUQ_API_TOKEN", "secret"),
            ("SOUQ_TIMEOUT_SECS", "nope"),
            ("SOUQ_USER_ID", "7"),
            ("SOUQ_PAGE_SIZE", "50"),
        ]);

        let mut config = ClientConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.api_url(), "https://example.com/api");
        assert_eq!(config.token(), Some("secret"));
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.user_id(), Some(7));
        assert_eq!(config.lists.page_size, 50);
    }

    #[test]
    fn test_partial_toml() {
        let config: ClientConfig = toml::from_str(
            r#"
            [api]
            url = "https://shop.example.com/api"
            "#,
        )
        .unwrap();
        assert_eq!(config.api.url, "https://shop.example.com/api");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.lists.page_size, 10);
    }

    #[test]
    fn test_toml_serialization() {
        let mut config = ClientConfig::default();
        config.session.user_id = Some(3);
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[api]"));
        assert!(toml_str.contains("user_id = 3"));
        assert!(!toml_str.contains("token"));
    }

    #[test]
    fn test_save_and_load_roundtrip_path() {
        let dir = std::env::temp_dir().join(format!("souq-config-{}", std::process::id()));
        let path = dir.join("souq.toml");

        let mut config = ClientConfig::default();
        config.lists.page_size = 42;
        let saved = config.save(Some(path.clone())).unwrap();
        assert_eq!(saved, path);

        let contents = std::fs::read_to_string(&path).unwrap();
        let loaded: ClientConfig = toml::from_str(&contents).unwrap();
        assert_eq!(loaded.lists.page_size, 42);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
