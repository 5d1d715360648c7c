//! Configuration management for the webhook dashboard CLI.
//!
//! Settings are stored in TOML format. Values from the file can be
//! overridden by environment variables, which is the preferred way of
//! supplying the backend password.
//!
//! # Example TOML Configuration
//!
//! ```toml
//! [backend]
//! base_url = "http://localhost:8080/api"
//! timeout_secs = 10
//!
//! [authentication]
//! username = "admin"
//! ```

use std::{
    fmt, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use webhook_client::{BasicCredentials, ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};

use crate::errors::Error;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILENAME: &str = "webhook-dashboard.toml";

/// Overrides `backend.base_url`
pub const ENV_BASE_URL: &str = "WEBHOOK_DASHBOARD_BASE_URL";

/// Overrides `authentication.username`
pub const ENV_USERNAME: &str = "WEBHOOK_DASHBOARD_USERNAME";

/// Overrides `authentication.password`
pub const ENV_PASSWORD: &str = "WEBHOOK_DASHBOARD_PASSWORD";

const REDACTED: &str = "********";

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Main configuration structure for the webhook dashboard CLI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub authentication: AuthenticationConfig,
}

impl AppConfig {
    /// Loads configuration from a TOML file at the specified path.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the file does not exist, cannot be read or
    /// does not contain a valid configuration.
    pub fn load(path: &Path) -> Result<Self, Error> {
        debug!("Loading configuration from {:?}", path);

        if !path.exists() {
            return Err(Error::Config(format!(
                "Configuration file not found: {:?}",
                path
            )));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read configuration file: {}", e)))?;

        let config: AppConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse configuration file: {}", e)))?;

        Ok(config)
    }

    /// Loads the configuration the commands run with.
    ///
    /// An explicitly named file must exist. Without one the default file is
    /// used when present, otherwise the built-in defaults. Environment
    /// overrides are applied last.
    pub fn load_effective(config_path: Option<&str>) -> Result<Self, Error> {
        let path = get_config_path(config_path);
        let mut config = if config_path.is_some() || path.exists() {
            Self::load(&path)?
        } else {
            debug!(path = ?path, "No configuration file, using defaults");
            Self::default()
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Saves the configuration to a TOML file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        debug!("Saving configuration to {:?}", path);

        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize configuration: {}", e)))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create directory: {}", e)))?;
        }

        fs::write(path, content)
            .map_err(|e| Error::Config(format!("Failed to write configuration file: {}", e)))?;

        info!("Configuration saved to {:?}", path);
        Ok(())
    }

    /// Replaces values with those found by `lookup`. Blank values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(base_url) = value(ENV_BASE_URL) {
            debug!(variable = ENV_BASE_URL, "Overriding backend base URL");
            self.backend.base_url = base_url;
        }
        if let Some(username) = value(ENV_USERNAME) {
            debug!(variable = ENV_USERNAME, "Overriding username");
            self.authentication.username = username;
        }
        if let Some(password) = value(ENV_PASSWORD) {
            debug!(variable = ENV_PASSWORD, "Overriding password");
            self.authentication.password = Some(password);
        }
    }

    /// Builds the connection settings for the HTTP client.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` when no password is configured and
    /// `Error::Api` when the base URL is not usable.
    pub fn client_config(&self) -> Result<ClientConfig, Error> {
        let password = self.authentication.password.as_deref().ok_or_else(|| {
            Error::Config(format!(
                "No backend password configured. Set authentication.password or {}",
                ENV_PASSWORD
            ))
        })?;
        let credentials = BasicCredentials::new(
            self.authentication.username.clone(),
            SecretString::from(password.to_string()),
        );

        let config = ClientConfig::new(&self.backend.base_url, credentials)?;
        Ok(config.with_timeout(self.backend.timeout()))
    }

    /// Copy of the configuration that is safe to print.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.authentication.password.is_some() {
            copy.authentication.password = Some(REDACTED.to_string());
        }
        copy
    }
}

/// Where the webhook backend lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "BackendConfig::default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds, 0 disables the client-side timeout
    #[serde(default = "BackendConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl BackendConfig {
    fn default_base_url() -> String {
        DEFAULT_BASE_URL.to_string()
    }

    fn default_timeout_secs() -> u64 {
        DEFAULT_TIMEOUT.as_secs()
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

/// HTTP Basic credentials sent to the backend.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthenticationConfig {
    #[serde(default = "AuthenticationConfig::default_username")]
    pub username: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl AuthenticationConfig {
    fn default_username() -> String {
        "admin".to_string()
    }
}

impl Default for AuthenticationConfig {
    fn default() -> Self {
        Self {
            username: Self::default_username(),
            password: None,
        }
    }
}

impl fmt::Debug for AuthenticationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticationConfig")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| REDACTED))
            .finish()
    }
}

/// Resolves the path to the configuration file.
///
/// Uses `config_path` when given, otherwise `./webhook-dashboard.toml`.
pub fn get_config_path(config_path: Option<&str>) -> PathBuf {
    if let Some(path) = config_path {
        PathBuf::from(path)
    } else {
        let current_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        current_dir.join(DEFAULT_CONFIG_FILENAME)
    }
}
