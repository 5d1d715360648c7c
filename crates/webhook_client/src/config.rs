//! Connection settings for [`crate::WebhookClient`].

use std::time::Duration;

use url::Url;

use crate::auth::BasicCredentials;
use crate::Error;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Where the backend lives and how to authenticate against it.
#[derive(Debug)]
pub struct ClientConfig {
    pub base_url: Url,
    /// `None` leaves the transport default in place
    pub timeout: Option<Duration>,
    pub credentials: BasicCredentials,
}

impl ClientConfig {
    /// Creates a configuration with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` when `base_url` does not parse or is not
    /// an `http`/`https` URL.
    pub fn new(base_url: &str, credentials: BasicCredentials) -> Result<Self, Error> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|e| Error::Validation(format!("Invalid base URL '{base_url}': {e}")))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(Error::Validation(format!(
                "Base URL must use http or https, got '{}'",
                base_url.scheme()
            )));
        }
        if base_url.cannot_be_a_base() {
            return Err(Error::Validation(format!(
                "Base URL '{base_url}' cannot carry a path"
            )));
        }

        Ok(Self {
            base_url,
            timeout: Some(DEFAULT_TIMEOUT),
            credentials,
        })
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}
