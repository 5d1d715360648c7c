//! HTTP Basic credentials for the webhook backend.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::HeaderValue;
use secrecy::{ExposeSecret, SecretString};

use crate::Error;

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;

/// Username and password sent with every backend request.
///
/// The password is held as a [`SecretString`] and never appears in `Debug`
/// output or logs.
#[derive(Debug)]
pub struct BasicCredentials {
    username: String,
    password: SecretString,
}

impl BasicCredentials {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns `base64(username:password)`.
    pub fn encoded(&self) -> String {
        STANDARD.encode(format!(
            "{}:{}",
            self.username,
            self.password.expose_secret()
        ))
    }

    /// Builds the `Authorization` header value, marked sensitive.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if the encoded value is not a legal header.
    pub fn header_value(&self) -> Result<HeaderValue, Error> {
        let mut value = HeaderValue::from_str(&format!("Basic {}", self.encoded()))
            .map_err(|e| Error::Validation(format!("Invalid credentials header: {e}")))?;
        value.set_sensitive(true);
        Ok(value)
    }
}
