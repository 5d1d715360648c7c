//! Error types for webhook backend operations.
//!
//! Every facade operation either succeeds or fails with exactly one of the
//! variants below. Network failures and undecodable bodies are folded into
//! [`Error::Request`] so that callers never see a raw `reqwest` or
//! `serde_json` error.

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors that can occur while talking to the webhook backend.
///
/// ## Examples
///
/// ```rust,ignore
/// use webhook_client::Error;
///
/// match api.retry_event("42").await {
///     Ok(event) => println!("Retry scheduled, attempt {}", event.attempts),
///     Err(Error::NotFound(_)) => eprintln!("Event not found."),
///     Err(err) => eprintln!("Retry failed: {}", err),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A request failed.
    ///
    /// `status` holds the HTTP status when the backend answered with a non-2xx
    /// response. It is `None` when the backend could not be reached or the
    /// response body could not be decoded.
    #[error("{}", describe_request_failure(.status, .message))]
    Request {
        status: Option<u16>,
        message: String,
    },

    /// The operation addressed an entity that does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The backend rejected the supplied login credentials.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// A client-side precondition failed; no request was sent.
    #[error("Validation failed: {0}")]
    Validation(String),
}

impl Error {
    /// Builds the error for a non-2xx response.
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Request {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Builds the error for a failure that produced no HTTP status.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Request {
            status: None,
            message: message.into(),
        }
    }

    /// Returns true when the backend could not be reached or answered garbage.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Request { status: None, .. })
    }

    /// Returns the HTTP status carried by the error, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Request { status, .. } => *status,
            _ => None,
        }
    }

    /// Re-expresses a 404 response as [`Error::NotFound`].
    pub(crate) fn not_found_on_404(self, what: &str) -> Self {
        match self {
            Self::Request {
                status: Some(404), ..
            } => Self::NotFound(format!("{what} not found")),
            other => other,
        }
    }
}

fn describe_request_failure(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("Request failed with status {code}: {message}"),
        None => format!("Request failed: {message}"),
    }
}
