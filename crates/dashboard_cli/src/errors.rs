use std::io;

use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors that can occur in the webhook dashboard CLI.
#[derive(Error, Debug)]
pub enum Error {
    /// A backend call failed or a request was rejected before it was sent.
    #[error("{0}")]
    Api(#[from] webhook_client::Error),

    /// The backend could not deliver the data a screen needs.
    ///
    /// Raised when a view finished loading without any data to show.
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// Configuration error occurred while loading or parsing configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid command-line arguments were provided.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Writing an export file failed.
    #[error("Failed to write {path}: {source}")]
    WriteFile { path: String, source: io::Error },

    /// Failed to flush the standard output buffer.
    #[error("Failed to flush the std out buffer.")]
    StdOutFlushFailed,

    /// Failed to read an answer from standard input.
    #[error("Failed to read from std in.")]
    StdInReadFailed,

    /// The user interrupted the command.
    #[error("Cancelled")]
    Cancelled,
}

impl Error {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Cancelled => 130,
            Self::InvalidArguments(_) | Self::Api(webhook_client::Error::Validation(_)) => 2,
            _ => 1,
        }
    }
}
