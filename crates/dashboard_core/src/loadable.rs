//! Loading state and cancellable fetches shared by every view.

use std::future::Future;

use tokio::task::JoinHandle;
use tracing::debug;
use webhook_client::Error;

#[cfg(test)]
#[path = "loadable_tests.rs"]
mod tests;

/// State of a view's data.
#[derive(Debug, Clone, PartialEq)]
pub enum Loadable<T> {
    /// No fetch has completed yet
    Loading,
    Ready(T),
    /// The first fetch failed; holds the error message
    Failed(String),
}

impl<T> Default for Loadable<T> {
    fn default() -> Self {
        Self::Loading
    }
}

impl<T> Loadable<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message.as_str()),
            _ => None,
        }
    }

    /// Folds the outcome of a fetch into the current state.
    ///
    /// A failure only replaces the state when nothing was loaded before, so
    /// data on screen survives a failed refresh.
    pub fn apply(&mut self, result: Result<T, Error>) {
        match result {
            Ok(value) => *self = Self::Ready(value),
            Err(e) => {
                if self.ready().is_none() {
                    *self = Self::Failed(e.to_string());
                }
            }
        }
    }
}

/// A fetch running in the background on behalf of a view.
///
/// Dropping the task aborts the fetch, so a view that goes away does not leave
/// requests running behind it.
#[derive(Debug)]
pub struct ViewTask<T> {
    handle: JoinHandle<T>,
}

impl<T: Send + 'static> ViewTask<T> {
    /// Starts `future` on the current runtime.
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Self {
            handle: tokio::spawn(future),
        }
    }

    /// Waits for the fetch. Returns `None` if it was cancelled or panicked.
    pub async fn join(mut self) -> Option<T> {
        match (&mut self.handle).await {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(cancelled = e.is_cancelled(), "View task did not complete");
                None
            }
        }
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl<T> Drop for ViewTask<T> {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
