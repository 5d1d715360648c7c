//! Integration testing library for the webhook dashboard.
//!
//! Provides [`FakeBackend`], an HTTP server that speaks the webhook backend's
//! wire format on a random local port, so the client and the view models can
//! be exercised end to end without the real service.

pub mod fake_backend;

pub use fake_backend::{FakeBackend, FAKE_PASSWORD, FAKE_USERNAME};
