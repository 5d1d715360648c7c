//! # Dashboard Core
//!
//! Headless view models for the webhook administration dashboard.
//!
//! Each screen of the dashboard is a struct that owns its own snapshot of
//! backend data and talks to the backend only through
//! [`webhook_client::WebhookApi`]. Views never share state with one another.
//!
//! ## Screens
//!
//! - [`OverviewView`] - headline counters, status breakdown, latest events
//! - [`StatisticsView`] - success and retry rates, status chart
//! - [`PublisherView`] - publish form and the event list next to it
//! - [`ConsumerView`] - subscription form and subscription management
//! - [`EventsMonitorView`] - filterable event list with CSV export
//! - [`AdminView`] - registration, login and the current session
//!
//! ## Loading and failure
//!
//! Data-bearing views start in [`Loadable::Loading`] and move to
//! [`Loadable::Ready`] or [`Loadable::Failed`] after their first fetch. A
//! failed operation never discards data that was already loaded. Fetches can
//! be run as a [`ViewTask`], which aborts the request when dropped.
//!
//! ## Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use dashboard_core::OverviewView;
//! use webhook_client::MemoryWebhookApi;
//!
//! # async fn example() {
//! let api = Arc::new(MemoryWebhookApi::with_demo_data());
//! let mut overview = OverviewView::new(api);
//! overview.load().await;
//!
//! for card in overview.stat_cards() {
//!     println!("{}: {}", card.title, card.value);
//! }
//! # }
//! ```

pub mod admin;
pub mod consumer;
pub mod loadable;
pub mod monitor;
pub mod overview;
pub mod publisher;
pub mod statistics;

pub use admin::{AdminView, LoginForm, RegistrationForm};
pub use consumer::{generate_secret, ConsumerView, SubscriptionForm};
pub use loadable::{Loadable, ViewTask};
pub use monitor::{events_to_csv, EventFilter, EventsMonitorView, StatusFilter};
pub use overview::{OverviewView, StatCard, StatusShare};
pub use publisher::{can_retry, PublishForm, PublisherView};
pub use statistics::{ChartBar, StatisticsView, TimeRange};

pub use webhook_client::{Error, WebhookApi};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

#[cfg(test)]
mod test_support;

/// Returns `part` as a rounded percentage of `whole`, or 0 when `whole` is 0.
pub fn percentage(part: u64, whole: u64) -> u64 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u64
}
