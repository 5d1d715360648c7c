//! Dashboard overview: headline counters, status breakdown and latest events.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};
use webhook_client::models::{EventStatus, WebhookEvent, WebhookStats};
use webhook_client::{Error, WebhookApi};

use crate::{percentage, ViewTask};

#[cfg(test)]
#[path = "overview_tests.rs"]
mod tests;

/// Number of events listed under "Recent Events".
pub const OVERVIEW_RECENT_EVENTS: usize = 5;

/// One headline counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatCard {
    pub title: &'static str,
    pub value: String,
}

/// Share of all events that are in one status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusShare {
    pub status: EventStatus,
    pub count: u64,
    /// Rounded percentage of the total, 0 when there are no events
    pub percent: u64,
}

/// Computes the status breakdown shown by the overview and statistics views.
pub fn status_breakdown(stats: &WebhookStats) -> Vec<StatusShare> {
    EventStatus::ALL
        .iter()
        .map(|status| {
            let count = stats.events_by_status.get(*status);
            StatusShare {
                status: *status,
                count,
                percent: percentage(count, stats.total_events),
            }
        })
        .collect()
}

/// View model of the overview screen.
///
/// When the backend cannot deliver statistics the view shows a zeroed
/// snapshot and raises [`OverviewView::backend_unavailable`] instead of an
/// error state.
pub struct OverviewView {
    api: Arc<dyn WebhookApi>,
    stats: Option<WebhookStats>,
    backend_unavailable: bool,
    last_error: Option<String>,
}

impl OverviewView {
    pub fn new(api: Arc<dyn WebhookApi>) -> Self {
        Self {
            api,
            stats: None,
            backend_unavailable: false,
            last_error: None,
        }
    }

    /// Fetches the statistics snapshot.
    #[instrument(skip(self))]
    pub async fn load(&mut self) {
        let result = self.api.get_stats().await;
        self.finish_load(result);
    }

    /// Starts the statistics fetch in the background.
    ///
    /// The view is not touched until the result is handed to
    /// [`OverviewView::finish_load`]. Dropping the task cancels the request.
    pub fn start_load(&self) -> ViewTask<Result<WebhookStats, Error>> {
        let api = self.api.clone();
        ViewTask::spawn(async move { api.get_stats().await })
    }

    /// Folds a finished statistics fetch into the view.
    pub fn finish_load(&mut self, result: Result<WebhookStats, Error>) {
        match result {
            Ok(stats) => {
                info!(total_events = stats.total_events, "Loaded overview statistics");
                self.stats = Some(stats);
                self.backend_unavailable = false;
                self.last_error = None;
            }
            Err(e) => {
                warn!(error = %e, "Backend unavailable, showing fallback statistics");
                if self.stats.is_none() {
                    self.stats = Some(WebhookStats::default());
                }
                self.backend_unavailable = true;
                self.last_error = Some(e.to_string());
            }
        }
    }

    /// True until the first fetch has finished.
    pub fn is_loading(&self) -> bool {
        self.stats.is_none()
    }

    pub fn backend_unavailable(&self) -> bool {
        self.backend_unavailable
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Snapshot on screen; zeroed while loading.
    pub fn stats(&self) -> WebhookStats {
        self.stats.clone().unwrap_or_default()
    }

    pub fn stat_cards(&self) -> Vec<StatCard> {
        let stats = self.stats.as_ref().cloned().unwrap_or_default();
        vec![
            StatCard {
                title: "Total Events",
                value: stats.total_events.to_string(),
            },
            StatCard {
                title: "Successful",
                value: stats.successful_events.to_string(),
            },
            StatCard {
                title: "Failed",
                value: stats.failed_events.to_string(),
            },
            StatCard {
                title: "Avg Response Time",
                value: format!("{}ms", stats.average_response_time),
            },
        ]
    }

    pub fn status_breakdown(&self) -> Vec<StatusShare> {
        status_breakdown(&self.stats())
    }

    /// The newest events, at most [`OVERVIEW_RECENT_EVENTS`].
    pub fn recent_events(&self) -> Vec<WebhookEvent> {
        self.stats
            .as_ref()
            .map(|s| {
                s.recent_events
                    .iter()
                    .take(OVERVIEW_RECENT_EVENTS)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}
