//! Statistics screen: rates, status chart and latest events.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};
use webhook_client::models::{EventStatus, WebhookEvent, WebhookStats};
use webhook_client::{Error, WebhookApi};

use crate::percentage;

#[cfg(test)]
#[path = "statistics_tests.rs"]
mod tests;

/// Number of events listed under "Recent Activity".
pub const STATISTICS_RECENT_EVENTS: usize = 8;

/// Time window selected on the statistics screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum TimeRange {
    #[serde(rename = "24h")]
    Last24Hours,
    #[default]
    #[serde(rename = "7d")]
    Last7Days,
    #[serde(rename = "30d")]
    Last30Days,
}

impl TimeRange {
    pub const ALL: [TimeRange; 3] = [
        TimeRange::Last24Hours,
        TimeRange::Last7Days,
        TimeRange::Last30Days,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Last24Hours => "24h",
            Self::Last7Days => "7d",
            Self::Last30Days => "30d",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Last24Hours => "Last 24 Hours",
            Self::Last7Days => "Last 7 Days",
            Self::Last30Days => "Last 30 Days",
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "24h" => Ok(Self::Last24Hours),
            "7d" => Ok(Self::Last7Days),
            "30d" => Ok(Self::Last30Days),
            other => Err(Error::Validation(format!(
                "Unknown time range '{other}', expected 24h, 7d or 30d"
            ))),
        }
    }
}

/// One bar of the status distribution chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartBar {
    pub label: &'static str,
    pub value: u64,
    /// Width relative to the largest bar, 0 to 100
    pub width_percent: u64,
}

/// View model of the statistics screen.
pub struct StatisticsView {
    api: Arc<dyn WebhookApi>,
    range: TimeRange,
    stats: Option<WebhookStats>,
    backend_unavailable: bool,
}

impl StatisticsView {
    pub fn new(api: Arc<dyn WebhookApi>) -> Self {
        Self {
            api,
            range: TimeRange::default(),
            stats: None,
            backend_unavailable: false,
        }
    }

    pub async fn load(&mut self) {
        match self.api.get_stats().await {
            Ok(stats) => {
                debug!(range = %self.range, "Loaded statistics");
                self.stats = Some(stats);
                self.backend_unavailable = false;
            }
            Err(e) => {
                warn!(error = %e, range = %self.range, "Backend unavailable, showing fallback statistics");
                if self.stats.is_none() {
                    self.stats = Some(WebhookStats::default());
                }
                self.backend_unavailable = true;
            }
        }
    }

    /// Selects a time range and fetches again.
    pub async fn select_range(&mut self, range: TimeRange) {
        self.range = range;
        self.load().await;
    }

    pub fn range(&self) -> TimeRange {
        self.range
    }

    pub fn is_loading(&self) -> bool {
        self.stats.is_none()
    }

    pub fn backend_unavailable(&self) -> bool {
        self.backend_unavailable
    }

    pub fn stats(&self) -> WebhookStats {
        self.stats.clone().unwrap_or_default()
    }

    /// Successful events as a rounded percentage of all events.
    pub fn success_rate(&self) -> u64 {
        let stats = self.stats();
        percentage(stats.successful_events, stats.total_events)
    }

    /// Events currently retrying as a rounded percentage of all events.
    pub fn retry_rate(&self) -> u64 {
        let stats = self.stats();
        percentage(stats.events_by_status.retrying, stats.total_events)
    }

    pub fn chart(&self) -> Vec<ChartBar> {
        let counts = self.stats().events_by_status;
        let bars = [
            ("Success", counts.get(EventStatus::Success)),
            ("Failed", counts.get(EventStatus::Failed)),
            ("Pending", counts.get(EventStatus::Pending)),
            ("Retrying", counts.get(EventStatus::Retrying)),
        ];
        let max = bars.iter().map(|(_, v)| *v).max().unwrap_or(0);

        bars.into_iter()
            .map(|(label, value)| ChartBar {
                label,
                value,
                width_percent: percentage(value, max),
            })
            .collect()
    }

    pub fn recent_events(&self) -> Vec<WebhookEvent> {
        self.stats
            .as_ref()
            .map(|s| {
                s.recent_events
                    .iter()
                    .take(STATISTICS_RECENT_EVENTS)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}
