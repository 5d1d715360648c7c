//! Events monitor: filterable event list with CSV export.
//!
//! Filtering and export work on the list already fetched and never reach the
//! backend.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::SecondsFormat;
use tracing::{info, warn};
use webhook_client::models::{EventStatus, WebhookEvent};
use webhook_client::{Error, WebhookApi};

use crate::{Loadable, ViewTask};

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;

/// Header row of the CSV export.
pub const CSV_HEADER: [&str; 7] = [
    "ID",
    "URL",
    "Status",
    "Attempts",
    "Created At",
    "Response Time",
    "Error",
];

/// File name offered for the CSV export.
pub const CSV_FILE_NAME: &str = "webhook-events.csv";

/// Status selection of the monitor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(EventStatus),
}

impl StatusFilter {
    pub fn matches(&self, status: EventStatus) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => *wanted == status,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(status) => write!(f, "{status}"),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.parse::<EventStatus>().map(Self::Only)
    }
}

/// Search text and status selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Matched case-insensitively against the URL and the JSON payload
    pub search: String,
    pub status: StatusFilter,
}

impl EventFilter {
    pub fn matches(&self, event: &WebhookEvent) -> bool {
        if !self.status.matches(event.status) {
            return false;
        }
        let needle = self.search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        if event.url.to_lowercase().contains(&needle) {
            return true;
        }
        serde_json::to_string(&event.payload)
            .map(|payload| payload.to_lowercase().contains(&needle))
            .unwrap_or(false)
    }

    pub fn apply<'a>(&self, events: &'a [WebhookEvent]) -> Vec<&'a WebhookEvent> {
        events.iter().filter(|e| self.matches(e)).collect()
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Renders events as CSV, one row per event under [`CSV_HEADER`].
///
/// Fields containing a comma, quote or line break are quoted. A missing or
/// zero response time leaves its cell empty.
pub fn events_to_csv<'a, I>(events: I) -> String
where
    I: IntoIterator<Item = &'a WebhookEvent>,
{
    let mut lines = vec![CSV_HEADER.join(",")];
    for event in events {
        let row = [
            event.id.clone(),
            event.url.clone(),
            event.status.to_string(),
            event.attempts.to_string(),
            event.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            event
                .response_time
                .filter(|t| *t > 0)
                .map(|t| t.to_string())
                .unwrap_or_default(),
            event.error_message.clone().unwrap_or_default(),
        ];
        lines.push(
            row.iter()
                .map(|field| csv_field(field))
                .collect::<Vec<_>>()
                .join(","),
        );
    }
    lines.join("\n")
}

/// View model of the events monitor.
pub struct EventsMonitorView {
    api: Arc<dyn WebhookApi>,
    events: Loadable<Vec<WebhookEvent>>,
    pub filter: EventFilter,
    selected: Option<String>,
}

impl EventsMonitorView {
    pub fn new(api: Arc<dyn WebhookApi>) -> Self {
        Self {
            api,
            events: Loadable::Loading,
            filter: EventFilter::default(),
            selected: None,
        }
    }

    pub async fn load(&mut self) {
        let result = self.api.get_events().await;
        self.finish_load(result);
    }

    /// Starts the event fetch in the background. Dropping the task cancels
    /// the request and leaves the view as it was.
    pub fn start_load(&self) -> ViewTask<Result<Vec<WebhookEvent>, Error>> {
        let api = self.api.clone();
        ViewTask::spawn(async move { api.get_events().await })
    }

    pub fn finish_load(&mut self, result: Result<Vec<WebhookEvent>, Error>) {
        if let Err(e) = &result {
            warn!(error = %e, "Failed to fetch events");
        }
        self.events.apply(result);
    }

    pub fn events(&self) -> &Loadable<Vec<WebhookEvent>> {
        &self.events
    }

    /// Events passing the current filter.
    pub fn filtered(&self) -> Vec<&WebhookEvent> {
        match self.events.ready() {
            Some(events) => self.filter.apply(events),
            None => Vec::new(),
        }
    }

    /// Exports the filtered list.
    pub fn export_csv(&self) -> String {
        events_to_csv(self.filtered())
    }

    /// Selects an event for the detail pane. Unknown ids clear the selection.
    pub fn select(&mut self, id: &str) -> Option<&WebhookEvent> {
        let found = self
            .events
            .ready()
            .and_then(|events| events.iter().find(|e| e.id == id))
            .map(|e| e.id.clone());
        self.selected = found;
        self.selected()
    }

    pub fn selected(&self) -> Option<&WebhookEvent> {
        let id = self.selected.as_deref()?;
        self.events
            .ready()
            .and_then(|events| events.iter().find(|e| e.id == id))
    }

    /// Retries an event and re-fetches the list. A failure leaves the list
    /// untouched.
    pub async fn retry(&mut self, id: &str) -> Result<WebhookEvent, Error> {
        let event = self.api.retry_event(id).await?;
        info!(event_id = id, attempts = event.attempts, "Retry initiated");
        self.load().await;
        Ok(event)
    }
}
