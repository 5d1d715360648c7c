//! Event commands: the publisher and events monitor screens.
//!
//! ```bash
//! webhook-dashboard events list --status failed --search orders
//! webhook-dashboard events publish --url https://api.example.com/hook --method PUT
//! webhook-dashboard events retry 42
//! webhook-dashboard events export --output failed.csv --status failed
//! ```

use std::fs;

use clap::Subcommand;
use dashboard_core::monitor::CSV_FILE_NAME;
use dashboard_core::{EventFilter, EventsMonitorView, PublisherView, StatusFilter};
use tracing::{info, instrument};
use webhook_client::models::{HttpMethod, PageQuery};

use crate::commands::{confirm, finish, loaded, Context};
use crate::errors::Error;
use crate::output::{event_details, event_table, to_json};

#[cfg(test)]
#[path = "events_cmd_tests.rs"]
mod tests;

/// Subcommands for the events command
#[derive(Subcommand, Debug, Clone)]
pub enum EventsCommands {
    /// List events, newest first
    List {
        /// Text matched against the URL and payload, ignoring case
        #[arg(long)]
        search: Option<String>,

        /// Status to show: all, pending, success, failed or retrying
        #[arg(long, default_value = "all")]
        status: StatusFilter,

        /// Fetch this zero-based page from the backend instead of the full list
        #[arg(long)]
        page: Option<u32>,

        /// Page size used with --page
        #[arg(long, default_value_t = 10)]
        size: u32,
    },

    /// Show one event with its headers and payload
    Show {
        /// Event id
        id: String,
    },

    /// Publish a new event
    Publish {
        /// Target URL
        #[arg(long)]
        url: String,

        /// HTTP method: POST, PUT or PATCH
        #[arg(long, default_value = "POST")]
        method: HttpMethod,

        /// Headers as a JSON object
        #[arg(long)]
        headers: Option<String>,

        /// Payload as JSON
        #[arg(long)]
        payload: Option<String>,
    },

    /// Retry a failed event
    Retry {
        /// Event id
        id: String,
    },

    /// Delete an event
    Delete {
        /// Event id
        id: String,

        /// Do not ask for confirmation
        #[arg(long)]
        yes: bool,
    },

    /// Export the filtered event list as CSV
    Export {
        /// File to write, `-` prints to stdout
        #[arg(short, long, default_value = CSV_FILE_NAME)]
        output: String,

        /// Text matched against the URL and payload, ignoring case
        #[arg(long)]
        search: Option<String>,

        /// Status to export: all, pending, success, failed or retrying
        #[arg(long, default_value = "all")]
        status: StatusFilter,
    },
}

/// Execute the events command
#[instrument(skip(context))]
pub async fn execute(cmd: EventsCommands, context: &Context) -> Result<String, Error> {
    match cmd {
        EventsCommands::List {
            search,
            status,
            page: Some(page),
            size,
        } => list_page(context, page, size, status, search).await,
        EventsCommands::List { search, status, .. } => list_events(context, search, status).await,
        EventsCommands::Show { id } => show_event(context, &id).await,
        EventsCommands::Publish {
            url,
            method,
            headers,
            payload,
        } => publish_event(context, url, method, headers, payload).await,
        EventsCommands::Retry { id } => retry_event(context, &id).await,
        EventsCommands::Delete { id, yes } => delete_event(context, &id, yes).await,
        EventsCommands::Export {
            output,
            search,
            status,
        } => export_events(context, &output, search, status).await,
    }
}

fn filter(search: Option<String>, status: StatusFilter) -> EventFilter {
    EventFilter {
        search: search.unwrap_or_default(),
        status,
    }
}

async fn list_events(
    context: &Context,
    search: Option<String>,
    status: StatusFilter,
) -> Result<String, Error> {
    let mut view = EventsMonitorView::new(context.api.clone());
    view.filter = filter(search, status);
    let events = finish(view.start_load()).await?;
    view.finish_load(events);
    loaded(view.events())?;

    let events = view.filtered();
    if context.is_json() {
        return to_json(&events);
    }
    Ok(event_table(&events))
}

async fn list_page(
    context: &Context,
    page: u32,
    size: u32,
    status: StatusFilter,
    search: Option<String>,
) -> Result<String, Error> {
    let query = PageQuery {
        page,
        size,
        status: match status {
            StatusFilter::All => None,
            StatusFilter::Only(status) => Some(status),
        },
        search,
    };
    let result = context.api.get_events_page(&query).await?;
    if context.is_json() {
        return to_json(&result);
    }

    let events: Vec<_> = result.content.iter().collect();
    Ok(format!(
        "{}\nPage {} of {} ({} events)",
        event_table(&events),
        result.number + 1,
        result.total_pages.max(1),
        result.total_elements
    ))
}

async fn show_event(context: &Context, id: &str) -> Result<String, Error> {
    let event = context.api.get_event(id).await?;
    if context.is_json() {
        return to_json(&event);
    }
    event_details(&event)
}

async fn publish_event(
    context: &Context,
    url: String,
    method: HttpMethod,
    headers: Option<String>,
    payload: Option<String>,
) -> Result<String, Error> {
    let mut view = PublisherView::new(context.api.clone());
    view.form.url = url;
    view.form.method = method;
    if let Some(headers) = headers {
        view.form.headers = headers;
    }
    if let Some(payload) = payload {
        view.form.payload = payload;
    }

    let event = view.publish().await?;
    if context.is_json() {
        return to_json(&event);
    }
    Ok(format!("Published event {}\n{}", event.id, event_details(&event)?))
}

async fn retry_event(context: &Context, id: &str) -> Result<String, Error> {
    let mut view = EventsMonitorView::new(context.api.clone());
    let event = view.retry(id).await?;
    if context.is_json() {
        return to_json(&event);
    }
    Ok(format!(
        "Retry initiated for event {} (attempt {} of {}, status {})",
        event.id, event.attempts, event.max_attempts, event.status
    ))
}

async fn delete_event(context: &Context, id: &str, yes: bool) -> Result<String, Error> {
    if !yes && !confirm(&format!("Delete event {}?", id))? {
        return Err(Error::Cancelled);
    }
    context.api.delete_event(id).await?;
    info!(event_id = id, "Event deleted");
    Ok(format!("Deleted event {}", id))
}

async fn export_events(
    context: &Context,
    output: &str,
    search: Option<String>,
    status: StatusFilter,
) -> Result<String, Error> {
    let mut view = EventsMonitorView::new(context.api.clone());
    view.filter = filter(search, status);
    let events = finish(view.start_load()).await?;
    view.finish_load(events);
    loaded(view.events())?;

    let csv = view.export_csv();
    if output == "-" {
        return Ok(csv);
    }

    fs::write(output, &csv).map_err(|source| Error::WriteFile {
        path: output.to_string(),
        source,
    })?;
    let count = view.filtered().len();
    info!(path = output, count, "Exported events");
    Ok(format!("Exported {} events to {}", count, output))
}
