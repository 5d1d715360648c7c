//! Terminal rendering shared by the commands.

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use colored::{ColoredString, Colorize};
use serde::Serialize;
use webhook_client::models::{EventStatus, WebhookEvent, WebhookSubscription};

use crate::errors::Error;

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;

/// How command results are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Pretty,
    /// Machine-readable JSON
    Json,
}

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, Error> {
    serde_json::to_string_pretty(value)
        .map_err(|e| Error::Config(format!("Failed to serialize output: {}", e)))
}

pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Status name padded to a fixed width and coloured.
pub fn status_label(status: EventStatus) -> ColoredString {
    let text = format!("{:<8}", status.as_str());
    match status {
        EventStatus::Success => text.green(),
        EventStatus::Failed => text.red(),
        EventStatus::Pending => text.yellow(),
        EventStatus::Retrying => text.cyan(),
    }
}

pub fn heading(text: &str) -> String {
    text.bold().to_string()
}

/// One row of an event table.
pub fn event_line(event: &WebhookEvent) -> String {
    format!(
        "{:<6} {} {:<5} {}/{}  {}  {}",
        event.id,
        status_label(event.status),
        event.method.as_str(),
        event.attempts,
        event.max_attempts,
        format_timestamp(&event.created_at),
        event.url
    )
}

pub fn event_table(events: &[&WebhookEvent]) -> String {
    if events.is_empty() {
        return "No events found".to_string();
    }
    let mut lines = vec![heading(&format!(
        "{:<6} {:<8} {:<5} {}  {:<19}  {}",
        "ID", "STATUS", "METHOD", "TRIES", "CREATED", "URL"
    ))];
    lines.extend(events.iter().map(|e| event_line(e)));
    lines.join("\n")
}

/// Full detail of one event, headers and payload included.
pub fn event_details(event: &WebhookEvent) -> Result<String, Error> {
    let mut lines = vec![
        heading(&format!("Event {}", event.id)),
        format!("  URL:           {}", event.url),
        format!("  Method:        {}", event.method),
        format!("  Status:        {}", status_label(event.status)),
        format!("  Attempts:      {}/{}", event.attempts, event.max_attempts),
        format!("  Created:       {}", format_timestamp(&event.created_at)),
        format!("  Updated:       {}", format_timestamp(&event.updated_at)),
    ];
    if let Some(ms) = event.response_time {
        lines.push(format!("  Response time: {}ms", ms));
    }
    if let Some(message) = &event.error_message {
        lines.push(format!("  Error:         {}", message.red()));
    }
    lines.push("  Headers:".to_string());
    if event.headers.is_empty() {
        lines.push("    (none)".to_string());
    }
    for (name, value) in &event.headers {
        lines.push(format!("    {}: {}", name, value));
    }
    lines.push("  Payload:".to_string());
    for line in to_json(&event.payload)?.lines() {
        lines.push(format!("    {}", line));
    }
    Ok(lines.join("\n"))
}

fn active_label(active: bool) -> ColoredString {
    if active {
        "active  ".green()
    } else {
        "inactive".dimmed()
    }
}

/// One row of a subscription table.
pub fn subscription_line(subscription: &WebhookSubscription) -> String {
    format!(
        "{:<6} {} {:<24} {}  [{}]",
        subscription.id,
        active_label(subscription.is_active),
        subscription.name,
        subscription.url,
        subscription.events.join(", ")
    )
}

pub fn subscription_table(subscriptions: &[WebhookSubscription]) -> String {
    if subscriptions.is_empty() {
        return "No subscriptions found".to_string();
    }
    let mut lines = vec![heading(&format!(
        "{:<6} {:<8} {:<24} {}  {}",
        "ID", "STATE", "NAME", "URL", "EVENTS"
    ))];
    lines.extend(subscriptions.iter().map(subscription_line));
    lines.join("\n")
}

pub fn subscription_details(subscription: &WebhookSubscription) -> String {
    [
        heading(&format!("Subscription {}", subscription.id)),
        format!("  Name:    {}", subscription.name),
        format!("  URL:     {}", subscription.url),
        format!("  State:   {}", active_label(subscription.is_active)),
        format!("  Events:  {}", subscription.events.join(", ")),
        format!("  Secret:  {}", subscription.secret),
        format!("  Created: {}", format_timestamp(&subscription.created_at)),
        format!("  Updated: {}", format_timestamp(&subscription.updated_at)),
    ]
    .join("\n")
}

/// Horizontal bar scaled to `width_percent` of `max_width` cells.
pub fn bar(width_percent: u64, max_width: usize) -> String {
    let cells = (width_percent.min(100) as usize * max_width + 50) / 100;
    "█".repeat(cells)
}

pub fn backend_unavailable_notice() -> String {
    "Backend unavailable: showing empty statistics"
        .yellow()
        .to_string()
}
