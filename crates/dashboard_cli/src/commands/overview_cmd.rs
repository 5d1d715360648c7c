use dashboard_core::{OverviewView, StatCard, StatusShare};
use serde::Serialize;
use tracing::instrument;
use webhook_client::models::WebhookEvent;

use crate::commands::{finish, Context};
use crate::errors::Error;
use crate::output::{backend_unavailable_notice, event_line, heading, status_label, to_json};

#[cfg(test)]
#[path = "overview_cmd_tests.rs"]
mod tests;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OverviewReport {
    backend_unavailable: bool,
    cards: Vec<StatCard>,
    status_breakdown: Vec<StatusShare>,
    recent_events: Vec<WebhookEvent>,
}

/// Execute the overview command
#[instrument(skip(context))]
pub async fn execute(context: &Context) -> Result<String, Error> {
    let mut view = OverviewView::new(context.api.clone());
    let stats = finish(view.start_load()).await?;
    view.finish_load(stats);

    let report = OverviewReport {
        backend_unavailable: view.backend_unavailable(),
        cards: view.stat_cards(),
        status_breakdown: view.status_breakdown(),
        recent_events: view.recent_events(),
    };
    if context.is_json() {
        return to_json(&report);
    }

    let mut lines = vec![heading("Webhook Dashboard")];
    if report.backend_unavailable {
        lines.push(backend_unavailable_notice());
    }
    lines.push(String::new());
    for card in &report.cards {
        lines.push(format!("  {:<18} {}", card.title, card.value));
    }

    lines.push(String::new());
    lines.push(heading("Events by status"));
    for share in &report.status_breakdown {
        lines.push(format!(
            "  {} {:>6}  {:>3}%",
            status_label(share.status),
            share.count,
            share.percent
        ));
    }

    lines.push(String::new());
    lines.push(heading("Recent events"));
    if report.recent_events.is_empty() {
        lines.push("  No events yet".to_string());
    }
    for event in &report.recent_events {
        lines.push(format!("  {}", event_line(event)));
    }
    Ok(lines.join("\n"))
}
