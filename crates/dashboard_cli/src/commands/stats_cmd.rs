use dashboard_core::{ChartBar, StatisticsView, TimeRange};
use serde::Serialize;
use tracing::instrument;
use webhook_client::models::WebhookEvent;

use crate::commands::Context;
use crate::errors::Error;
use crate::output::{backend_unavailable_notice, bar, event_line, heading, to_json};

#[cfg(test)]
#[path = "stats_cmd_tests.rs"]
mod tests;

const BAR_WIDTH: usize = 30;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatisticsReport {
    range: TimeRange,
    backend_unavailable: bool,
    total_events: u64,
    success_rate: u64,
    retry_rate: u64,
    average_response_time: u64,
    chart: Vec<ChartBar>,
    recent_events: Vec<WebhookEvent>,
}

/// Execute the stats command
#[instrument(skip(context))]
pub async fn execute(context: &Context, range: TimeRange) -> Result<String, Error> {
    let mut view = StatisticsView::new(context.api.clone());
    view.select_range(range).await;

    let stats = view.stats();
    let report = StatisticsReport {
        range: view.range(),
        backend_unavailable: view.backend_unavailable(),
        total_events: stats.total_events,
        success_rate: view.success_rate(),
        retry_rate: view.retry_rate(),
        average_response_time: stats.average_response_time,
        chart: view.chart(),
        recent_events: view.recent_events(),
    };
    if context.is_json() {
        return to_json(&report);
    }

    let mut lines = vec![heading(&format!("Statistics ({})", report.range.label()))];
    if report.backend_unavailable {
        lines.push(backend_unavailable_notice());
    }
    lines.push(String::new());
    lines.push(format!("  {:<18} {}", "Total Events", report.total_events));
    lines.push(format!("  {:<18} {}%", "Success Rate", report.success_rate));
    lines.push(format!("  {:<18} {}%", "Retry Rate", report.retry_rate));
    lines.push(format!(
        "  {:<18} {}ms",
        "Avg Response Time", report.average_response_time
    ));

    lines.push(String::new());
    lines.push(heading("Status distribution"));
    for chart_bar in &report.chart {
        lines.push(format!(
            "  {:<9} {:>6} {}",
            chart_bar.label,
            chart_bar.value,
            bar(chart_bar.width_percent, BAR_WIDTH)
        ));
    }

    lines.push(String::new());
    lines.push(heading("Recent activity"));
    if report.recent_events.is_empty() {
        lines.push("  No events yet".to_string());
    }
    for event in &report.recent_events {
        lines.push(format!("  {}", event_line(event)));
    }
    Ok(lines.join("\n"))
}
