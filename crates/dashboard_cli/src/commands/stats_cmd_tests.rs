use super::*;
use crate::output::OutputFormat;

#[tokio::test]
async fn test_stats_pretty_shows_rates_and_chart() {
    let context = Context::standalone(OutputFormat::Pretty);

    let output = execute(&context, TimeRange::Last24Hours).await.unwrap();

    assert!(output.contains("Success Rate"));
    assert!(output.contains("50%"));
    assert!(output.contains("Status distribution"));
    assert!(output.contains("Retrying"));
}

#[tokio::test]
async fn test_stats_json_reports_selected_range() {
    let context = Context::standalone(OutputFormat::Json);

    let output = execute(&context, TimeRange::Last30Days).await.unwrap();
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();

    assert_eq!(value["range"], "30d");
    assert_eq!(value["totalEvents"], 2);
    assert_eq!(value["successRate"], 50);
    assert_eq!(value["retryRate"], 0);
    assert_eq!(value["chart"][0]["label"], "Success");
    assert_eq!(value["chart"][0]["width_percent"], 100);
}
