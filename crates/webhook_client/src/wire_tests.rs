use super::*;
use chrono::TimeZone;
use serde_json::json;

fn backend_event_json() -> Value {
    json!({
        "id": 42,
        "url": "https://api.example.com/webhooks/user-created",
        "method": "POST",
        "headers": "{\"Content-Type\":\"application/json\",\"X-Trace\":\"abc\"}",
        "payload": "{\"event\":\"user.created\",\"data\":{\"userId\":123}}",
        "status": "FAILED",
        "attempts": 2,
        "maxAttempts": 3,
        "responseTime": 5000,
        "errorMessage": "Connection timeout",
        "createdAt": "2025-01-27T10:30:00.123456",
        "updatedAt": "2025-01-27T10:35:00"
    })
}

#[test]
fn test_resource_id_accepts_numbers_and_strings() {
    let numeric: ResourceId = serde_json::from_value(json!(17)).unwrap();
    let textual: ResourceId = serde_json::from_value(json!("evt_17")).unwrap();

    assert_eq!(numeric.as_str(), "17");
    assert_eq!(textual.as_str(), "evt_17");
}

#[test]
fn test_resource_id_serializes_numeric_ids_as_numbers() {
    assert_eq!(serde_json::to_value(ResourceId::from("17")).unwrap(), json!(17));
    assert_eq!(
        serde_json::to_value(ResourceId::from("evt_17")).unwrap(),
        json!("evt_17")
    );
}

#[test]
fn test_parse_timestamp_accepts_zone_less_and_rfc3339() {
    let expected = Utc.with_ymd_and_hms(2025, 1, 27, 10, 30, 0).unwrap();

    assert_eq!(parse_timestamp("2025-01-27T10:30:00").unwrap(), expected);
    assert_eq!(parse_timestamp("2025-01-27T10:30:00Z").unwrap(), expected);
    assert_eq!(parse_timestamp("2025-01-27T12:30:00+02:00").unwrap(), expected);
    assert!(parse_timestamp("yesterday").unwrap_err().is_transport());
}

#[test]
fn test_format_backend_timestamp_has_no_zone() {
    let at = Utc.with_ymd_and_hms(2025, 1, 27, 10, 30, 0).unwrap();
    let formatted = format_backend_timestamp(&at);

    assert_eq!(formatted, "2025-01-27T10:30:00.000000");
    assert_eq!(parse_timestamp(&formatted).unwrap(), at);
}

#[test]
fn test_decode_headers_treats_blank_and_null_as_empty() {
    assert!(decode_headers(None).unwrap().is_empty());
    assert!(decode_headers(Some("")).unwrap().is_empty());
    assert!(decode_headers(Some("null")).unwrap().is_empty());
}

#[test]
fn test_decode_headers_rejects_malformed_text() {
    let error = decode_headers(Some("{not json")).unwrap_err();
    assert!(error.is_transport());
}

#[test]
fn test_decode_payload_keeps_non_json_text() {
    assert_eq!(decode_payload(None), Value::Null);
    assert_eq!(decode_payload(Some("  ")), Value::Null);
    assert_eq!(decode_payload(Some("plain text")), json!("plain text"));
    assert_eq!(decode_payload(Some("[1,2]")), json!([1, 2]));
}

#[test]
fn test_event_resource_decodes_backend_shape() {
    let resource: EventResource = serde_json::from_value(backend_event_json()).unwrap();
    let event = resource.into_event().unwrap();

    assert_eq!(event.id, "42");
    assert_eq!(event.method, HttpMethod::Post);
    assert_eq!(event.status, EventStatus::Failed);
    assert_eq!(event.headers["X-Trace"], "abc");
    assert_eq!(event.payload["data"]["userId"], 123);
    assert_eq!(event.attempts, 2);
    assert_eq!(event.response_time, Some(5000));
    assert_eq!(event.error_message.as_deref(), Some("Connection timeout"));
    assert!(event.updated_at > event.created_at);
}

#[test]
fn test_event_resource_fills_missing_counters() {
    let resource: EventResource = serde_json::from_value(json!({
        "id": "1",
        "url": "https://example.com",
        "createdAt": "2025-01-27T10:30:00"
    }))
    .unwrap();

    let event = resource.into_event().unwrap();

    assert_eq!(event.status, EventStatus::Pending);
    assert_eq!(event.method, HttpMethod::Post);
    assert_eq!(event.attempts, 0);
    assert_eq!(event.max_attempts, DEFAULT_MAX_ATTEMPTS);
    assert_eq!(event.updated_at, event.created_at);
    assert!(event.headers.is_empty());
    assert_eq!(event.payload, Value::Null);
}

#[test]
fn test_event_resource_requires_id() {
    let mut body = backend_event_json();
    body.as_object_mut().unwrap().remove("id");
    let resource: EventResource = serde_json::from_value(body).unwrap();

    assert!(resource.into_event().unwrap_err().is_transport());
}

#[test]
fn test_event_resource_rejects_unknown_status() {
    let mut body = backend_event_json();
    body["status"] = json!("LOST");
    let resource: EventResource = serde_json::from_value(body).unwrap();

    assert!(resource.into_event().unwrap_err().is_transport());
}

#[test]
fn test_event_resource_from_draft_double_encodes() {
    let draft = EventDraft::new("https://example.com/hook", HttpMethod::Put)
        .with_header("Content-Type", "application/json")
        .with_payload(json!({"event": "test", "data": {}}));

    let body = serde_json::to_value(EventResource::from_draft(&draft).unwrap()).unwrap();

    assert_eq!(body["method"], "PUT");
    assert_eq!(body["maxAttempts"], 3);
    let headers = body["headers"].as_str().unwrap();
    let payload = body["payload"].as_str().unwrap();
    assert_eq!(
        serde_json::from_str::<Value>(headers).unwrap(),
        json!({"Content-Type": "application/json"})
    );
    assert_eq!(
        serde_json::from_str::<Value>(payload).unwrap(),
        json!({"event": "test", "data": {}})
    );
    assert!(body.get("id").is_none());
    assert!(body.get("status").is_none());
}

fn sample_payloads() -> Vec<Value> {
    vec![
        Value::Null,
        json!(true),
        json!(false),
        json!(0),
        json!(-17),
        json!(u64::MAX),
        json!(12.5),
        json!(0.1),
        json!(""),
        json!("plain text"),
        json!("{\"looks\": \"like json\"}"),
        json!("null"),
        json!([]),
        json!([1, "two", null, {"three": 3}]),
        json!({}),
        json!({"event": "order.paid", "data": {"items": [{"sku": "A-1", "qty": 2}], "note": null}}),
    ]
}

fn sample_header_maps() -> Vec<BTreeMap<String, String>> {
    let map = |pairs: &[(&str, &str)]| {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<BTreeMap<_, _>>()
    };
    vec![
        BTreeMap::new(),
        map(&[("X-Empty", "")]),
        map(&[("X-Null", "null")]),
        map(&[("Content-Type", "application/json"), ("X-Quote", "say \"hi\"")]),
        map(&[("X-Json", "{\"a\":1}"), ("X-Unicode", "caf\u{e9}")]),
    ]
}

#[test]
fn test_payload_encoding_is_lossless() {
    for payload in sample_payloads() {
        let encoded = encode_payload(&payload).unwrap();
        assert_eq!(decode_payload(Some(&encoded)), payload, "payload {payload}");
    }
}

#[test]
fn test_header_encoding_is_lossless() {
    for headers in sample_header_maps() {
        let encoded = encode_headers(&headers).unwrap();
        assert_eq!(decode_headers(Some(&encoded)).unwrap(), headers, "headers {encoded}");
    }
}

#[test]
fn test_draft_survives_the_wire() {
    for (payload, headers) in sample_payloads()
        .into_iter()
        .zip(sample_header_maps().into_iter().cycle())
    {
        let mut draft = EventDraft::new("https://example.com/hook", HttpMethod::Patch)
            .with_payload(payload.clone());
        draft.headers = headers.clone();

        let body = serde_json::to_string(&EventResource::from_draft(&draft).unwrap()).unwrap();
        let received: EventResource = serde_json::from_str(&body).unwrap();
        let decoded = received.into_draft().unwrap();

        assert_eq!(decoded.payload, payload);
        assert_eq!(decoded.headers, headers);
    }
}

#[test]
fn test_event_resource_from_event_uses_backend_conventions() {
    let resource: EventResource = serde_json::from_value(backend_event_json()).unwrap();
    let event = resource.into_event().unwrap();

    let body = serde_json::to_value(EventResource::from_event(&event).unwrap()).unwrap();

    assert_eq!(body["id"], 42);
    assert_eq!(body["status"], "FAILED");
    assert_eq!(body["createdAt"], "2025-01-27T10:30:00.123456");
}

#[test]
fn test_event_resource_into_draft_requires_url() {
    let resource = EventResource {
        method: Some("POST".to_string()),
        ..Default::default()
    };

    assert!(matches!(resource.into_draft(), Err(Error::Validation(_))));
}

#[test]
fn test_subscription_resource_normalizes_events() {
    let resource: SubscriptionResource = serde_json::from_value(json!({
        "id": 1,
        "name": "User Events",
        "url": "https://example.com/users",
        "events": ["user.created", " user.created ", "", "user.updated"],
        "secret": "webhook_secret_123",
        "isActive": false,
        "createdAt": "2025-01-20T08:00:00"
    }))
    .unwrap();

    let subscription = resource.into_subscription().unwrap();

    assert_eq!(subscription.id, "1");
    assert_eq!(subscription.events, vec!["user.created", "user.updated"]);
    assert!(!subscription.is_active);
}

#[test]
fn test_subscription_resource_from_update_is_sparse() {
    let update = SubscriptionUpdate::default().active(false);

    let body = serde_json::to_value(SubscriptionResource::from_update(&update)).unwrap();

    assert_eq!(body, json!({"isActive": false}));
}

#[test]
fn test_stats_resource_is_lenient() {
    let resource: StatsResource = serde_json::from_value(json!({
        "totalEvents": "12",
        "successfulEvents": 9,
        "failedEvents": null,
        "averageResponseTime": 245.6,
        "eventsByStatus": {"SUCCESS": 9, "failed": 2, "pending": "1", "bogus": 4},
        "recentEvents": [backend_event_json(), {"id": 3}]
    }))
    .unwrap();

    let stats = resource.into_stats();

    assert_eq!(stats.total_events, 12);
    assert_eq!(stats.successful_events, 9);
    assert_eq!(stats.failed_events, 0);
    assert_eq!(stats.average_response_time, 246);
    assert_eq!(stats.events_by_status.success, 9);
    assert_eq!(stats.events_by_status.failed, 2);
    assert_eq!(stats.events_by_status.pending, 1);
    assert_eq!(stats.events_by_status.retrying, 0);
    assert_eq!(stats.recent_events.len(), 1);
}

#[test]
fn test_stats_resource_empty_object_is_zeroed() {
    let resource: StatsResource = serde_json::from_value(json!({})).unwrap();
    assert_eq!(resource.into_stats(), WebhookStats::default());
}

#[test]
fn test_admin_resource_decodes_upper_case_role() {
    let resource: AdminResource = serde_json::from_value(json!({
        "id": 1,
        "email": "admin@webhook.com",
        "name": "Admin User",
        "role": "ADMIN",
        "createdAt": "2025-01-01T00:00:00",
        "lastLogin": null
    }))
    .unwrap();

    let admin = resource.into_admin().unwrap();

    assert_eq!(admin.role, AdminRole::Admin);
    assert_eq!(admin.last_login, None);
}

#[test]
fn test_page_resource_uses_spring_field_names() {
    let resource: PageResource = serde_json::from_value(json!({
        "content": [backend_event_json()],
        "totalElements": 21,
        "totalPages": 3,
        "number": 1,
        "size": 10
    }))
    .unwrap();

    let page = resource.into_page().unwrap();

    assert_eq!(page.content.len(), 1);
    assert_eq!(page.total_elements, 21);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.number, 1);
}
