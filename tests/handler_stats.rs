mod common;

use axum::http::StatusCode;
use chrono::{TimeZone, Utc};
use linkpulse::domain::entities::{ClickContext, ClickEvent, DeviceType};
use linkpulse::domain::repositories::LinkRepository;
use serde_json::Value;

fn click(day: u32, ip: &str, device_type: DeviceType, browser: &str) -> ClickEvent {
    ClickEvent::new(
        Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap(),
        ClickContext {
            ip: ip.to_string(),
            device_type,
            browser: browser.to_string(),
            os: "Windows 10".to_string(),
            country: "unknown".to_string(),
            referrer: String::new(),
        },
    )
}

#[tokio::test]
async fn test_stats_full_history() {
    let (state, repository, _rx) = common::create_test_state();
    let link = common::create_test_link(&repository, "alice", "abc123", "https://example.com").await;
    for (day, ip, device, browser) in [
        (1, "10.0.0.1", DeviceType::Desktop, "Chrome"),
        (1, "10.0.0.1", DeviceType::Desktop, "Chrome"),
        (2, "10.0.0.2", DeviceType::Mobile, "Safari"),
        (3, "10.0.0.3", DeviceType::Desktop, "Firefox"),
    ] {
        repository
            .record_click(link.id, click(day, ip, device, browser))
            .await
            .unwrap();
    }
    let server = common::create_test_server(state);

    let response = server
        .get(&format!("/api/links/{}/stats", link.id))
        .authorization_bearer(common::token_for("alice"))
        .await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["id"], link.id);
    assert_eq!(body["short_code"], "abc123");
    assert_eq!(body["click_count"], 4);
    assert_eq!(body["total_clicks"], 4);
    assert_eq!(body["unique_visitors"], 3);
    assert_eq!(body["device_types"]["desktop"], 3);
    assert_eq!(body["device_types"]["mobile"], 1);
    assert!(body["device_types"].get("tablet").is_none());
    assert_eq!(body["browsers"]["Chrome"], 2);
    assert_eq!(body["clicks_by_date"]["2024-01-01"], 2);
    assert_eq!(body["clicks_by_date"]["2024-01-03"], 1);
    assert_eq!(body["recent_clicks"].as_array().unwrap().len(), 4);
    assert_eq!(body["recent_clicks"][0]["ip"], "10.0.0.3");
}

#[tokio::test]
async fn test_stats_date_window() {
    let (state, repository, _rx) = common::create_test_state();
    let link = common::create_test_link(&repository, "alice", "abc123", "https://example.com").await;
    for day in 1..=3 {
        repository
            .record_click(link.id, click(day, "10.0.0.1", DeviceType::Desktop, "Chrome"))
            .await
            .unwrap();
    }
    let server = common::create_test_server(state);

    let response = server
        .get(&format!(
            "/api/links/{}/stats?start_date=2024-01-02&end_date=2024-01-02",
            link.id
        ))
        .authorization_bearer(common::token_for("alice"))
        .await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["total_clicks"], 1);
    assert_eq!(body["click_count"], 3);
    let by_date = body["clicks_by_date"].as_object().unwrap();
    assert_eq!(by_date.len(), 1);
    assert_eq!(by_date["2024-01-02"], 1);

    // An inverted window matches nothing.
    let response = server
        .get(&format!(
            "/api/links/{}/stats?start_date=2024-01-03&end_date=2024-01-01",
            link.id
        ))
        .authorization_bearer(common::token_for("alice"))
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["total_clicks"], 0);
}

#[tokio::test]
async fn test_stats_invalid_date() {
    let (state, repository, _rx) = common::create_test_state();
    let link = common::create_test_link(&repository, "alice", "abc123", "https://example.com").await;
    let server = common::create_test_server(state);

    server
        .get(&format!("/api/links/{}/stats?start_date=yesterday", link.id))
        .authorization_bearer(common::token_for("alice"))
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn test_stats_ownership() {
    let (state, repository, _rx) = common::create_test_state();
    let link = common::create_test_link(&repository, "alice", "abc123", "https://example.com").await;
    let server = common::create_test_server(state);

    server
        .get(&format!("/api/links/{}/stats", link.id))
        .authorization_bearer(common::token_for("bob"))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    server
        .get(&format!("/api/links/{}/stats", link.id + 1))
        .authorization_bearer(common::token_for("alice"))
        .await
        .assert_status_not_found();

    server
        .get(&format!("/api/links/{}/stats", link.id))
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn test_stats_no_clicks() {
    let (state, repository, _rx) = common::create_test_state();
    let link = common::create_test_link(&repository, "alice", "abc123", "https://example.com").await;
    let server = common::create_test_server(state);

    let response = server
        .get(&format!("/api/links/{}/stats", link.id))
        .authorization_bearer(common::token_for("alice"))
        .await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["total_clicks"], 0);
    assert_eq!(body["unique_visitors"], 0);
    assert!(body["device_types"].as_object().unwrap().is_empty());
    assert!(body["recent_clicks"].as_array().unwrap().is_empty());
}
