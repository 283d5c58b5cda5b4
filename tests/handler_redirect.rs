mod common;

use axum::http::{StatusCode, header};
use axum_test::TestServer;
use chrono::{Duration, Utc};
use linkpulse::domain::entities::{DeviceType, LinkPatch};
use linkpulse::domain::repositories::LinkRepository;

const CHROME_DESKTOP: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[tokio::test]
async fn test_redirect_success() {
    let (state, repository, mut rx) = common::create_test_state();
    let link = common::create_test_link(&repository, "alice", "abc123", "https://example.com/a").await;
    let server = common::create_test_server(state);

    let response = server.get("/abc123").await;

    response.assert_status(StatusCode::FOUND);
    assert_eq!(
        response.header(header::LOCATION),
        "https://example.com/a"
    );

    let job = rx.recv().await.unwrap();
    assert_eq!(job.record_id, link.id);
    assert_eq!(job.event.ip, "127.0.0.1");
}

#[tokio::test]
async fn test_redirect_by_custom_slug() {
    let (state, repository, _rx) = common::create_test_state();
    let link = common::create_test_link(&repository, "alice", "abc123", "https://example.com/s").await;
    repository
        .update(
            link.id,
            LinkPatch {
                custom_slug: Some(Some("spring-sale".to_string())),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let server = common::create_test_server(state);

    let response = server.get("/spring-sale").await;
    response.assert_status(StatusCode::FOUND);
    assert_eq!(response.header(header::LOCATION), "https://example.com/s");

    // The generated code keeps working alongside the slug.
    server.get("/abc123").await.assert_status(StatusCode::FOUND);
}

#[tokio::test]
async fn test_redirect_not_found() {
    let (state, _repository, mut rx) = common::create_test_state();
    let server = common::create_test_server(state);

    let response = server.get("/nope00").await;

    response.assert_status_not_found();
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["error"]["code"], "not_found");
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_redirect_disabled_is_not_found() {
    let (state, repository, mut rx) = common::create_test_state();
    let link = common::create_test_link(&repository, "alice", "abc123", "https://example.com").await;
    repository
        .update(
            link.id,
            LinkPatch {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let server = common::create_test_server(state);

    let response = server.get("/abc123").await;

    response.assert_status_not_found();
    assert_eq!(response.json::<serde_json::Value>()["error"]["code"], "disabled");
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_redirect_expired_is_gone() {
    let (state, repository, mut rx) = common::create_test_state();
    let link = common::create_test_link(&repository, "alice", "abc123", "https://example.com").await;
    repository
        .update(
            link.id,
            LinkPatch {
                expires_at: Some(Some(Utc::now() - Duration::hours(1))),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let server = common::create_test_server(state);

    let response = server.get("/abc123").await;

    response.assert_status(StatusCode::GONE);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_redirect_captures_client_context() {
    let (state, repository, mut rx) = common::create_test_state();
    common::create_test_link(&repository, "alice", "abc123", "https://example.com").await;
    let server = common::create_test_server(state);

    server
        .get("/abc123")
        .add_header("User-Agent", CHROME_DESKTOP)
        .add_header("Referer", "https://news.example/post")
        .await
        .assert_status(StatusCode::FOUND);

    let job = rx.recv().await.unwrap();
    assert_eq!(job.event.device_type, DeviceType::Desktop);
    assert_eq!(job.event.browser, "Chrome");
    assert_eq!(job.event.referrer, "https://news.example/post");
}

#[tokio::test]
async fn test_redirect_survives_full_click_queue() {
    let (state, repository, _rx) = common::create_test_state_with_capacity(1);
    common::create_test_link(&repository, "alice", "abc123", "https://example.com").await;
    let server: TestServer = common::create_test_server(state);

    // Nothing drains the queue, so every redirect after the first drops its click.
    for _ in 0..5 {
        server.get("/abc123").await.assert_status(StatusCode::FOUND);
    }
}

#[tokio::test]
async fn test_redirect_survives_closed_click_queue() {
    let (state, repository, rx) = common::create_test_state();
    common::create_test_link(&repository, "alice", "abc123", "https://example.com").await;
    drop(rx);
    let server = common::create_test_server(state);

    server.get("/abc123").await.assert_status(StatusCode::FOUND);
}
