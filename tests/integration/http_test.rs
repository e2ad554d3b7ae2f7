//! HTTP adapter and health checks.

use axum::http::StatusCode;
use serde_json::json;

use stayhub_core::types::UserId;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::spawn().await;
    let mut client = app.connect(Some("u1")).await;
    assert!(client.barrier().await.is_empty());

    let response = app.request("GET", "/health", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert_eq!(response.body["database"], "connected");
    assert_eq!(response.body["onlineUsers"], 1);
    assert_eq!(app.state.realtime.connections.connection_count(), 1);
    assert!(response.body["realtime"]["connectionsOpened"].as_u64().unwrap_or(0) >= 1);
}

#[tokio::test]
async fn test_send_notification_without_user_is_bad_request() {
    let app = TestApp::spawn().await;

    let response = app
        .request(
            "POST",
            "/send-notification",
            Some(json!({"title": "Booking confirmed", "body": "Pack your bags"})),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION");
}

#[tokio::test]
async fn test_send_notification_reaches_user_room() {
    let app = TestApp::spawn().await;
    let mut user = app.connect(Some("u1")).await;
    let mut other = app.connect(Some("u2")).await;
    assert!(user.barrier().await.is_empty());

    let response = app
        .request(
            "POST",
            "/send-notification",
            Some(json!({
                "userId": "u1",
                "title": "Payout Processed",
                "body": "",
                "click_action": "/payouts"
            })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["stored"], true);

    let data = user.expect("notification").await;
    assert_eq!(data["title"], "Payout Processed");
    assert_eq!(data["link"], "/payouts");
    assert_eq!(data["id"], response.body["data"]["notification"]["id"]);

    assert!(other.barrier().await.is_empty());

    let stored = app.gateway.notifications_for(&UserId::new("u1")).await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].icon, "/images/notification-icon.png");
}
