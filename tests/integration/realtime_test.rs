//! Socket scenarios against a live server.

use serde_json::json;

use stayhub_core::types::{ConversationBookingId, ConversationId, UserId};

use crate::helpers::{BOOKING, TestApp};

fn send_message(sender: &str, text: &str) -> serde_json::Value {
    json!({"senderId": sender, "text": text, "conversationBookingId": BOOKING})
}

#[tokio::test]
async fn test_hi_there_reaches_admin_and_room_in_order() {
    let app = TestApp::spawn().await;
    let mut admin = app.connect(None).await;
    let mut guest = app.connect(Some("u1")).await;
    let mut host = app.connect(Some("u2")).await;

    admin.join_admin().await;
    guest.join_conversation(BOOKING).await;
    host.join_conversation(BOOKING).await;

    guest.emit("sendMessage", send_message("u1", "hi")).await;
    assert_eq!(host.expect("message").await["text"], "hi");

    host.emit("sendMessage", send_message("u2", "there")).await;
    assert_eq!(host.expect("message").await["text"], "there");

    for client in [&mut admin, &mut guest] {
        assert_eq!(client.expect("message").await["text"], "hi");
        assert_eq!(client.expect("message").await["text"], "there");
    }

    let conversation = app
        .gateway
        .conversation(&ConversationId::new("c1"))
        .await
        .unwrap();
    let messages = app
        .gateway
        .messages_in(&ConversationBookingId::new(BOOKING))
        .await;
    assert_eq!(messages.len(), 2);
    assert_eq!(conversation.last_message_id, Some(messages[1].id.clone()));
    assert_eq!(messages[1].text, "there");
}

#[tokio::test]
async fn test_message_payload_is_hydrated() {
    let app = TestApp::spawn().await;
    let mut guest = app.connect(Some("u1")).await;
    guest.join_conversation(BOOKING).await;

    guest.emit("sendMessage", send_message("u1", "hello")).await;
    let data = guest.expect("message").await;

    assert_eq!(data["senderId"], "u1");
    assert_eq!(data["sender"]["firstName"], "Ana");
    assert_eq!(data["conversationBooking"]["id"], BOOKING);
    assert!(data["reads"].as_array().is_some_and(|r| r.is_empty()));
}

#[tokio::test]
async fn test_mark_as_read_broadcasts_once() {
    let app = TestApp::spawn().await;
    let mut guest = app.connect(Some("u1")).await;
    let mut host = app.connect(Some("u2")).await;
    guest.join_conversation(BOOKING).await;
    host.join_conversation(BOOKING).await;

    for text in ["one", "two", "three"] {
        guest.emit("sendMessage", send_message("u1", text)).await;
        guest.expect("message").await;
        host.expect("message").await;
    }

    let mark = json!({"userId": "u2", "conversationBookingId": BOOKING});
    host.emit("markAsRead", mark.clone()).await;

    let read = guest.expect("messagesRead").await;
    assert_eq!(read["userId"], "u2");
    assert_eq!(read["messageIds"].as_array().map(Vec::len), Some(3));
    assert_eq!(host.expect("messagesRead").await, read);

    host.emit("markAsRead", mark).await;
    assert!(host.barrier().await.is_empty());

    let messages = app
        .gateway
        .messages_in(&ConversationBookingId::new(BOOKING))
        .await;
    for message in &messages {
        let reads = app.gateway.reads_for(&message.id).await;
        assert_eq!(reads.len(), 1);
        assert_eq!(reads[0].user_id, UserId::new("u2"));
    }
}

#[tokio::test]
async fn test_typing_skips_sender() {
    let app = TestApp::spawn().await;
    let mut guest = app.connect(Some("u1")).await;
    let mut host = app.connect(Some("u2")).await;
    guest.join_conversation(BOOKING).await;
    host.join_conversation(BOOKING).await;

    guest
        .emit("typing", json!({"conversationBookingId": BOOKING, "senderId": "u1"}))
        .await;
    assert_eq!(host.expect("typing").await["senderId"], "u1");
    assert!(guest.barrier().await.is_empty());
}

#[tokio::test]
async fn test_spoofed_sender_is_rejected() {
    let app = TestApp::spawn().await;
    let mut guest = app.connect(Some("u1")).await;
    guest.join_conversation(BOOKING).await;

    guest.emit("sendMessage", send_message("u2", "spoof")).await;
    let error = guest.expect("error").await;
    assert_eq!(error["code"], "FORBIDDEN");

    assert!(
        app.gateway
            .messages_in(&ConversationBookingId::new(BOOKING))
            .await
            .is_empty()
    );
}

#[tokio::test]
async fn test_unknown_booking_reports_error_and_broadcasts_nothing() {
    let app = TestApp::spawn().await;
    let mut admin = app.connect(None).await;
    let mut guest = app.connect(Some("u1")).await;
    admin.join_admin().await;

    guest
        .emit(
            "sendMessage",
            json!({"senderId": "u1", "text": "lost", "conversationBookingId": "999"}),
        )
        .await;
    assert_eq!(guest.expect("error").await["code"], "NOT_FOUND");
    assert!(admin.barrier().await.is_empty());
}
