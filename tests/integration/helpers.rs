//! Shared test helpers for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tower::ServiceExt;

use stayhub_api::{AppState, build_app, build_state};
use stayhub_core::config::AppConfig;
use stayhub_core::types::{BookingId, ConversationBookingId, ConversationId, UserId};
use stayhub_database::memory::MemoryGateway;
use stayhub_entity::user::UserSummary;
use stayhub_realtime::notification::push::NoopPushSender;
use stayhub_realtime::slot::RouterSlot;

/// How long a client waits for an expected event.
const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Conversation-booking seeded by [`TestApp::spawn`], between `u1` and `u2`.
pub const BOOKING: &str = "42";

/// Test application context
pub struct TestApp {
    /// Address of the live server
    pub addr: SocketAddr,
    /// The Axum router for in-process requests (same state as the server)
    pub router: Router,
    /// Shared state
    pub state: AppState,
    /// Backing store
    pub gateway: Arc<MemoryGateway>,
}

impl TestApp {
    /// Start a server on an ephemeral port with a seeded memory gateway.
    pub async fn spawn() -> Self {
        let gateway = Arc::new(MemoryGateway::new());
        seed(&gateway).await;

        let state = build_state(
            AppConfig::default(),
            gateway.clone(),
            Arc::new(NoopPushSender),
            RouterSlot::new(),
        )
        .expect("Failed to build state");
        let router = build_app(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("No local addr");
        let app = router.clone();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            router,
            state,
            gateway,
        }
    }

    /// Open a socket, optionally carrying a trusted identity.
    pub async fn connect(&self, user_id: Option<&str>) -> WsClient {
        let url = match user_id {
            Some(id) => format!("ws://{}/socket?userId={id}", self.addr),
            None => format!("ws://{}/socket", self.addr),
        };
        let (stream, _) = connect_async(url).await.expect("WebSocket connect failed");
        WsClient { stream }
    }

    /// Make an HTTP request to the in-process router
    pub async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let body_str = body.map(|b| b.to_string()).unwrap_or_default();
        let req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");
        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }
}

async fn seed(gateway: &MemoryGateway) {
    for (id, first) in [("u1", "Ana"), ("u2", "Ben")] {
        gateway
            .insert_user(UserSummary {
                id: UserId::new(id),
                first_name: Some(first.to_string()),
                last_name: None,
                image: None,
            })
            .await;
    }
    gateway
        .insert_conversation(
            ConversationId::new("c1"),
            vec![UserId::new("u1"), UserId::new("u2")],
        )
        .await;
    gateway
        .insert_conversation_booking(
            ConversationBookingId::new(BOOKING),
            ConversationId::new("c1"),
            BookingId::new("b1"),
        )
        .await
        .expect("Failed to seed booking");
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}

/// A connected socket client speaking `{event, data}` frames.
pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    /// Send one event.
    pub async fn emit(&mut self, event: &str, data: Value) {
        let frame = json!({"event": event, "data": data}).to_string();
        self.stream
            .send(Message::text(frame))
            .await
            .expect("Failed to send frame");
    }

    /// Next `{event, data}` frame, skipping transport frames.
    pub async fn recv(&mut self) -> Value {
        loop {
            let next = tokio::time::timeout(RECV_TIMEOUT, self.stream.next())
                .await
                .expect("Timed out waiting for an event")
                .expect("Socket closed")
                .expect("Socket error");
            if let Message::Text(text) = next {
                return serde_json::from_str(text.as_str()).expect("Invalid JSON frame");
            }
        }
    }

    /// Next frame, which must be `event`; returns its data.
    pub async fn expect(&mut self, event: &str) -> Value {
        let frame = self.recv().await;
        assert_eq!(frame["event"], event, "unexpected frame: {frame}");
        frame["data"].clone()
    }

    /// Wait until every frame sent so far on this socket has been handled.
    ///
    /// Sends an unknown event and waits for its `error` reply; any frame
    /// received before that reply is returned.
    pub async fn barrier(&mut self) -> Vec<Value> {
        self.emit("barrier", Value::Null).await;
        let mut before = Vec::new();
        loop {
            let frame = self.recv().await;
            if frame["event"] == "error"
                && frame["data"]["message"]
                    .as_str()
                    .is_some_and(|m| m.contains("barrier"))
            {
                return before;
            }
            before.push(frame);
        }
    }

    /// Join `conversation-{id}` and wait until the join took effect.
    pub async fn join_conversation(&mut self, id: &str) {
        self.emit("joinConversation", json!(id)).await;
        assert!(self.barrier().await.is_empty());
    }

    /// Join `admin_room` and wait until the join took effect.
    pub async fn join_admin(&mut self) {
        self.emit("joinAdmin", Value::Null).await;
        assert!(self.barrier().await.is_empty());
    }
}
