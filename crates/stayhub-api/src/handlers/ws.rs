//! WebSocket upgrade handler.

use std::fmt::Display;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, Stream, StreamExt};
use tokio::sync::oneshot;
use tracing::{info, warn};

use stayhub_core::types::UserId;
use stayhub_realtime::connection::handle::{ConnectionId, OutboundFrame};
use stayhub_realtime::message::validator::MAX_FRAME_SIZE;
use stayhub_realtime::{ConnectionManager, EventRouter};

use crate::dto::request::SocketQuery;
use crate::state::AppState;

/// GET /socket?userId={id}: WebSocket upgrade
pub async fn ws_upgrade(
    State(state): State<AppState>,
    Query(query): Query<SocketQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    let user_id = query.identity();
    ws.max_message_size(MAX_FRAME_SIZE)
        .on_upgrade(move |socket| handle_socket(state, user_id, socket))
}

/// Handles an established WebSocket connection.
///
/// Inbound text frames are handled one at a time so a client's events are
/// processed in the order it sent them. When the outbound side ends first
/// the reader is asked to stop and awaited, never aborted, so an event in
/// flight still completes.
async fn handle_socket(state: AppState, user_id: Option<UserId>, socket: WebSocket) {
    let (mut ws_tx, ws_rx) = socket.split();
    let (conn_id, mut outbound_rx) = state.realtime.connect(user_id.clone());

    info!(
        conn_id = %conn_id,
        user_id = ?user_id.as_ref().map(UserId::as_str),
        "WebSocket connection established"
    );

    // Ends when every sender is gone, i.e. the session was unregistered.
    let mut writer = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            let message = match frame {
                OutboundFrame::Text(text) => Message::Text(text.into()),
                OutboundFrame::Ping => Message::Ping(Default::default()),
            };
            if ws_tx.send(message).await.is_err() {
                return;
            }
        }
        let _ = ws_tx.send(Message::Close(None)).await;
    });

    let (stop_tx, stop_rx) = oneshot::channel();
    let mut reader = tokio::spawn(read_frames(
        state.realtime.router.clone(),
        state.realtime.connections.clone(),
        conn_id,
        ws_rx,
        stop_rx,
    ));

    tokio::select! {
        _ = &mut writer => {
            let _ = stop_tx.send(());
            if let Err(e) = reader.await {
                warn!(conn_id = %conn_id, error = %e, "WebSocket reader failed");
            }
        }
        _ = &mut reader => writer.abort(),
    }

    state.realtime.router.disconnect(&conn_id);

    info!(conn_id = %conn_id, "WebSocket connection closed");
}

/// Feeds inbound frames to the router until the client goes away or `stop`
/// fires.
///
/// `stop` is only observed between frames: a frame already handed to the
/// router always runs to completion.
async fn read_frames<S, E>(
    router: Arc<EventRouter>,
    connections: Arc<ConnectionManager>,
    conn_id: ConnectionId,
    mut inbound: S,
    mut stop: oneshot::Receiver<()>,
) where
    S: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    loop {
        let next = tokio::select! {
            biased;
            _ = &mut stop => break,
            next = inbound.next() => next,
        };
        match next {
            Some(Ok(Message::Text(text))) => router.handle_frame(conn_id, text.as_str()).await,
            Some(Ok(Message::Close(_))) | None => break,
            Some(Ok(_)) => {
                if let Some(handle) = connections.get(&conn_id) {
                    handle.touch().await;
                }
            }
            Some(Err(e)) => {
                warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                break;
            }
        }
    }
}
