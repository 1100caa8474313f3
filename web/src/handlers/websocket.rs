//! Notification WebSocket.
//!
//! Every connected client receives each order event as a JSON text frame:
//!
//! ```json
//! {"event": "orderUpdated", "payload": {"orderId": "...", "status": "sold", "listingId": "..."}}
//! {"event": "orderDeleted", "payload": {"orderId": "...", "listingId": "..."}}
//! ```
//!
//! The channel is server-to-client only; incoming text frames are ignored.
//!
//! ```text
//! Client          WebSocket Handler        BroadcastNotifier
//!   │                    │                        │
//!   ├─ Connect ─────────>│                        │
//!   │                    ├─ subscribe() ─────────>│
//!   │                    │<── OrderEvent ─────────┤
//!   │<─ Text frame ──────┤                        │
//! ```

use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use dogworld_core::notify::{BroadcastNotifier, Observer};
use futures::{SinkExt, stream::StreamExt};
use tracing::{debug, error, info};

/// Upgrade to a notification WebSocket.
#[allow(clippy::unused_async)]
pub async fn handle(ws: WebSocketUpgrade, State(notifier): State<BroadcastNotifier>) -> Response {
    debug!("WebSocket connection requested");
    ws.on_upgrade(move |socket| handle_socket(socket, notifier.subscribe()))
}

/// Serializes an order event as a text frame.
fn frame(event: &dogworld_core::notify::OrderEvent) -> Option<Message> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Message::Text(json)),
        Err(e) => {
            error!(error = %e, "Failed to serialize order event");
            None
        }
    }
}

/// Pumps events to the client until either side closes.
async fn handle_socket(socket: WebSocket, mut observer: Observer) {
    info!("Notification socket connected");

    let (mut sender, mut receiver) = socket.split();

    let mut send_task = tokio::spawn(async move {
        while let Some(event) = observer.next().await {
            let Some(message) = frame(&event) else {
                continue;
            };
            if sender.send(message).await.is_err() {
                break;
            }
        }
        debug!("WebSocket send task terminated");
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Close(_) => {
                    debug!("Client requested close");
                    break;
                }
                Message::Text(_) | Message::Binary(_) => {
                    debug!("Ignoring client message on notification socket");
                }
                Message::Ping(_) | Message::Pong(_) => {}
            }
        }
        debug!("WebSocket receive task terminated");
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    }

    info!("Notification socket closed");
}
