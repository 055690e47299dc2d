use crate::AppState;
use crate::router::Connection;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// WebSocket upgrade for the `/voice` signaling endpoint.
pub async fn voice_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    info!("New signaling connection");

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize signaling frame: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let mut conn = Connection::new(state.registry.clone(), tx);

    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => conn.handle_frame(&text),
            Message::Close(_) => break,
            _ => {}
        }
    }

    // Clean or abrupt, the close path runs exactly once per connection.
    conn.disconnect();
    drop(conn);

    if tokio::time::timeout(std::time::Duration::from_secs(5), &mut send_task)
        .await
        .is_err()
    {
        debug!("Send task did not drain in time; aborting");
        send_task.abort();
    }

    info!("Signaling connection closed");
}
