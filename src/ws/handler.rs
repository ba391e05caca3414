//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::ArenaCommand;
use crate::util::rate_limit::SessionRateLimiter;
use crate::util::time::unix_millis;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// WebSocket upgrade handler. Each connection becomes one session with a
/// fresh opaque id.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let session_id = Uuid::new_v4();
    info!(session_id = %session_id, "New WebSocket connection");

    let (mut ws_sink, mut ws_stream) = socket.split();

    // Register with the arena; the arena pushes server messages into
    // this channel for the session
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<ServerMsg>();
    let cmd_tx = state.arena.cmd_tx.clone();
    if cmd_tx
        .send(ArenaCommand::Connect {
            session_id,
            outbound: outbound_tx,
        })
        .await
        .is_err()
    {
        error!(session_id = %session_id, "Arena unavailable");
        return;
    }

    // Writer task: arena messages -> WebSocket
    let writer_session_id = session_id;
    let writer_handle = tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                debug!(session_id = %writer_session_id, error = %e, "WebSocket send failed");
                break;
            }
        }
    });

    // Reader loop: WebSocket -> arena
    let rate_limiter = SessionRateLimiter::new();
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check_input() {
                    warn!(session_id = %session_id, "Rate limited input message");
                    continue;
                }

                match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(msg) => {
                        let cmd = ArenaCommand::Client {
                            session_id,
                            msg,
                            received_at: unix_millis(),
                        };
                        if cmd_tx.send(cmd).await.is_err() {
                            debug!(session_id = %session_id, "Command channel closed");
                            break;
                        }
                    }
                    // Malformed input is dropped, never answered
                    Err(e) => {
                        warn!(session_id = %session_id, error = %e, "Failed to parse client message");
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(session_id = %session_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                info!(session_id = %session_id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(session_id = %session_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    // Signal disconnect to the arena
    let _ = cmd_tx.send(ArenaCommand::Disconnect { session_id }).await;

    writer_handle.abort();
    info!(session_id = %session_id, "WebSocket connection closed");
}

/// Send a message over WebSocket
async fn send_msg(
    sink: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMsg,
) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}
