//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::{EngineCmd, Envelope};
use crate::util::rate_limit::ConnectionRateLimiter;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let conn_id = Uuid::new_v4();
    state.connections.insert(conn_id);
    info!(conn_id = %conn_id, "New WebSocket connection");

    let (ws_sink, ws_stream) = socket.split();
    let events_rx = state.game.subscribe();

    run_session(
        conn_id,
        ws_sink,
        ws_stream,
        state.game.cmd_tx.clone(),
        events_rx,
    )
    .await;

    // Purge the player and their projectiles regardless of how the
    // connection ended.
    let _ = state
        .game
        .cmd_tx
        .send(EngineCmd::Disconnect { conn_id })
        .await;
    state.connections.remove(&conn_id);

    info!(conn_id = %conn_id, "WebSocket connection closed");
}

/// Run the WebSocket session with read/write split
async fn run_session(
    conn_id: Uuid,
    mut ws_sink: futures::stream::SplitSink<WebSocket, Message>,
    mut ws_stream: futures::stream::SplitStream<WebSocket>,
    cmd_tx: mpsc::Sender<EngineCmd>,
    mut events_rx: broadcast::Receiver<Envelope>,
) {
    let rate_limiter = ConnectionRateLimiter::new();

    // Writer task: engine broadcasts -> WebSocket, filtered by scope
    let writer_conn_id = conn_id;
    let writer_handle = tokio::spawn(async move {
        loop {
            match events_rx.recv().await {
                Ok(envelope) => {
                    if !envelope.scope.delivers_to(writer_conn_id) {
                        continue;
                    }
                    if let Err(e) = send_msg(&mut ws_sink, &envelope.msg).await {
                        debug!(conn_id = %writer_conn_id, error = %e, "WebSocket send failed");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(
                        conn_id = %writer_conn_id,
                        lagged_count = n,
                        "Client lagged, skipping {} events", n
                    );
                    // Continue - don't disconnect for lag
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!(conn_id = %writer_conn_id, "Event channel closed");
                    break;
                }
            }
        }
    });

    // Reader loop: WebSocket -> engine command queue
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check_input() {
                    warn!(conn_id = %conn_id, "Rate limited inbound message");
                    continue;
                }

                match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(msg) => {
                        if cmd_tx
                            .send(EngineCmd::Client { conn_id, msg })
                            .await
                            .is_err()
                        {
                            debug!(conn_id = %conn_id, "Engine command channel closed");
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(conn_id = %conn_id, error = %e, "Failed to parse client message");
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(conn_id = %conn_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                info!(conn_id = %conn_id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(conn_id = %conn_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    writer_handle.abort();
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
