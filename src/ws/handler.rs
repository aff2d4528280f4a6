//! Per-connection WebSocket session loop
//!
//! Every connection gets an outbound queue drained by a dedicated writer
//! task, so a slow or dead socket can never stall the tick loop or another
//! client. Joining a room spawns a forwarder task that copies the room's
//! snapshot broadcast into that queue.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::protocol::{ClientMsg, ServerMsg};
use super::Session;
use crate::app::AppState;
use crate::game::InputState;
use crate::util::rate_limit::ConnectionRateLimiter;
use crate::util::time::now_secs;

/// Depth of the per-connection outbound queue
const OUTBOUND_CHANNEL_CAPACITY: usize = 64;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let conn_id = Uuid::new_v4();
    info!(conn_id = %conn_id, "New WebSocket connection");

    let (ws_sink, ws_stream) = socket.split();
    let (out_tx, out_rx) = mpsc::channel::<ServerMsg>(OUTBOUND_CHANNEL_CAPACITY);

    let writer = tokio::spawn(write_loop(ws_sink, out_rx, conn_id));

    // Forwards the joined room's broadcast into the outbound queue; replaced
    // on every join, aborted on leave
    let mut forwarder: Option<JoinHandle<()>> = None;

    read_loop(ws_stream, &state, conn_id, &out_tx, &mut forwarder).await;

    // Whatever ended the read loop, the session is over
    leave_room(&state, conn_id, &mut forwarder);
    writer.abort();
    info!(conn_id = %conn_id, "WebSocket connection closed");
}

async fn read_loop(
    mut ws_stream: SplitStream<WebSocket>,
    state: &AppState,
    conn_id: Uuid,
    out_tx: &mpsc::Sender<ServerMsg>,
    forwarder: &mut Option<JoinHandle<()>>,
) {
    let rate_limiter = ConnectionRateLimiter::new();

    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check_input() {
                    warn!(conn_id = %conn_id, "Dropping rate-limited message");
                    continue;
                }
                match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(msg) => handle_msg(state, conn_id, msg, out_tx, forwarder).await,
                    Err(e) => {
                        warn!(conn_id = %conn_id, error = %e, "Failed to parse client message");
                        let reply = ServerMsg::Error {
                            message: format!("invalid message: {e}"),
                        };
                        let _ = out_tx.send(reply).await;
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(conn_id = %conn_id, "Ignoring binary message");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                info!(conn_id = %conn_id, "Client initiated close");
                break;
            }
            Err(e) => {
                debug!(conn_id = %conn_id, error = %e, "WebSocket error");
                break;
            }
        }
    }
}

async fn handle_msg(
    state: &AppState,
    conn_id: Uuid,
    msg: ClientMsg,
    out_tx: &mpsc::Sender<ServerMsg>,
    forwarder: &mut Option<JoinHandle<()>>,
) {
    match msg {
        ClientMsg::Join {
            name,
            tank_class,
            game_mode,
            room_code,
        } => {
            // A repeated join replaces the previous room binding
            leave_room(state, conn_id, forwarder);

            let tank_id = Uuid::new_v4();
            let (room_id, snapshot_rx) = state.registry.join_room(
                game_mode,
                room_code,
                tank_id,
                name.clone(),
                tank_class,
                now_secs(),
            );
            info!(
                conn_id = %conn_id,
                tank_id = %tank_id,
                room_id = %room_id,
                name = %name,
                "Player joined"
            );

            state.sessions.insert(
                conn_id,
                Session {
                    room_id: room_id.clone(),
                    tank_id,
                    name,
                },
            );
            *forwarder = Some(tokio::spawn(forward_snapshots(
                snapshot_rx,
                out_tx.clone(),
                conn_id,
            )));

            let _ = out_tx.send(ServerMsg::TankAssigned { tank_id, room_id }).await;
        }
        ClientMsg::Input {
            left,
            right,
            up,
            down,
            fire,
        } => {
            // Inputs racing a disconnect are normal; a missing session or a
            // departed tank is a silent no-op
            let Some(session) = state.sessions.get(&conn_id) else {
                debug!(conn_id = %conn_id, "Input without an active session");
                return;
            };
            let input = InputState {
                left,
                right,
                up,
                down,
                fire,
            };
            state.registry.with_room(&session.room_id, |room| {
                room.apply_input(session.tank_id, &input, now_secs());
            });
        }
        ClientMsg::GetRooms { game_mode } => {
            let rooms = state.registry.list_rooms(game_mode);
            let _ = out_tx.send(ServerMsg::RoomList { rooms }).await;
        }
        ClientMsg::LeaveGame => {
            leave_room(state, conn_id, forwarder);
        }
    }
}

/// Tear down the connection's room membership, if any. The connection itself
/// stays open and may join again.
fn leave_room(state: &AppState, conn_id: Uuid, forwarder: &mut Option<JoinHandle<()>>) {
    if let Some(task) = forwarder.take() {
        task.abort();
    }
    if let Some(session) = state.sessions.remove(&conn_id) {
        state.registry.remove_tank(&session.room_id, session.tank_id);
        info!(
            conn_id = %conn_id,
            room_id = %session.room_id,
            tank_id = %session.tank_id,
            "Player left room"
        );
    }
}

async fn forward_snapshots(
    mut rx: broadcast::Receiver<ServerMsg>,
    out_tx: mpsc::Sender<ServerMsg>,
    conn_id: Uuid,
) {
    loop {
        match rx.recv().await {
            Ok(msg) => {
                if out_tx.send(msg).await.is_err() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                // Snapshots are full-state, so dropping frames is safe
                warn!(conn_id = %conn_id, skipped, "Client lagging behind snapshot broadcast");
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!(conn_id = %conn_id, "Snapshot channel closed");
                break;
            }
        }
    }
}

async fn write_loop(
    mut sink: SplitSink<WebSocket, Message>,
    mut out_rx: mpsc::Receiver<ServerMsg>,
    conn_id: Uuid,
) {
    while let Some(msg) = out_rx.recv().await {
        match serde_json::to_string(&msg) {
            Ok(json) => {
                if let Err(e) = sink.send(Message::Text(json)).await {
                    debug!(conn_id = %conn_id, error = %e, "WebSocket send failed");
                    break;
                }
            }
            Err(e) => {
                error!(conn_id = %conn_id, error = %e, "Failed to serialize server message");
            }
        }
    }
}
