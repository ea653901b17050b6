//! inkcast WebSocket Relay Server
//!
//! Forwards annotation payloads between the participants of a channel (room).
//! Payloads are opaque to the relay and are never stored.
//!
//! ## Protocol
//!
//! Messages are JSON with the following format:
//! ```json
//! { "type": "join", "room": "room-id" }
//! { "type": "annotation", "data": "<base64-encoded-payload>" }
//! { "type": "leave" }
//! ```

use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use inkcast_core::relay::{ClientMessage, ServerMessage, encode_payload};
use std::{collections::HashSet, net::SocketAddr, sync::Arc};
use tokio::sync::broadcast;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Server configuration
const CHANNEL_CAPACITY: usize = 256;
const DEFAULT_ADDR: &str = "0.0.0.0:3030";
const ADDR_ENV: &str = "INKCAST_ADDR";

/// Room state
struct Room {
    /// Broadcast channel for this room
    tx: broadcast::Sender<(String, ServerMessage)>,
    /// Connected peer IDs
    peers: HashSet<String>,
}

impl Room {
    fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            tx,
            peers: HashSet::new(),
        }
    }
}

/// Shared application state
struct AppState {
    /// Active rooms
    rooms: DashMap<String, Room>,
}

impl AppState {
    fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    /// Add peer to room
    fn join_room(&self, room_id: &str, peer_id: &str) -> (broadcast::Receiver<(String, ServerMessage)>, usize) {
        let mut room = self.rooms.entry(room_id.to_string()).or_insert_with(Room::new);
        room.peers.insert(peer_id.to_string());
        let rx = room.tx.subscribe();
        (rx, room.peers.len())
    }

    /// Remove peer from room
    fn leave_room(&self, room_id: &str, peer_id: &str) {
        if let Some(mut room) = self.rooms.get_mut(room_id) {
            room.peers.remove(peer_id);
            // Clean up empty rooms
            if room.peers.is_empty() {
                drop(room);
                self.rooms.remove(room_id);
            }
        }
    }

    fn peer_count(&self, room_id: &str) -> usize {
        self.rooms.get(room_id).map_or(0, |room| room.peers.len())
    }

    /// Broadcast message to room
    fn broadcast(&self, room_id: &str, from: &str, msg: ServerMessage) {
        if let Some(room) = self.rooms.get(room_id) {
            let _ = room.tx.send((from.to_string(), msg));
        }
    }
}

/// Serialize a server message into a text frame.
fn text_frame(msg: &ServerMessage) -> Option<Message> {
    match serde_json::to_string(msg) {
        Ok(json) => Some(Message::Text(json.into())),
        Err(e) => {
            error!("Failed to serialize server message: {}", e);
            None
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inkcast_server=info,tower_http=info".into()),
        )
        .init();

    let addr_str = std::env::var(ADDR_ENV).unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let addr: SocketAddr = match addr_str.parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Invalid {} {:?}: {}", ADDR_ENV, addr_str, e);
            std::process::exit(2);
        }
    };

    let state = Arc::new(AppState::new());

    let app = Router::new()
        .route("/", get(index))
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    info!("inkcast relay server listening on {}", addr);
    info!("WebSocket endpoint: ws://{}/ws", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Index page
async fn index() -> &'static str {
    "inkcast Relay Server - Connect via WebSocket at /ws"
}

/// Health check
async fn health() -> &'static str {
    "ok"
}

/// WebSocket upgrade handler
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let peer_id = Uuid::new_v4().to_string();
    info!("New connection: {}", peer_id);

    let (mut sender, mut receiver) = socket.split();
    let mut current_room: Option<String> = None;
    let mut room_rx: Option<broadcast::Receiver<(String, ServerMessage)>> = None;

    loop {
        tokio::select! {
            // Handle incoming messages from client
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(ClientMessage::Join { room }) => {
                                // Leave current room if any
                                if let Some(ref old_room) = current_room {
                                    state.leave_room(old_room, &peer_id);
                                    state.broadcast(old_room, &peer_id, ServerMessage::PeerLeft {
                                        peer_id: peer_id.clone(),
                                    });
                                }

                                let (rx, peer_count) = state.join_room(&room, &peer_id);
                                room_rx = Some(rx);
                                current_room = Some(room.clone());

                                let joined = ServerMessage::Joined { room: room.clone(), peer_count };
                                if let Some(frame) = text_frame(&joined) {
                                    if sender.send(frame).await.is_err() {
                                        break;
                                    }
                                }

                                // Notify others
                                state.broadcast(&room, &peer_id, ServerMessage::PeerJoined {
                                    peer_id: peer_id.clone(),
                                });

                                info!("Peer {} joined room {} ({} peers)", peer_id, room, peer_count);
                            }
                            Ok(ClientMessage::Leave) => {
                                if let Some(ref room) = current_room {
                                    state.leave_room(room, &peer_id);
                                    state.broadcast(room, &peer_id, ServerMessage::PeerLeft {
                                        peer_id: peer_id.clone(),
                                    });
                                    info!("Peer {} left room {} ({} remaining)", peer_id, room, state.peer_count(room));
                                }
                                current_room = None;
                                room_rx = None;
                            }
                            Ok(ClientMessage::Annotation { data }) => {
                                if let Some(ref room) = current_room {
                                    debug!("Annotation from {} in {} ({} bytes)", peer_id, room, data.len());
                                    state.broadcast(room, &peer_id, ServerMessage::Annotation {
                                        from: peer_id.clone(),
                                        data,
                                    });
                                }
                            }
                            Err(e) => {
                                warn!("Invalid message from {}: {}", peer_id, e);
                                let err = ServerMessage::Error {
                                    message: format!("Invalid message: {}", e),
                                };
                                if let Some(frame) = text_frame(&err) {
                                    let _ = sender.send(frame).await;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Binary(data))) => {
                        // Binary frames carry a raw annotation payload
                        if let Some(ref room) = current_room {
                            state.broadcast(room, &peer_id, ServerMessage::Annotation {
                                from: peer_id.clone(),
                                data: encode_payload(&data),
                            });
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        break;
                    }
                    Some(Ok(_)) => {} // Ignore ping/pong
                    Some(Err(e)) => {
                        warn!("WebSocket error for {}: {}", peer_id, e);
                        break;
                    }
                }
            }

            // Handle broadcast messages from room
            msg = async {
                match &mut room_rx {
                    Some(rx) => rx.recv().await,
                    None => {
                        // No room joined, just wait forever
                        std::future::pending().await
                    }
                }
            } => {
                match msg {
                    Ok((from, server_msg)) => {
                        // Don't echo back to sender
                        if from != peer_id {
                            if let Some(frame) = text_frame(&server_msg) {
                                if sender.send(frame).await.is_err() {
                                    break;
                                }
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // Missed messages cannot be replayed
                        warn!("Peer {} lagged by {} messages, closing", peer_id, skipped);
                        break;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        room_rx = None;
                    }
                }
            }
        }
    }

    // Cleanup on disconnect
    if let Some(ref room) = current_room {
        state.leave_room(room, &peer_id);
        state.broadcast(room, &peer_id, ServerMessage::PeerLeft {
            peer_id: peer_id.clone(),
        });
    }
    info!("Connection closed: {}", peer_id);
}
