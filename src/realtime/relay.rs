use super::protocol::{room_for_trip, Frame, JoinPayload, RelayEvent, RELAY_PATH};
use crate::error::{AppError, AppResult};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::{Mutex, RwLock};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::{accept_hdr_async, tungstenite::Message};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// A frame addressed to a room. `origin` is excluded from delivery.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub room: String,
    pub origin: Option<Uuid>,
    pub frame: Frame,
}

/// Who a connection said it was when joining
#[derive(Debug, Clone, Default)]
struct ClientInfo {
    user_id: Option<String>,
    user_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RelayStats {
    pub connections: usize,
    pub rooms: usize,
}

/// In-memory room relay. Membership lives only in this process.
pub struct RelayServer {
    /// Every envelope goes through one broadcast channel; connections filter by room
    tx: broadcast::Sender<Envelope>,
    /// room -> member client IDs
    rooms: Arc<RwLock<HashMap<String, HashSet<Uuid>>>>,
    /// client ID -> rooms joined
    client_rooms: Arc<RwLock<HashMap<Uuid, HashSet<String>>>>,
    clients: Arc<RwLock<HashMap<Uuid, ClientInfo>>>,
}

impl RelayServer {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1000);

        Self {
            tx,
            rooms: Arc::new(RwLock::new(HashMap::new())),
            client_rooms: Arc::new(RwLock::new(HashMap::new())),
            clients: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.tx.subscribe()
    }

    /// Track a new connection
    pub async fn register(&self, client_id: Uuid) {
        self.clients
            .write()
            .await
            .insert(client_id, ClientInfo::default());
    }

    /// Add a client to a room. Returns false if it was already a member.
    pub async fn join(&self, client_id: Uuid, room: &str) -> bool {
        let mut rooms = self.rooms.write().await;
        let mut client_rooms = self.client_rooms.write().await;

        let added = rooms
            .entry(room.to_string())
            .or_default()
            .insert(client_id);
        client_rooms
            .entry(client_id)
            .or_default()
            .insert(room.to_string());

        if added {
            info!("Client {} joined {}", client_id, room);
        }
        added
    }

    /// Remove a client from a room. Returns false if it was not a member.
    pub async fn leave(&self, client_id: Uuid, room: &str) -> bool {
        let mut rooms = self.rooms.write().await;
        let mut client_rooms = self.client_rooms.write().await;

        let removed = match rooms.get_mut(room) {
            Some(members) => {
                let removed = members.remove(&client_id);
                if members.is_empty() {
                    rooms.remove(room);
                }
                removed
            }
            None => false,
        };

        if let Some(joined) = client_rooms.get_mut(&client_id) {
            joined.remove(room);
            if joined.is_empty() {
                client_rooms.remove(&client_id);
            }
        }

        if removed {
            info!("Client {} left {}", client_id, room);
        }
        removed
    }

    pub async fn rooms_of(&self, client_id: Uuid) -> Vec<String> {
        let client_rooms = self.client_rooms.read().await;
        client_rooms
            .get(&client_id)
            .map(|rooms| rooms.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn is_member(&self, client_id: Uuid, room: &str) -> bool {
        let rooms = self.rooms.read().await;
        rooms
            .get(room)
            .map(|members| members.contains(&client_id))
            .unwrap_or(false)
    }

    pub async fn room_size(&self, room: &str) -> usize {
        let rooms = self.rooms.read().await;
        rooms.get(room).map(HashSet::len).unwrap_or(0)
    }

    pub async fn stats(&self) -> RelayStats {
        RelayStats {
            connections: self.clients.read().await.len(),
            rooms: self.rooms.read().await.len(),
        }
    }

    /// Queue `frame` for every member of `room` except `origin`.
    /// Returns the number of intended recipients.
    pub async fn publish(&self, room: &str, frame: Frame, origin: Option<Uuid>) -> usize {
        let recipients = {
            let rooms = self.rooms.read().await;
            rooms
                .get(room)
                .map(|members| {
                    members
                        .iter()
                        .filter(|id| Some(**id) != origin)
                        .count()
                })
                .unwrap_or(0)
        };

        if recipients > 0 {
            debug!("Publishing {} to {} recipients in {}", frame.event, recipients, room);
            let envelope = Envelope {
                room: room.to_string(),
                origin,
                frame,
            };
            if let Err(e) = self.tx.send(envelope) {
                warn!("Failed to publish to {}: {}", room, e);
            }
        }

        recipients
    }

    /// Handle one text frame from `client_id`. Returns the reply for the sender, if any.
    pub async fn dispatch(&self, client_id: Uuid, text: &str) -> Option<Frame> {
        let frame: Frame = match serde_json::from_str(text) {
            Ok(frame) => frame,
            Err(_) => {
                warn!("Failed to parse message from client {}", client_id);
                return Some(Frame::error("Invalid message format"));
            }
        };

        let event = match RelayEvent::from_str(&frame.event) {
            Some(event) => event,
            None => return Some(Frame::error(format!("Unknown event: {}", frame.event))),
        };

        let trip_id = match frame.trip_id() {
            Some(trip_id) => trip_id,
            None if event == RelayEvent::JoinTrip
                || event == RelayEvent::LeaveTrip
                || event.is_room_broadcast() =>
            {
                return Some(Frame::error("tripId is required"));
            }
            None => return Some(Frame::error(format!("Unknown event: {}", frame.event))),
        };
        let room = room_for_trip(&trip_id);

        match event {
            RelayEvent::JoinTrip => {
                let payload: JoinPayload =
                    serde_json::from_value(frame.data.clone()).unwrap_or_default();
                let info = {
                    let mut clients = self.clients.write().await;
                    let info = clients.entry(client_id).or_default();
                    // later joins may omit fields the client sent earlier
                    if payload.user_id.is_some() {
                        info.user_id = payload.user_id;
                    }
                    if payload.user_name.is_some() {
                        info.user_name = payload.user_name;
                    }
                    info.clone()
                };

                if self.join(client_id, &room).await {
                    let announce = Frame::new(
                        RelayEvent::UserJoined,
                        json!({
                            "room": room,
                            "tripId": trip_id,
                            "clientId": client_id,
                            "userId": info.user_id,
                            "userName": info.user_name,
                        }),
                    );
                    self.publish(&room, announce, Some(client_id)).await;
                }

                Some(Frame::new(
                    RelayEvent::Joined,
                    json!({ "room": room, "members": self.room_size(&room).await }),
                ))
            }
            RelayEvent::LeaveTrip => {
                if self.leave(client_id, &room).await {
                    self.announce_departure(client_id, &room).await;
                }
                Some(Frame::new(RelayEvent::Left, json!({ "room": room })))
            }
            event if event.is_room_broadcast() => {
                if !self.is_member(client_id, &room).await {
                    return Some(Frame::error(format!("Not a member of {}", room)));
                }
                self.publish(&room, frame, Some(client_id)).await;
                None
            }
            _ => Some(Frame::error(format!("Unknown event: {}", frame.event))),
        }
    }

    async fn announce_departure(&self, client_id: Uuid, room: &str) {
        let info = self
            .clients
            .read()
            .await
            .get(&client_id)
            .cloned()
            .unwrap_or_default();
        let frame = Frame::new(
            RelayEvent::UserLeft,
            json!({
                "room": room,
                "clientId": client_id,
                "userId": info.user_id,
                "userName": info.user_name,
            }),
        );
        self.publish(room, frame, Some(client_id)).await;
    }

    /// Leave every room and forget the connection
    pub async fn disconnect(&self, client_id: Uuid) {
        for room in self.rooms_of(client_id).await {
            if self.leave(client_id, &room).await {
                self.announce_departure(client_id, &room).await;
            }
        }
        self.clients.write().await.remove(&client_id);
    }

    /// Handle a new WebSocket connection until it closes
    pub async fn handle_connection(&self, stream: TcpStream) -> AppResult<()> {
        let ws_stream = accept_hdr_async(stream, check_path)
            .await
            .map_err(|e| AppError::Message(format!("WebSocket handshake failed: {}", e)))?;

        let (ws_sender, mut ws_receiver) = ws_stream.split();
        let ws_sender = Arc::new(Mutex::new(ws_sender));
        let mut rx = self.subscribe();
        let client_id = Uuid::new_v4();

        self.register(client_id).await;
        info!("New relay connection: {}", client_id);

        let welcome = Frame::new(RelayEvent::Connected, json!({ "clientId": client_id }));
        if let Err(e) = ws_sender
            .lock()
            .await
            .send(Message::Text(welcome.to_text()))
            .await
        {
            warn!("Failed to send welcome frame: {}", e);
        }

        // Forward room traffic to this client
        let server = self.clone();
        let ws_sender_for_broadcast = ws_sender.clone();
        let forwarder = tokio::spawn(async move {
            loop {
                let envelope = match rx.recv().await {
                    Ok(envelope) => envelope,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Client {} lagged, skipped {} frames", client_id, skipped);
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };

                if envelope.origin == Some(client_id)
                    || !server.is_member(client_id, &envelope.room).await
                {
                    continue;
                }

                let mut sender = ws_sender_for_broadcast.lock().await;
                if let Err(e) = sender.send(Message::Text(envelope.frame.to_text())).await {
                    error!("Failed to send frame to client {}: {}", client_id, e);
                    break;
                }
            }
        });

        while let Some(msg) = ws_receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    if let Some(reply) = self.dispatch(client_id, &text).await {
                        let mut sender = ws_sender.lock().await;
                        if let Err(e) = sender.send(Message::Text(reply.to_text())).await {
                            warn!("Failed to reply to client {}: {}", client_id, e);
                            break;
                        }
                    }
                }
                Ok(Message::Close(_)) => {
                    info!("Relay connection closed: {}", client_id);
                    break;
                }
                Err(e) => {
                    error!("WebSocket error for client {}: {}", client_id, e);
                    break;
                }
                _ => {}
            }
        }

        forwarder.abort();
        self.disconnect(client_id).await;
        Ok(())
    }

    /// Accept connections from `listener` forever
    pub async fn serve(self, listener: TcpListener) {
        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    debug!("Accepted TCP connection from {}", addr);
                    let server = self.clone();
                    tokio::spawn(async move {
                        if let Err(e) = server.handle_connection(stream).await {
                            warn!("Relay connection from {} ended with error: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Failed to accept relay connection: {}", e);
                }
            }
        }
    }
}

/// Reject upgrades on any path other than the relay path
fn check_path(request: &Request, response: Response) -> Result<Response, ErrorResponse> {
    if request.uri().path() == RELAY_PATH {
        Ok(response)
    } else {
        let mut rejection = ErrorResponse::new(Some("Not found".to_string()));
        *rejection.status_mut() = StatusCode::NOT_FOUND;
        Err(rejection)
    }
}

impl Clone for RelayServer {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            rooms: Arc::clone(&self.rooms),
            client_rooms: Arc::clone(&self.client_rooms),
            clients: Arc::clone(&self.clients),
        }
    }
}

impl Default for RelayServer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn join(trip: &str) -> String {
        json!({"event": "join-trip", "data": {"tripId": trip, "userName": "Ana"}}).to_string()
    }

    #[tokio::test]
    async fn join_replies_and_announces() {
        let server = RelayServer::new();
        let mut rx = server.subscribe();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        let reply = server.dispatch(a, &join("t1")).await.unwrap();
        assert_eq!(reply.event, "joined");
        assert_eq!(reply.data["room"], "trip:t1");

        server.dispatch(b, &join("t1")).await;
        let envelope = rx.recv().await.unwrap();
        assert_eq!(envelope.frame.event, "user-joined");
        assert_eq!(envelope.origin, Some(b));
        assert_eq!(server.room_size("trip:t1").await, 2);
    }

    #[tokio::test]
    async fn later_join_keeps_known_identity() {
        let server = RelayServer::new();
        let (client, watcher) = (Uuid::new_v4(), Uuid::new_v4());
        server.register(client).await;
        server.join(watcher, "trip:t2").await;
        let mut rx = server.subscribe();

        let first = json!({
            "event": "join-trip",
            "data": {"tripId": "t1", "userId": "u1", "userName": "Ana"}
        });
        server.dispatch(client, &first.to_string()).await;
        let bare = json!({"event": "join-trip", "data": {"tripId": "t2"}});
        server.dispatch(client, &bare.to_string()).await;

        let joined = rx.recv().await.unwrap();
        assert_eq!(joined.frame.event, "user-joined");
        assert_eq!(joined.frame.data["userId"], "u1");
        assert_eq!(joined.frame.data["userName"], "Ana");

        let leave = json!({"event": "leave-trip", "data": {"tripId": "t2"}});
        server.dispatch(client, &leave.to_string()).await;
        let left = rx.recv().await.unwrap();
        assert_eq!(left.frame.event, "user-left");
        assert_eq!(left.frame.data["userName"], "Ana");
    }

    #[tokio::test]
    async fn broadcast_requires_membership() {
        let server = RelayServer::new();
        let client = Uuid::new_v4();
        let msg = json!({"event": "message-sent", "data": {"tripId": "t1", "content": "hi"}});

        let reply = server.dispatch(client, &msg.to_string()).await.unwrap();
        assert_eq!(reply.event, "error");

        server.dispatch(client, &join("t1")).await;
        assert!(server.dispatch(client, &msg.to_string()).await.is_none());
    }

    #[tokio::test]
    async fn publish_excludes_origin() {
        let server = RelayServer::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        server.join(a, "trip:x").await;
        assert_eq!(
            server
                .publish("trip:x", Frame::error("only me"), Some(a))
                .await,
            0
        );
        server.join(b, "trip:x").await;
        assert_eq!(server.publish("trip:x", Frame::error("hi"), Some(a)).await, 1);
        assert_eq!(server.publish("trip:x", Frame::error("hi"), None).await, 2);
    }

    #[tokio::test]
    async fn malformed_and_unknown_frames_get_errors() {
        let server = RelayServer::new();
        let client = Uuid::new_v4();
        assert_eq!(server.dispatch(client, "not json").await.unwrap().event, "error");
        let reply = server
            .dispatch(client, r#"{"event":"launch-rockets","data":{}}"#)
            .await
            .unwrap();
        assert_eq!(reply.event, "error");
        let reply = server
            .dispatch(client, r#"{"event":"join-trip","data":{}}"#)
            .await
            .unwrap();
        assert_eq!(reply.data["message"], "tripId is required");
    }

    #[tokio::test]
    async fn disconnect_leaves_every_room() {
        let server = RelayServer::new();
        let client = Uuid::new_v4();
        server.register(client).await;
        server.dispatch(client, &join("a")).await;
        server.dispatch(client, &join("b")).await;
        assert_eq!(server.stats().await, RelayStats { connections: 1, rooms: 2 });

        server.disconnect(client).await;
        assert!(server.rooms_of(client).await.is_empty());
        assert_eq!(server.stats().await, RelayStats { connections: 0, rooms: 0 });
    }
}
