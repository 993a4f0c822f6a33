use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{
    mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    Mutex, RwLock,
};
use uuid::Uuid;

pub mod message_types;

/// Unique identifier for one live connection
///
/// Each WebSocket connection gets a unique id when it registers. This allows
/// for precise cleanup when connections close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Self-asserted display identity supplied at connect time.
/// Used only for `userJoined`/`userLeft` payloads, never for authorization.
#[derive(Debug, Clone)]
pub struct Identity {
    pub name: String,
    pub role: String,
}

/// Peer entry with id and outbound channel
struct Peer {
    id: ConnectionId,
    sender: UnboundedSender<String>,
}

#[derive(Default)]
struct Room {
    peers: Vec<Peer>,
    /// Set when a disconnect empties the room; a closed room is never
    /// revived, connects retry against a fresh map entry instead.
    closed: bool,
}

/// Connection registry for the live rooms of all sessions
///
/// Tracks which connections belong to which session and performs
/// broadcast/unicast delivery with deterministic cleanup. The map holds one
/// lock per room so operations on different sessions never contend; a room
/// entry is removed outright when its last peer leaves.
#[derive(Default, Clone)]
pub struct ConnectionRegistry {
    // session_id -> room
    rooms: Arc<RwLock<HashMap<String, Arc<Mutex<Room>>>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection under the room for `session_id`, creating
    /// the room if absent.
    ///
    /// Returns (connection_id, receiver, occupancy) where:
    /// - connection_id: unique handle for this connection (used for cleanup)
    /// - receiver: channel delivering broadcast/unicast payloads
    /// - occupancy: live connection count at the instant of registration,
    ///   including this one
    pub async fn connect(
        &self,
        session_id: &str,
    ) -> (ConnectionId, UnboundedReceiver<String>, usize) {
        let (tx, rx) = unbounded_channel();
        let connection_id = ConnectionId::new();

        // The map lock is never held across the room lock. A concurrent
        // disconnect may close the room we just looked up; in that case the
        // stale entry is dropped and the lookup retried.
        let occupancy = loop {
            let room = {
                let mut rooms = self.rooms.write().await;
                rooms.entry(session_id.to_string()).or_default().clone()
            };

            let mut guard = room.lock().await;
            if guard.closed {
                drop(guard);
                let mut rooms = self.rooms.write().await;
                if let Some(current) = rooms.get(session_id) {
                    if Arc::ptr_eq(current, &room) {
                        rooms.remove(session_id);
                    }
                }
                continue;
            }

            guard.peers.push(Peer {
                id: connection_id,
                sender: tx.clone(),
            });
            break guard.peers.len();
        };

        tracing::debug!(
            session_id,
            ?connection_id,
            occupancy,
            "connection registered"
        );

        (connection_id, rx, occupancy)
    }

    /// Remove a connection from its room; idempotent.
    ///
    /// If the room becomes empty the room entry itself is removed, so the
    /// registry never accumulates dangling empty rooms.
    pub async fn disconnect(&self, session_id: &str, connection_id: ConnectionId) {
        let Some(room) = self.rooms.read().await.get(session_id).cloned() else {
            return;
        };

        let remaining = {
            let mut guard = room.lock().await;
            let before = guard.peers.len();
            guard.peers.retain(|p| p.id != connection_id);
            let remaining = guard.peers.len();
            if remaining == 0 {
                guard.closed = true;
            }
            if before != remaining {
                tracing::debug!(session_id, ?connection_id, remaining, "connection removed");
            }
            remaining
        };

        if remaining == 0 {
            // Closed under the room lock above, so nobody can have joined
            // this room since; only the exact same entry is removed.
            let mut rooms = self.rooms.write().await;
            if let Some(current) = rooms.get(session_id) {
                if Arc::ptr_eq(current, &room) {
                    rooms.remove(session_id);
                    tracing::debug!(session_id, "removed empty room from registry");
                }
            }
        }
    }

    /// Deliver `payload` to every live connection in the room except
    /// `exclude` (if given).
    ///
    /// Delivery runs against a snapshot of the membership taken at call
    /// time. Peers whose channel is gone are treated as implicitly
    /// disconnected, but removal is deferred until the pass completes so one
    /// broken peer never blocks delivery to the rest.
    pub async fn broadcast(&self, session_id: &str, payload: &str, exclude: Option<ConnectionId>) {
        let Some(room) = self.rooms.read().await.get(session_id).cloned() else {
            return;
        };

        let mut failed = Vec::new();
        {
            let guard = room.lock().await;
            for peer in &guard.peers {
                if Some(peer.id) == exclude {
                    continue;
                }
                if peer.sender.send(payload.to_string()).is_err() {
                    failed.push(peer.id);
                }
            }
        }

        if !failed.is_empty() {
            tracing::debug!(
                session_id,
                dead = failed.len(),
                "pruning dead peers after broadcast pass"
            );
            for id in failed {
                self.disconnect(session_id, id).await;
            }
        }
    }

    /// Deliver `payload` to exactly one connection. A send failure here
    /// disconnects that handle immediately.
    pub async fn unicast(&self, session_id: &str, connection_id: ConnectionId, payload: &str) {
        let Some(room) = self.rooms.read().await.get(session_id).cloned() else {
            return;
        };

        let delivered = {
            let guard = room.lock().await;
            match guard.peers.iter().find(|p| p.id == connection_id) {
                Some(peer) => peer.sender.send(payload.to_string()).is_ok(),
                None => return,
            }
        };

        if !delivered {
            tracing::debug!(session_id, ?connection_id, "unicast failed, disconnecting");
            self.disconnect(session_id, connection_id).await;
        }
    }

    /// Current live connection count for a session, 0 if the room does not exist
    pub async fn occupancy(&self, session_id: &str) -> usize {
        let Some(room) = self.rooms.read().await.get(session_id).cloned() else {
            return 0;
        };
        let guard = room.lock().await;
        guard.peers.len()
    }
}
