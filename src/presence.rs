//! Connected-client presence tracking.
//!
//! Realtime clients attach over `GET /ws`; each connection is registered
//! under a fresh session id and removed when the socket closes. The registry
//! is bookkeeping only: the transcode and serving paths never consult it.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::server::AppContext;

/// One connected realtime client.
#[derive(Debug, Clone, Serialize)]
pub struct PresenceSession {
    pub id: String,
    pub connected_at: DateTime<Utc>,
}

/// Thread-safe registry of connected clients.
#[derive(Clone, Default)]
pub struct PresenceRegistry {
    sessions: Arc<DashMap<String, PresenceSession>>,
}

impl PresenceRegistry {
    /// Register a new connection and return its session id.
    pub fn connect(&self) -> String {
        let id = Uuid::new_v4().to_string();
        let session = PresenceSession {
            id: id.clone(),
            connected_at: Utc::now(),
        };
        self.sessions.insert(id.clone(), session);
        tracing::info!(session_id = %id, "Client connected");
        id
    }

    /// Remove a connection. Unknown ids are ignored.
    pub fn disconnect(&self, id: &str) {
        if let Some((_, session)) = self.sessions.remove(id) {
            tracing::info!(
                session_id = %id,
                duration_secs = (Utc::now() - session.connected_at).num_seconds(),
                "Client disconnected"
            );
        }
    }

    /// Snapshot of all connected sessions.
    pub fn active(&self) -> Vec<PresenceSession> {
        self.sessions.iter().map(|e| e.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// WebSocket endpoint feeding the registry.
pub async fn ws_handler(State(ctx): State<AppContext>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, ctx.presence.clone()))
}

async fn handle_socket(mut socket: WebSocket, presence: PresenceRegistry) {
    let id = presence.connect();
    // No payload contract; drain until the client goes away.
    while let Some(Ok(msg)) = socket.recv().await {
        if let Message::Close(_) = msg {
            break;
        }
    }
    presence.disconnect(&id);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_and_disconnect_track_sessions() {
        let registry = PresenceRegistry::default();
        assert!(registry.is_empty());

        let a = registry.connect();
        let b = registry.connect();
        assert_eq!(registry.len(), 2);
        assert_ne!(a, b);

        registry.disconnect(&a);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.active()[0].id, b);
    }

    #[test]
    fn disconnect_unknown_id_is_noop() {
        let registry = PresenceRegistry::default();
        registry.disconnect("nope");
        assert!(registry.is_empty());
    }
}
