//! Registry of connected WebSocket sessions.

use std::collections::HashMap;

use actix_ws::{CloseCode, CloseReason, Session};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Sessions keyed by socket id.
#[derive(Default)]
pub struct Sockets {
    sessions: Mutex<HashMap<String, Session>>,
}

impl Sockets {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a freshly opened session.
    pub async fn add(&self, socket_id: &str, session: Session) {
        self.sessions
            .lock()
            .await
            .insert(socket_id.to_owned(), session);
    }

    /// Stop tracking a session; returns whether it was known.
    pub async fn remove(&self, socket_id: &str) -> bool {
        self.sessions.lock().await.remove(socket_id).is_some()
    }

    /// Number of connected sessions.
    pub async fn count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Close every session with `1001 Going Away` and forget them.
    pub async fn close_all(&self) {
        let sessions: Vec<(String, Session)> = self.sessions.lock().await.drain().collect();
        if sessions.is_empty() {
            return;
        }
        info!(count = sessions.len(), "closing websocket sessions");
        for (socket_id, session) in sessions {
            let reason = CloseReason {
                code: CloseCode::Away,
                description: Some("server shutting down".to_owned()),
            };
            if let Err(error) = session.close(Some(reason)).await {
                warn!(%socket_id, error = %error, "websocket already closed");
            }
        }
    }
}

impl std::fmt::Debug for Sockets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sockets").finish_non_exhaustive()
    }
}
