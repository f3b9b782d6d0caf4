//! Server state management.
//!
//! Shared services live in [`ServerState`]; each WebSocket connection keeps
//! its own [`Connection`] with the session token it logged in with.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::models::Identity;
use crate::services::{AuthService, FormService, DEFAULT_SESSION_TTL};
use crate::storage::Storage;

/// Shared server state.
pub type SharedState = Arc<ServerState>;

pub struct ServerState {
    pub storage: Arc<Storage>,
    pub auth: AuthService,
    pub forms: FormService,
    connections: AtomicUsize,
}

impl ServerState {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self::with_session_ttl(storage, DEFAULT_SESSION_TTL)
    }

    pub fn with_session_ttl(storage: Arc<Storage>, session_ttl: Duration) -> Self {
        Self {
            auth: AuthService::with_ttl(Arc::clone(&storage), session_ttl),
            forms: FormService::new(Arc::clone(&storage)),
            storage,
            connections: AtomicUsize::new(0),
        }
    }

    pub fn shared(storage: Storage) -> SharedState {
        Arc::new(Self::new(Arc::new(storage)))
    }

    /// Number of open WebSocket connections.
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::Relaxed)
    }

    pub(crate) fn connection_opened(&self) -> usize {
        self.connections.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn connection_closed(&self) -> usize {
        self.connections.fetch_sub(1, Ordering::Relaxed) - 1
    }
}

/// A single client connection.
pub struct Connection {
    /// Unique connection ID.
    pub id: Uuid,
    pub addr: SocketAddr,
    /// Session token once the client has logged in.
    pub token: Option<String>,
}

impl Connection {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            id: Uuid::new_v4(),
            addr,
            token: None,
        }
    }

    pub fn identity(&self, state: &ServerState) -> Option<Identity> {
        self.token
            .as_deref()
            .and_then(|token| state.auth.current_user(token))
    }
}
