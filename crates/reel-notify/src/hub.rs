//! Per-user connection registry.
//!
//! Each live connection owns a bounded outbound buffer. Broadcasts never
//! block: when a buffer is full the message is dropped for that connection
//! only.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use metrics::counter;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};

use reel_models::{Job, WsMessage};

/// Outbound buffer size per connection.
pub const DEFAULT_BUFFER_SIZE: usize = 32;

/// Identifier of one registered connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Receiving side of a registered connection.
///
/// The transport task drains `receiver` and writes each JSON text frame to
/// the client. The receiver yields `None` once the connection has been
/// unregistered.
#[derive(Debug)]
pub struct Connection {
    pub id: ConnectionId,
    pub user_id: String,
    pub receiver: mpsc::Receiver<String>,
}

type UserConnections = HashMap<ConnectionId, mpsc::Sender<String>>;

/// Registry of live connections keyed by user id.
#[derive(Debug)]
pub struct Hub {
    connections: RwLock<HashMap<String, UserConnections>>,
    buffer_size: usize,
    next_id: AtomicU64,
}

impl Default for Hub {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_SIZE)
    }
}

impl Hub {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            buffer_size: buffer_size.max(1),
            next_id: AtomicU64::new(0),
        }
    }

    /// Register a new connection for a user.
    pub async fn register(&self, user_id: impl Into<String>) -> Connection {
        let user_id = user_id.into();
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let (tx, rx) = mpsc::channel(self.buffer_size);

        self.connections
            .write()
            .await
            .entry(user_id.clone())
            .or_default()
            .insert(id, tx);
        debug!(user_id = %user_id, connection = %id, "Registered connection");

        Connection {
            id,
            user_id,
            receiver: rx,
        }
    }

    /// Remove a connection and close its buffer.
    ///
    /// Returns `false` if the connection was not registered, so a second
    /// call is a no-op.
    pub async fn unregister(&self, user_id: &str, id: ConnectionId) -> bool {
        let mut connections = self.connections.write().await;
        let Some(user) = connections.get_mut(user_id) else {
            return false;
        };
        // Dropping the sender closes the buffer.
        let removed = user.remove(&id).is_some();
        if user.is_empty() {
            connections.remove(user_id);
        }
        if removed {
            debug!(user_id = %user_id, connection = %id, "Unregistered connection");
        }
        removed
    }

    /// Number of live connections for a user.
    pub async fn connection_count(&self, user_id: &str) -> usize {
        self.connections
            .read()
            .await
            .get(user_id)
            .map_or(0, HashMap::len)
    }

    /// Push a text message to every connection of a user.
    ///
    /// Returns how many connections accepted the message.
    pub async fn broadcast_to_user(&self, user_id: &str, message: &str) -> usize {
        let targets: Vec<(ConnectionId, mpsc::Sender<String>)> = {
            let connections = self.connections.read().await;
            match connections.get(user_id) {
                Some(user) => user.iter().map(|(id, tx)| (*id, tx.clone())).collect(),
                None => return 0,
            }
        };

        let mut delivered = 0;
        for (id, tx) in targets {
            match tx.try_send(message.to_string()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    counter!("reel_hub_dropped_messages_total").increment(1);
                    warn!(user_id = %user_id, connection = %id, "Connection buffer full, dropping message");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!(user_id = %user_id, connection = %id, "Connection closed, skipping");
                }
            }
        }
        delivered
    }

    /// Serialize and broadcast a message envelope.
    pub async fn send_message(&self, user_id: &str, message: &WsMessage) -> usize {
        match message.to_json() {
            Ok(json) => self.broadcast_to_user(user_id, &json).await,
            Err(e) => {
                warn!("Failed to serialize notification: {}", e);
                0
            }
        }
    }

    /// Broadcast `{type:"job_updated", job}` to the job's owner.
    pub async fn notify_job(&self, job: &Job) -> usize {
        self.send_message(&job.user_id, &WsMessage::job_updated(job.clone()))
            .await
    }

    /// Send a keep-alive to every connection.
    pub async fn ping_all(&self) -> usize {
        let users: Vec<String> = self.connections.read().await.keys().cloned().collect();
        let mut delivered = 0;
        for user_id in users {
            delivered += self.send_message(&user_id, &WsMessage::Ping).await;
        }
        delivered
    }
}
