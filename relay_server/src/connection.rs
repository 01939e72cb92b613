//! Connection handles and the outbound side of each connection

use crate::error::DeliveryError;
use std::collections::HashMap;
use std::fmt;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Opaque handle for one live transport connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub Uuid);

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

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Outbound queues of every open connection
///
/// Sending never waits: a connection that cannot keep up loses the frame
/// instead of stalling the relay.
#[derive(Debug, Default)]
pub struct ConnectionTable {
    outboxes: HashMap<ConnectionId, mpsc::Sender<String>>,
}

impl ConnectionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: ConnectionId, outbox: mpsc::Sender<String>) {
        self.outboxes.insert(id, outbox);
    }

    /// Forget a connection; its writer ends once the queue drains
    pub fn remove(&mut self, id: &ConnectionId) -> bool {
        self.outboxes.remove(id).is_some()
    }

    pub fn send(&self, id: &ConnectionId, text: String) -> Result<(), DeliveryError> {
        let outbox = self
            .outboxes
            .get(id)
            .ok_or(DeliveryError::UnknownConnection)?;
        outbox.try_send(text).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.outboxes.contains_key(id)
    }

    pub fn is_empty(&self) -> bool {
        self.outboxes.is_empty()
    }
}
