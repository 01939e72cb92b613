//! The relay task
//!
//! A single task owns the router (and with it the registry) and the table
//! of outbound queues. Connection tasks feed it [`RelayEvent`]s over one
//! channel, and it handles them strictly one at a time, so registry access
//! is serialized without a lock.

use crate::connection::{ConnectionId, ConnectionTable};
use crate::handler::{Delivery, Router};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// What a connection task reports to the relay
#[derive(Debug)]
pub enum RelayEvent {
    /// A connection was accepted; frames for it go to `outbox`
    Opened {
        connection: ConnectionId,
        outbox: mpsc::Sender<String>,
    },
    /// A text frame arrived
    Text { connection: ConnectionId, text: String },
    /// A binary frame arrived
    Binary {
        connection: ConnectionId,
        bytes: Vec<u8>,
    },
    /// The connection is gone; sent exactly once, after every frame
    Closed { connection: ConnectionId },
}

/// Handle for submitting events to a running relay
#[derive(Debug, Clone)]
pub struct RelayHandle {
    tx: mpsc::Sender<RelayEvent>,
}

impl RelayHandle {
    /// Queue an event, waiting if the relay is busy
    ///
    /// Returns `false` once the relay has stopped.
    pub async fn submit(&self, event: RelayEvent) -> bool {
        self.tx.send(event).await.is_ok()
    }
}

/// Owner of all routing state
#[derive(Debug, Default)]
pub struct Relay {
    router: Router,
    connections: ConnectionTable,
}

impl Relay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn the relay on the current runtime
    pub fn spawn(self, capacity: usize) -> (RelayHandle, tokio::task::JoinHandle<Relay>) {
        let (tx, rx) = mpsc::channel(capacity);
        let task = tokio::spawn(self.run(rx));
        (RelayHandle { tx }, task)
    }

    /// Process events until every sender is dropped
    pub async fn run(mut self, mut events: mpsc::Receiver<RelayEvent>) -> Self {
        while let Some(event) = events.recv().await {
            self.handle_event(event);
        }
        debug!("relay stopped");
        self
    }

    /// Handle one event to completion
    pub fn handle_event(&mut self, event: RelayEvent) {
        match event {
            RelayEvent::Opened { connection, outbox } => {
                debug!(%connection, "connection opened");
                self.connections.insert(connection, outbox);
            }
            RelayEvent::Text { connection, text } => {
                let deliveries = self.router.handle_text(connection, &text);
                self.deliver(deliveries);
            }
            RelayEvent::Binary { connection, bytes } => {
                let deliveries = self.router.handle_binary(connection, &bytes);
                self.deliver(deliveries);
            }
            RelayEvent::Closed { connection } => {
                self.router.handle_close(connection);
                self.connections.remove(&connection);
                debug!(%connection, "connection closed");
            }
        }
    }

    fn deliver(&self, deliveries: Vec<Delivery>) {
        for Delivery { to, message } in deliveries {
            let kind = message.kind();
            if let Err(e) = self.connections.send(&to, message.to_string()) {
                warn!(connection = %to, kind, error = %e, "dropping outbound message");
            } else {
                debug!(connection = %to, kind, "delivered");
            }
        }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn connections(&self) -> &ConnectionTable {
        &self.connections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn open(relay: &mut Relay) -> (ConnectionId, mpsc::Receiver<String>) {
        let connection = ConnectionId::new();
        let (outbox, rx) = mpsc::channel(16);
        relay.handle_event(RelayEvent::Opened { connection, outbox });
        (connection, rx)
    }

    fn text(relay: &mut Relay, connection: ConnectionId, value: Value) {
        relay.handle_event(RelayEvent::Text {
            connection,
            text: value.to_string(),
        });
    }

    fn received(rx: &mut mpsc::Receiver<String>) -> Vec<Value> {
        let mut frames = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            frames.push(serde_json::from_str(&frame).unwrap());
        }
        frames
    }

    #[test]
    fn join_call_scenario_only_reaches_joiner() {
        let mut relay = Relay::new();
        let (a, mut rx_a) = open(&mut relay);
        let (b, mut rx_b) = open(&mut relay);

        text(&mut relay, a, json!({"type": "store_user", "username": "alice"}));
        text(&mut relay, b, json!({"type": "store_user", "username": "bob"}));
        text(&mut relay, a, json!({"type": "store_offer", "username": "alice", "offer": "sdp1"}));
        text(&mut relay, a, json!({"type": "store_candidate", "username": "alice", "candidate": "c1"}));
        text(&mut relay, b, json!({"type": "join_call", "username": "alice"}));

        assert_eq!(
            received(&mut rx_b),
            vec![
                json!({"type": "offer", "offer": "sdp1"}),
                json!({"type": "candidate", "candidate": "c1"}),
            ]
        );
        assert!(received(&mut rx_a).is_empty());
    }

    #[test]
    fn send_after_close_is_silent() {
        let mut relay = Relay::new();
        let (a, _rx_a) = open(&mut relay);
        let (b, mut rx_b) = open(&mut relay);

        text(&mut relay, a, json!({"type": "store_user", "username": "alice"}));
        relay.handle_event(RelayEvent::Closed { connection: a });
        assert!(!relay.connections().contains(&a));
        assert!(relay.router().registry().find("alice").is_none());

        text(&mut relay, b, json!({"type": "send_answer", "username": "alice", "answer": "x"}));
        assert!(received(&mut rx_b).is_empty());
    }

    #[test]
    fn delivery_to_dead_writer_does_not_panic() {
        let mut relay = Relay::new();
        let (a, rx_a) = open(&mut relay);
        let (b, _rx_b) = open(&mut relay);
        text(&mut relay, a, json!({"type": "store_user", "username": "alice"}));
        drop(rx_a);

        text(&mut relay, b, json!({"type": "send_answer", "username": "alice", "answer": "x"}));
        assert!(relay.router().registry().find("alice").is_some());
    }

    #[test]
    fn malformed_frames_are_dropped() {
        let mut relay = Relay::new();
        let (a, mut rx_a) = open(&mut relay);
        relay.handle_event(RelayEvent::Text {
            connection: a,
            text: "\u{0}garbage".into(),
        });
        relay.handle_event(RelayEvent::Binary {
            connection: a,
            bytes: vec![0xff, 0xff],
        });
        assert!(relay.router().registry().is_empty());
        assert!(received(&mut rx_a).is_empty());
    }

    #[tokio::test]
    async fn spawned_relay_processes_in_order() {
        let (handle, task) = Relay::new().spawn(8);
        let connection = ConnectionId::new();
        let (outbox, mut rx) = mpsc::channel(8);

        assert!(handle.submit(RelayEvent::Opened { connection, outbox }).await);
        for value in [
            json!({"type": "store_user", "username": "alice"}),
            json!({"type": "store_offer", "username": "alice", "offer": "o"}),
            json!({"type": "join_call", "username": "alice"}),
        ] {
            let event = RelayEvent::Text {
                connection,
                text: value.to_string(),
            };
            assert!(handle.submit(event).await);
        }

        let frame = rx.recv().await.unwrap();
        assert_eq!(frame, r#"{"type":"offer","offer":"o"}"#);

        drop(handle);
        let relay = task.await.unwrap();
        assert_eq!(relay.router().registry().len(), 1);
    }
}
