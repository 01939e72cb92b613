//! Message routing
//!
//! The router applies one inbound request to the registry and answers with
//! the frames that should go out. It never talks to a socket itself; the
//! relay task delivers the returned [`Delivery`] list.
//!
//! Requests that name an unknown participant, and requests of an unknown
//! type, are dropped without telling anyone. The protocol has no negative
//! acknowledgement.

use crate::connection::ConnectionId;
use crate::error::ClientRequestError;
use crate::protocol::{InboundMessage, OutboundMessage, RequestKind};
use crate::state::Registry;
use serde_json::Value;
use tracing::{debug, info, warn};

/// A frame addressed to one connection
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub to: ConnectionId,
    pub message: OutboundMessage,
}

impl Delivery {
    fn new(to: ConnectionId, message: OutboundMessage) -> Self {
        Self { to, message }
    }
}

/// Routes requests against the participant registry
#[derive(Debug, Default)]
pub struct Router {
    registry: Registry,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Decode and route one text frame from `from`
    ///
    /// Malformed input is logged and produces no deliveries.
    pub fn handle_text(&mut self, from: ConnectionId, text: &str) -> Vec<Delivery> {
        self.handle_decoded(from, text.parse())
    }

    /// Decode and route one binary frame from `from`
    pub fn handle_binary(&mut self, from: ConnectionId, bytes: &[u8]) -> Vec<Delivery> {
        self.handle_decoded(from, InboundMessage::from_bytes(bytes))
    }

    fn handle_decoded(
        &mut self,
        from: ConnectionId,
        decoded: Result<InboundMessage, ClientRequestError>,
    ) -> Vec<Delivery> {
        match decoded {
            Ok(message) => self.route(from, message),
            Err(e) => {
                warn!(connection = %from, error = %e, "dropping malformed message");
                Vec::new()
            }
        }
    }

    /// Apply a decoded request sent by `from`
    pub fn route(&mut self, from: ConnectionId, message: InboundMessage) -> Vec<Delivery> {
        let InboundMessage {
            kind,
            username,
            offer,
            answer,
            candidate,
        } = message;
        debug!(connection = %from, %kind, username, "routing message");

        if kind == RequestKind::StoreUser {
            let (_, created) = self.registry.upsert(&username, from);
            if created {
                info!(connection = %from, username, "participant registered");
            } else {
                info!(connection = %from, username, "participant reconnected");
            }
            return Vec::new();
        }

        if kind == RequestKind::Unknown {
            debug!(connection = %from, "ignoring unknown message type");
            return Vec::new();
        }

        // Every remaining type needs an existing record
        let Some(participant) = self.registry.find_mut(&username) else {
            debug!(connection = %from, %kind, username, "no such participant");
            return Vec::new();
        };

        match kind {
            RequestKind::StoreOffer => {
                participant.set_offer(offer);
                Vec::new()
            }
            RequestKind::StoreCandidate => {
                participant.append_candidate(candidate);
                Vec::new()
            }
            RequestKind::SendAnswer => vec![Delivery::new(
                participant.connection(),
                OutboundMessage::Answer { answer },
            )],
            RequestKind::SendCandidate => vec![Delivery::new(
                participant.connection(),
                OutboundMessage::Candidate { candidate },
            )],
            RequestKind::JoinCall => {
                let offer = participant.offer().cloned().unwrap_or(Value::Null);
                std::iter::once(OutboundMessage::Offer { offer })
                    .chain(
                        participant
                            .candidates()
                            .iter()
                            .cloned()
                            .map(|candidate| OutboundMessage::Candidate { candidate }),
                    )
                    .map(|message| Delivery::new(from, message))
                    .collect()
            }
            RequestKind::StoreUser | RequestKind::Unknown => Vec::new(),
        }
    }

    /// Release whatever was registered on a connection that has gone away
    ///
    /// Returns the released participant names. Nobody else is told.
    pub fn handle_close(&mut self, connection: ConnectionId) -> Vec<String> {
        let names: Vec<String> = self
            .registry
            .remove_by_connection(connection)
            .into_iter()
            .map(|p| p.name().to_string())
            .collect();
        for username in &names {
            info!(%connection, username, "participant released");
        }
        names
    }
}
