//! Participant registry
//!
//! Maps each participant name to the connection it currently speaks through
//! and the handshake material it has stored (offer and candidates). The
//! registry is owned by the relay task and never shared, so it needs no
//! locking.

use crate::connection::ConnectionId;
use serde_json::Value;
use std::collections::HashMap;

/// One named endpoint of the handshake
#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    name: String,
    connection: ConnectionId,
    offer: Option<Value>,
    /// Append-only until the record is released
    candidates: Vec<Value>,
}

impl Participant {
    fn new(name: String, connection: ConnectionId) -> Self {
        Self {
            name,
            connection,
            offer: None,
            candidates: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The connection replies for this participant are sent to
    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    pub fn offer(&self) -> Option<&Value> {
        self.offer.as_ref()
    }

    /// Stored candidates, in insertion order
    pub fn candidates(&self) -> &[Value] {
        &self.candidates
    }

    /// Overwrite the stored offer
    pub fn set_offer(&mut self, offer: Value) {
        self.offer = Some(offer);
    }

    pub fn append_candidate(&mut self, candidate: Value) {
        self.candidates.push(candidate);
    }
}

/// Name-keyed store of participants
#[derive(Debug, Default)]
pub struct Registry {
    participants: HashMap<String, Participant>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` on `connection`, or rebind an existing record to it
    ///
    /// Returns the record and whether it was newly created. Rebinding keeps
    /// the stored offer and candidates.
    pub fn upsert(&mut self, name: &str, connection: ConnectionId) -> (&mut Participant, bool) {
        let mut created = false;
        let participant = self
            .participants
            .entry(name.to_string())
            .and_modify(|p| p.connection = connection)
            .or_insert_with(|| {
                created = true;
                Participant::new(name.to_string(), connection)
            });
        (participant, created)
    }

    pub fn find(&self, name: &str) -> Option<&Participant> {
        self.participants.get(name)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut Participant> {
        self.participants.get_mut(name)
    }

    /// Release every record bound to `connection`
    ///
    /// Connections do not know which name they registered, so this scans
    /// the whole registry. Normally at most one record matches; a client
    /// that registered several names on one socket loses all of them.
    ///
    /// The router's close handling is the only caller and keeps just the
    /// released names, for logging.
    pub fn remove_by_connection(&mut self, connection: ConnectionId) -> Vec<Participant> {
        let names: Vec<String> = self
            .participants
            .values()
            .filter(|p| p.connection == connection)
            .map(|p| p.name.clone())
            .collect();

        names
            .iter()
            .filter_map(|name| self.participants.remove(name))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}
