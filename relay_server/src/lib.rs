//! WebSocket rendezvous relay for WebRTC handshakes
//!
//! Two peers use this relay to swap the session descriptions and ICE
//! candidates they need to open a direct connection. The relay never looks
//! inside those payloads; it remembers them under a participant name and
//! forwards them to the right socket.
//!
//! # Protocol
//!
//! Every frame is a JSON object. Clients send:
//!
//! - `{"type":"store_user","username":"alice"}` - bind `alice` to this
//!   socket (a second `store_user` for the same name moves it here)
//! - `{"type":"store_offer","username":"alice","offer":...}` - remember
//!   alice's offer, replacing any previous one
//! - `{"type":"store_candidate","username":"alice","candidate":...}` -
//!   append to alice's candidate list
//! - `{"type":"send_answer","username":"alice","answer":...}` - forward an
//!   answer to alice's socket
//! - `{"type":"send_candidate","username":"alice","candidate":...}` -
//!   forward a candidate to alice's socket
//! - `{"type":"join_call","username":"alice"}` - fetch alice's offer and
//!   every stored candidate, in order, on this socket
//!
//! The relay sends `{"type":"offer","offer":...}`,
//! `{"type":"answer","answer":...}` and
//! `{"type":"candidate","candidate":...}`.
//!
//! Requests naming an unknown participant, unknown types and undecodable
//! frames are dropped silently. When a socket closes, every name bound to
//! it is forgotten; nobody is notified.
//!
//! # Example
//!
//! ```bash
//! # Start the relay
//! relay-server --port 3000
//!
//! # Register and store an offer
//! websocat ws://127.0.0.1:3000
//! {"type":"store_user","username":"alice"}
//! {"type":"store_offer","username":"alice","offer":{"type":"offer","sdp":"v=0..."}}
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod connection;
pub mod error;
pub mod handler;
pub mod protocol;
pub mod relay;
pub mod server;
pub mod state;
pub mod telemetry;

pub use config::Config;
pub use connection::ConnectionId;
pub use error::{ClientRequestError, DeliveryError, RelayError};
pub use handler::{Delivery, Router};
pub use protocol::{InboundMessage, OutboundMessage, RequestKind};
pub use relay::{Relay, RelayEvent, RelayHandle};
pub use server::RelayServer;
pub use state::{Participant, Registry};
