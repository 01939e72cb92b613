//! Error types for the relay server

use thiserror::Error;

/// Errors that stop the server from starting or serving
#[derive(Error, Debug)]
pub enum RelayError {
    /// Socket bind/accept failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Logging could not be initialised
    #[error("Telemetry error: {0}")]
    Telemetry(String),
}

/// Errors from client requests
///
/// These never reach a client: the relay has no negative acknowledgement,
/// so a malformed request is logged and dropped.
#[derive(Error, Debug)]
pub enum ClientRequestError {
    /// JSON parsing error, or a well-formed document missing `type`/`username`
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Valid JSON that is not an object
    #[error("Message is not a JSON object")]
    NotAnObject,

    /// Binary frame that is not valid UTF-8
    #[error("Payload is not valid UTF-8")]
    NotUtf8,
}

/// Errors when handing an outbound message to a connection
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DeliveryError {
    /// No open connection with this handle
    #[error("Unknown connection")]
    UnknownConnection,

    /// Outbound queue for the connection is full
    #[error("Outbound queue full")]
    QueueFull,

    /// Connection writer has already shut down
    #[error("Connection closed")]
    Closed,
}
