//! Wire format of the relay
//!
//! Every frame is a JSON object. Inbound frames carry a `type` and the
//! `username` they refer to; outbound frames carry a `type` and one opaque
//! payload. Payloads (`offer`, `answer`, `candidate`) are never inspected.

use crate::error::ClientRequestError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Inbound request types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    StoreUser,
    StoreOffer,
    StoreCandidate,
    SendAnswer,
    SendCandidate,
    JoinCall,
    /// Any type the relay does not know; routed as a no-op
    #[serde(other)]
    Unknown,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestKind::StoreUser => "store_user",
            RequestKind::StoreOffer => "store_offer",
            RequestKind::StoreCandidate => "store_candidate",
            RequestKind::SendAnswer => "send_answer",
            RequestKind::SendCandidate => "send_candidate",
            RequestKind::JoinCall => "join_call",
            RequestKind::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// A structurally valid inbound request
///
/// Payload fields the client leaves out deserialize to `Value::Null`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InboundMessage {
    #[serde(rename = "type")]
    pub kind: RequestKind,
    pub username: String,
    #[serde(default)]
    pub offer: Value,
    #[serde(default)]
    pub answer: Value,
    #[serde(default)]
    pub candidate: Value,
}

impl FromStr for InboundMessage {
    type Err = ClientRequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Only objects are requests; a derived struct would also accept
        // arrays by position. Duplicate keys keep the last value.
        match serde_json::from_str(s)? {
            Value::Object(fields) => Ok(serde_json::from_value(Value::Object(fields))?),
            _ => Err(ClientRequestError::NotAnObject),
        }
    }
}

impl InboundMessage {
    /// Decode a binary frame, which must hold UTF-8 JSON
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ClientRequestError> {
        let text = std::str::from_utf8(bytes).map_err(|_| ClientRequestError::NotUtf8)?;
        text.parse()
    }
}

/// Messages the relay sends to a connection
///
/// A null payload is left out of the encoded frame, so a missing offer is
/// sent as `{"type":"offer"}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    Answer {
        #[serde(skip_serializing_if = "Value::is_null")]
        answer: Value,
    },
    Candidate {
        #[serde(skip_serializing_if = "Value::is_null")]
        candidate: Value,
    },
    Offer {
        #[serde(skip_serializing_if = "Value::is_null")]
        offer: Value,
    },
}

impl OutboundMessage {
    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundMessage::Answer { .. } => "answer",
            OutboundMessage::Candidate { .. } => "candidate",
            OutboundMessage::Offer { .. } => "offer",
        }
    }
}

impl fmt::Display for OutboundMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_store_offer() {
        let msg: InboundMessage = r#"{"type":"store_offer","username":"alice","offer":{"sdp":"v=0"}}"#
            .parse()
            .unwrap();
        assert_eq!(msg.kind, RequestKind::StoreOffer);
        assert_eq!(msg.username, "alice");
        assert_eq!(msg.offer, json!({"sdp": "v=0"}));
        assert!(msg.candidate.is_null());
    }

    #[test]
    fn unknown_type_is_not_an_error() {
        let msg: InboundMessage = r#"{"type":"hang_up","username":"alice"}"#.parse().unwrap();
        assert_eq!(msg.kind, RequestKind::Unknown);
    }

    #[test]
    fn missing_username_is_malformed() {
        let err = "{\"type\":\"store_user\"}".parse::<InboundMessage>().unwrap_err();
        assert!(matches!(err, ClientRequestError::Json(_)));
    }

    #[test]
    fn non_json_is_malformed() {
        assert!("not json at all".parse::<InboundMessage>().is_err());
        assert!("[1,2,3]".parse::<InboundMessage>().is_err());
        assert!("".parse::<InboundMessage>().is_err());
    }

    #[test]
    fn positional_array_is_not_a_request() {
        let err = r#"["store_user","alice"]"#.parse::<InboundMessage>().unwrap_err();
        assert!(matches!(err, ClientRequestError::NotAnObject));
        assert!(matches!(
            "\"store_user\"".parse::<InboundMessage>().unwrap_err(),
            ClientRequestError::NotAnObject
        ));
    }

    #[test]
    fn duplicate_keys_keep_last_value() {
        let msg: InboundMessage = r#"{"type":"store_user","username":"a","username":"b"}"#
            .parse()
            .unwrap();
        assert_eq!(msg.username, "b");
    }

    #[test]
    fn binary_must_be_utf8() {
        let err = InboundMessage::from_bytes(&[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, ClientRequestError::NotUtf8));

        let msg = InboundMessage::from_bytes(br#"{"type":"join_call","username":"bob"}"#).unwrap();
        assert_eq!(msg.kind, RequestKind::JoinCall);
    }

    #[test]
    fn payloads_are_forwarded_verbatim() {
        let candidate = json!({"candidate": "candidate:1 1 UDP 2122260223 10.0.0.1 54400 typ host", "sdpMid": "0", "sdpMLineIndex": 0});
        let out = OutboundMessage::Candidate { candidate: candidate.clone() };
        let encoded: Value = serde_json::from_str(&out.to_string()).unwrap();
        assert_eq!(encoded, json!({"type": "candidate", "candidate": candidate}));
    }

    #[test]
    fn absent_offer_is_omitted() {
        let out = OutboundMessage::Offer { offer: Value::Null };
        assert_eq!(out.to_string(), r#"{"type":"offer"}"#);
    }

    #[test]
    fn answer_encoding() {
        let out = OutboundMessage::Answer { answer: json!("sdp-answer") };
        assert_eq!(out.to_string(), r#"{"type":"answer","answer":"sdp-answer"}"#);
        assert_eq!(out.kind(), "answer");
    }
}
