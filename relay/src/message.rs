use crate::connection::Identity;
use serde::{Deserialize, Serialize};

/// An inbound application message. `recipient == None` means broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub sender: Identity,
    pub recipient: Option<Identity>,
    pub payload: String,
}

impl Message {
    pub fn broadcast(sender: Identity, payload: impl Into<String>) -> Self {
        Self {
            sender,
            recipient: None,
            payload: payload.into(),
        }
    }

    pub fn addressed(sender: Identity, recipient: Identity, payload: impl Into<String>) -> Self {
        Self {
            sender,
            recipient: Some(recipient),
            payload: payload.into(),
        }
    }

    pub fn is_broadcast(&self) -> bool {
        self.recipient.is_none()
    }

    pub fn envelope(&self) -> Envelope<'_> {
        Envelope {
            from: &self.sender,
            body: &self.payload,
        }
    }
}

/// What a recipient connection actually receives: `{"from": .., "body": ..}`.
#[derive(Debug, Serialize)]
pub struct Envelope<'a> {
    pub from: &'a Identity,
    pub body: &'a str,
}

/// Owned form of [`Envelope`], for clients and tests decoding frames.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReceivedEnvelope {
    pub from: Identity,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_wire_format() {
        let message = Message::addressed("alice".into(), "bob".into(), "hi");
        let json = serde_json::to_string(&message.envelope()).unwrap();
        assert_eq!(json, r#"{"from":"alice","body":"hi"}"#);
    }

    #[test]
    fn test_broadcast_has_no_recipient() {
        let message = Message::broadcast("alice".into(), "hello all");
        assert!(message.is_broadcast());
        assert!(!Message::addressed("a".into(), "b".into(), "").is_broadcast());
    }
}
