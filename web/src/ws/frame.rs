use relay::Identity;
use serde::{Deserialize, Serialize};

/// Text frames a client may send once connected.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum ClientFrame {
    /// `{"type":"broadcast","body":"..."}`
    Broadcast { body: String },
    /// `{"type":"send_to","to":"bob","body":"..."}`
    SendTo { to: Identity, body: String },
}

/// Frames the server sends besides delivered envelopes.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum ServerFrame<'a> {
    Error {
        reason: ErrorReason,
        #[serde(skip_serializing_if = "Option::is_none")]
        recipient: Option<&'a Identity>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ErrorReason {
    RecipientOffline,
    MalformedFrame,
    Unauthenticated,
}

impl<'a> ServerFrame<'a> {
    pub(crate) fn recipient_offline(recipient: &'a Identity) -> Self {
        ServerFrame::Error {
            reason: ErrorReason::RecipientOffline,
            recipient: Some(recipient),
        }
    }

    pub(crate) fn error(reason: ErrorReason) -> Self {
        ServerFrame::Error {
            reason,
            recipient: None,
        }
    }
}
