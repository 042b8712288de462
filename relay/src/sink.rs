use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};

/// A serialized frame ready for the transport. Cloning shares the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound(Arc<str>);

impl Outbound {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Outbound {
    fn from(text: &str) -> Self {
        Self(Arc::from(text))
    }
}

impl From<String> for Outbound {
    fn from(text: String) -> Self {
        Self(Arc::from(text))
    }
}

impl fmt::Display for Outbound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why a single delivery attempt failed. Never fatal to a fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    /// The receiving side of the connection is gone.
    Closed,
    /// The connection's bounded queue is full; the frame was dropped.
    QueueFull,
}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryError::Closed => write!(f, "connection closed"),
            DeliveryError::QueueFull => write!(f, "outbound queue full"),
        }
    }
}

impl std::error::Error for DeliveryError {}

/// Accepts outbound frames for exactly one connection.
///
/// Implementations must not block: the router calls `send` for many
/// connections in a row and a stuck recipient must not stall the rest.
pub trait OutboundSink: Send + Sync {
    fn send(&self, frame: Outbound) -> Result<(), DeliveryError>;
}

/// Bounded, fire-and-forget queue drained by the transport's writer task.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::Sender<Outbound>,
}

impl ChannelSink {
    pub fn new(sender: mpsc::Sender<Outbound>) -> Self {
        Self { sender }
    }

    /// Builds a sink together with the receiver the transport drains.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }
}

impl OutboundSink for ChannelSink {
    fn send(&self, frame: Outbound) -> Result<(), DeliveryError> {
        self.sender.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::QueueFull,
            TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }
}
