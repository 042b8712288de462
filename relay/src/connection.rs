use crate::sink::{DeliveryError, Outbound, OutboundSink};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::OnceLock;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque name of a sender or recipient (a device id in practice).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Identity {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Process-local handle for one transport session. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Per-connection session state. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    Connecting = 0,
    Authenticating = 1,
    Active = 2,
    Closed = 3,
}

impl SessionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => SessionState::Connecting,
            1 => SessionState::Authenticating,
            2 => SessionState::Active,
            _ => SessionState::Closed,
        }
    }
}

/// One live transport session and its exclusively owned outbound sink.
pub struct Connection {
    id: ConnectionId,
    identity: OnceLock<Identity>,
    state: AtomicU8,
    outbound: Box<dyn OutboundSink>,
}

impl Connection {
    pub fn new(outbound: Box<dyn OutboundSink>) -> Self {
        Self {
            id: ConnectionId::next(),
            identity: OnceLock::new(),
            state: AtomicU8::new(SessionState::Connecting as u8),
            outbound,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.get()
    }

    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_active(&self) -> bool {
        self.state() == SessionState::Active
    }

    /// Sets the identity. Returns false if one was already bound.
    pub fn bind_identity(&self, identity: Identity) -> bool {
        self.identity.set(identity).is_ok()
    }

    /// Moves the session forward to `next`. Returns false when `next` would
    /// step backwards or the session is already closed.
    pub fn advance(&self, next: SessionState) -> bool {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            if SessionState::from_u8(current) == SessionState::Closed || next as u8 <= current {
                return false;
            }
            match self.state.compare_exchange(
                current,
                next as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(observed) => current = observed,
            }
        }
    }

    /// Marks the session closed. Returns true only for the first call.
    pub fn close(&self) -> bool {
        self.state.swap(SessionState::Closed as u8, Ordering::AcqRel) != SessionState::Closed as u8
    }

    pub fn deliver(&self, frame: Outbound) -> Result<(), DeliveryError> {
        if self.state() == SessionState::Closed {
            return Err(DeliveryError::Closed);
        }
        self.outbound.send(frame)
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("identity", &self.identity.get())
            .field("state", &self.state())
            .finish()
    }
}
