//! Error types for the relay core.

use crate::connection::{ConnectionId, Identity};
use std::fmt;

pub type Result<T> = core::result::Result<T, Error>;

/// Conditions reported to the transport layer. None of them are fatal to the
/// relay itself; per-connection delivery failures never surface here and are
/// logged by the router instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The handshake carried no resolvable identity. The connection has been
    /// closed and never reached the registry.
    AuthenticationFailed,

    /// A point-to-point recipient has no live connections. Callers usually
    /// relay this back to the sender.
    RecipientOffline(Identity),

    /// A message arrived on a connection that is not (or no longer) Active.
    Unauthenticated(ConnectionId),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::AuthenticationFailed => write!(f, "Authentication failed: no identity in handshake"),
            Error::RecipientOffline(identity) => write!(f, "Recipient offline: {}", identity),
            Error::Unauthenticated(connection_id) => {
                write!(f, "Unauthenticated connection: {}", connection_id)
            }
        }
    }
}

impl std::error::Error for Error {}
