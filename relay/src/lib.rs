//! Real-time messaging relay core.
//!
//! Clients connect over a persistent channel, authenticate with an opaque
//! device identifier and then exchange messages either with everyone
//! (broadcast) or with one named recipient (point-to-point).
//!
//! # Architecture
//!
//! - **Connection**: one transport session with a set-once identity and an
//!   exclusively owned, non-blocking outbound sink.
//! - **Registry**: identity -> connection ids, guarded by a single lock so
//!   register, deregister and snapshots are linearizable. Multiple
//!   connections per identity are allowed (multi-device).
//! - **Router**: broadcast (sender included) and point-to-point fan-out.
//!   Sinks are written outside the registry lock; one failing connection
//!   never fails its siblings.
//! - **Relay**: lifecycle entry points for the transport. Connections without
//!   an identity are closed; teardown runs exactly once via [`Session`].
//!
//! # Message Flow
//!
//! 1. Transport accepts a connection and calls [`Relay::open_session`] with
//!    the handshake headers and a sink.
//! 2. The identity is read from the handshake and bound in the registry.
//! 3. Inbound frames become [`Relay::on_broadcast_message`] or
//!    [`Relay::on_addressed_message`].
//! 4. The router snapshots the registry and writes `{"from", "body"}`
//!    envelopes to each target sink.
//! 5. Dropping the [`Session`] deregisters the connection.
//!
//! # Example
//!
//! ```rust
//! use relay::{HandshakeHeaders, Relay};
//! use std::sync::Arc;
//!
//! let relay = Arc::new(Relay::default());
//! let (sink, _rx) = relay.config().channel();
//! let handshake = HandshakeHeaders::new().with("name", "alice");
//! let session = relay.open_session(&handshake, sink).unwrap();
//! assert_eq!(session.broadcast("hello").unwrap(), 1);
//! ```

pub mod auth;
pub mod connection;
pub mod error;
pub mod lifecycle;
pub mod message;
pub mod registry;
pub mod router;
pub mod sink;

pub use auth::{identity_from_handshake, HandshakeHeaders};
pub use connection::{ConnectionId, Identity, SessionState};
pub use error::{Error, Result};
pub use lifecycle::{Relay, RelayConfig, Session};
pub use message::{Envelope, Message, ReceivedEnvelope};
pub use registry::ConnectionRegistry;
pub use router::Router;
pub use sink::{ChannelSink, DeliveryError, Outbound, OutboundSink};
