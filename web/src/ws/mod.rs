//! WebSocket transport for the relay.
//!
//! This module only adapts frames and socket lifecycles. Registry, routing
//! and session state live in the `relay` crate.

pub(crate) mod frame;
pub mod handler;
