use crate::auth::{identity_from_handshake, HandshakeHeaders};
use crate::connection::{Connection, ConnectionId, Identity, SessionState};
use crate::error::{Error, Result};
use crate::registry::ConnectionRegistry;
use crate::router::{ConnectionTable, Router};
use crate::sink::{ChannelSink, Outbound, OutboundSink};
use log::*;
use std::sync::Arc;
use tokio::sync::mpsc;

pub const DEFAULT_OUTBOUND_QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Frames buffered per connection before further deliveries are dropped.
    pub outbound_queue_capacity: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            outbound_queue_capacity: DEFAULT_OUTBOUND_QUEUE_CAPACITY,
        }
    }
}

impl RelayConfig {
    /// A bounded outbound queue sized for one connection.
    pub fn channel(&self) -> (ChannelSink, mpsc::Receiver<Outbound>) {
        ChannelSink::channel(self.outbound_queue_capacity)
    }
}

/// Entry points for the transport layer.
///
/// Owns the registry and the live connection table and drives each
/// connection through `Connecting -> Authenticating -> Active -> Closed`.
/// The host constructs one and shares it via `Arc`.
pub struct Relay {
    config: RelayConfig,
    registry: Arc<ConnectionRegistry>,
    connections: Arc<ConnectionTable>,
    router: Router,
}

impl Relay {
    pub fn new(config: RelayConfig) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let connections = Arc::new(ConnectionTable::new());
        let router = Router::new(Arc::clone(&registry), Arc::clone(&connections));

        Self {
            config,
            registry,
            connections,
            router,
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn state_of(&self, connection_id: &ConnectionId) -> Option<SessionState> {
        self.connections
            .get(connection_id)
            .map(|entry| entry.value().state())
    }

    /// Tracks a freshly accepted, not yet authenticated, transport session.
    pub fn accept(&self, outbound: impl OutboundSink + 'static) -> ConnectionId {
        let connection = Arc::new(Connection::new(Box::new(outbound)));
        let connection_id = connection.id();
        self.connections.insert(connection_id, connection);

        debug!("Accepted connection {connection_id}");
        connection_id
    }

    /// Resolves the identity from `handshake` and activates the connection.
    /// A connection without an identity is closed, not left anonymous.
    pub fn authenticate(
        &self,
        connection_id: ConnectionId,
        handshake: &HandshakeHeaders,
    ) -> Result<Identity> {
        let connection = self
            .connections
            .get(&connection_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(Error::Unauthenticated(connection_id))?;

        if !connection.advance(SessionState::Authenticating) {
            return match connection.identity() {
                Some(identity) if connection.is_active() => Ok(identity.clone()),
                _ => Err(Error::Unauthenticated(connection_id)),
            };
        }

        let Some(identity) = identity_from_handshake(handshake) else {
            warn!("Rejecting connection {connection_id}: handshake carried no identity");
            self.on_disconnect(connection_id);
            return Err(Error::AuthenticationFailed);
        };

        connection.bind_identity(identity.clone());
        self.registry.register(identity.clone(), connection_id);

        // A disconnect may have raced in after the registry insert; undo it.
        if !connection.advance(SessionState::Active) {
            self.registry.deregister(&connection_id);
            return Err(Error::Unauthenticated(connection_id));
        }

        info!("Connection {connection_id} authenticated as {identity}");
        Ok(identity)
    }

    /// Accepts and authenticates in one step.
    pub fn on_connect(
        &self,
        handshake: &HandshakeHeaders,
        outbound: impl OutboundSink + 'static,
    ) -> Result<ConnectionId> {
        let connection_id = self.accept(outbound);
        self.authenticate(connection_id, handshake)?;
        Ok(connection_id)
    }

    /// Like [`on_connect`](Self::on_connect) but hands back a guard that
    /// disconnects when dropped, whichever way the transport task exits.
    pub fn open_session(
        self: &Arc<Self>,
        handshake: &HandshakeHeaders,
        outbound: impl OutboundSink + 'static,
    ) -> Result<Session> {
        let connection_id = self.on_connect(handshake, outbound)?;
        let identity = self
            .registry
            .identity_of(&connection_id)
            .ok_or(Error::Unauthenticated(connection_id))?;

        Ok(Session {
            relay: Arc::clone(self),
            connection_id,
            identity,
        })
    }

    /// Tears a connection down. Only the first call for an id does anything;
    /// returns whether this call was it.
    pub fn on_disconnect(&self, connection_id: ConnectionId) -> bool {
        let Some((_, connection)) = self.connections.remove(&connection_id) else {
            return false;
        };

        // Closed first so in-flight deliveries holding the handle are skipped.
        connection.close();
        match connection.identity() {
            Some(identity) => {
                self.registry.deregister_hinted(&connection_id, identity);
                info!("Connection {connection_id} ({identity}) closed");
            }
            None => {
                self.registry.deregister(&connection_id);
                debug!("Unauthenticated connection {connection_id} closed");
            }
        }
        true
    }

    pub fn on_broadcast_message(&self, connection_id: ConnectionId, payload: &str) -> Result<usize> {
        let sender = self.active_identity(connection_id)?;
        Ok(self.router.broadcast(&sender, payload))
    }

    pub fn on_addressed_message(
        &self,
        connection_id: ConnectionId,
        recipient: &Identity,
        payload: &str,
    ) -> Result<usize> {
        let sender = self.active_identity(connection_id)?;
        self.router.send_to(&sender, recipient, payload)
    }

    fn active_identity(&self, connection_id: ConnectionId) -> Result<Identity> {
        let entry = self
            .connections
            .get(&connection_id)
            .ok_or(Error::Unauthenticated(connection_id))?;
        let connection = entry.value();

        match connection.identity() {
            Some(identity) if connection.is_active() => Ok(identity.clone()),
            _ => Err(Error::Unauthenticated(connection_id)),
        }
    }
}

impl Default for Relay {
    fn default() -> Self {
        Self::new(RelayConfig::default())
    }
}

/// An Active connection. Dropping it disconnects exactly once.
pub struct Session {
    relay: Arc<Relay>,
    connection_id: ConnectionId,
    identity: Identity,
}

impl Session {
    pub fn id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn broadcast(&self, payload: &str) -> Result<usize> {
        self.relay.on_broadcast_message(self.connection_id, payload)
    }

    pub fn send_to(&self, recipient: &Identity, payload: &str) -> Result<usize> {
        self.relay
            .on_addressed_message(self.connection_id, recipient, payload)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.relay.on_disconnect(self.connection_id);
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("connection_id", &self.connection_id)
            .field("identity", &self.identity)
            .finish()
    }
}
