use crate::connection::{Connection, ConnectionId, Identity};
use crate::error::{Error, Result};
use crate::message::Message;
use crate::registry::ConnectionRegistry;
use crate::sink::Outbound;
use dashmap::DashMap;
use log::*;
use std::sync::Arc;

/// Live connections by id. Holds the sinks the router delivers to.
pub type ConnectionTable = DashMap<ConnectionId, Arc<Connection>>;

/// Delivers messages using registry snapshots.
///
/// Snapshots are taken under the registry lock; sinks are resolved and
/// written afterwards, so a slow connection never holds up the registry.
/// Broadcast includes the sender's own connections (server echoes to all).
pub struct Router {
    registry: Arc<ConnectionRegistry>,
    connections: Arc<ConnectionTable>,
}

impl Router {
    pub fn new(registry: Arc<ConnectionRegistry>, connections: Arc<ConnectionTable>) -> Self {
        Self {
            registry,
            connections,
        }
    }

    /// Dispatches on the message's recipient.
    pub fn route(&self, message: &Message) -> Result<usize> {
        match &message.recipient {
            None => Ok(self.broadcast(&message.sender, &message.payload)),
            Some(recipient) => self.send_to(&message.sender, recipient, &message.payload),
        }
    }

    /// Delivers to every live connection, the sender's included. Returns the
    /// number of connections that accepted the frame.
    pub fn broadcast(&self, sender: &Identity, payload: &str) -> usize {
        let message = Message::broadcast(sender.clone(), payload);
        let Some(frame) = Self::encode(&message) else {
            return 0;
        };

        let targets = self.registry.all_connections();
        let delivered = self.deliver_all(targets.iter().copied(), &frame);

        debug!(
            "Broadcast from {} delivered to {}/{} connection(s)",
            sender,
            delivered,
            targets.len()
        );
        delivered
    }

    /// Delivers to every connection bound to `recipient`, independently.
    /// Fails only when the recipient has no live connections at all.
    pub fn send_to(&self, sender: &Identity, recipient: &Identity, payload: &str) -> Result<usize> {
        let targets = self.registry.lookup(recipient);
        if targets.is_empty() {
            debug!("No live connections for {recipient}, message from {sender} not delivered");
            return Err(Error::RecipientOffline(recipient.clone()));
        }

        let message = Message::addressed(sender.clone(), recipient.clone(), payload);
        let Some(frame) = Self::encode(&message) else {
            return Ok(0);
        };

        let delivered = self.deliver_all(targets.iter().copied(), &frame);
        debug!(
            "Message from {} to {} delivered to {}/{} connection(s)",
            sender,
            recipient,
            delivered,
            targets.len()
        );
        Ok(delivered)
    }

    fn encode(message: &Message) -> Option<Outbound> {
        match serde_json::to_string(&message.envelope()) {
            Ok(json) => Some(Outbound::from(json)),
            Err(e) => {
                error!("Failed to serialize message from {}: {e}", message.sender);
                None
            }
        }
    }

    fn deliver_all(&self, targets: impl Iterator<Item = ConnectionId>, frame: &Outbound) -> usize {
        let mut delivered = 0;
        for connection_id in targets {
            // Clone the handle out so the table shard is not held during the send.
            let connection = match self.connections.get(&connection_id) {
                Some(entry) => Arc::clone(entry.value()),
                None => {
                    debug!("Connection {connection_id} closed before delivery, skipping");
                    continue;
                }
            };

            match connection.deliver(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => warn!("Failed to deliver to connection {connection_id}: {e}"),
            }
        }
        delivered
    }
}
