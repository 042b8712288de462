use crate::connection::{ConnectionId, Identity};
use log::*;
use std::collections::{HashMap, HashSet};
use parking_lot::RwLock;

/// Both indices live behind one lock so every operation sees them agree.
#[derive(Debug, Default)]
struct Bindings {
    /// Routing index: identity -> every connection bound under it.
    by_identity: HashMap<Identity, HashSet<ConnectionId>>,

    /// Reverse index for deregistration without an identity hint.
    owner: HashMap<ConnectionId, Identity>,
}

impl Bindings {
    fn unbind(&mut self, connection_id: &ConnectionId) -> Option<Identity> {
        let identity = self.owner.remove(connection_id)?;
        if let Some(ids) = self.by_identity.get_mut(&identity) {
            ids.remove(connection_id);
            if ids.is_empty() {
                self.by_identity.remove(&identity);
            }
        }
        Some(identity)
    }
}

/// Shared mapping from identity to live connection ids.
///
/// Every operation is linearizable: mutations and snapshots serialize on a
/// single lock that is held only long enough to update or copy the maps.
/// Nothing here ever touches an outbound sink.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    bindings: RwLock<Bindings>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `connection_id` under `identity`. Returns false when it was
    /// already bound there.
    pub fn register(&self, identity: Identity, connection_id: ConnectionId) -> bool {
        let mut bindings = self.bindings.write();

        match bindings.owner.get(&connection_id) {
            Some(current) if *current == identity => return false,
            Some(current) => {
                warn!(
                    "Connection {connection_id} is already bound to {current}, rebinding to {identity}"
                );
                bindings.unbind(&connection_id);
            }
            None => {}
        }

        bindings.owner.insert(connection_id, identity.clone());
        bindings
            .by_identity
            .entry(identity)
            .or_default()
            .insert(connection_id);
        true
    }

    /// Removes `connection_id` from whichever identity owns it and returns
    /// that identity. Calling it again is a no-op.
    pub fn deregister(&self, connection_id: &ConnectionId) -> Option<Identity> {
        self.bindings.write().unbind(connection_id)
    }

    /// Like [`deregister`](Self::deregister) but checks the caller's idea of
    /// the owner. A mismatch is logged and the real binding is still removed.
    pub fn deregister_hinted(
        &self,
        connection_id: &ConnectionId,
        hint: &Identity,
    ) -> Option<Identity> {
        let removed = self.bindings.write().unbind(connection_id);
        if let Some(owner) = &removed {
            if owner != hint {
                warn!(
                    "Connection {connection_id} was expected under {hint} but was bound to {owner}"
                );
            }
        }
        removed
    }

    /// Snapshot of the connections bound to `identity`. Empty when offline.
    pub fn lookup(&self, identity: &Identity) -> HashSet<ConnectionId> {
        self.bindings.read()
            .by_identity
            .get(identity)
            .cloned()
            .unwrap_or_default()
    }

    /// Snapshot of every bound connection, used for broadcast.
    pub fn all_connections(&self) -> Vec<ConnectionId> {
        self.bindings.read().owner.keys().copied().collect()
    }

    pub fn identity_of(&self, connection_id: &ConnectionId) -> Option<Identity> {
        self.bindings.read().owner.get(connection_id).cloned()
    }

    pub fn connection_count(&self) -> usize {
        self.bindings.read().owner.len()
    }

    pub fn identity_count(&self) -> usize {
        self.bindings.read().by_identity.len()
    }
}
