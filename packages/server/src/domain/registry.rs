//! Connection registry aggregate.
//!
//! Owns every live `Connection` and the per-user connection index that
//! presence is derived from. Last-seen stamps are the only presence state
//! stored here; online/offline is always recomputed from the index.

use std::collections::{BTreeSet, HashMap};

use super::{
    entity::{Connection, Presence, UserIdentity},
    error::RepositoryError,
    value_object::{ConnectionId, ConnectionIdFactory, RoomName, Timestamp, UserId},
};

/// A connection removed from the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unregistered {
    pub connection: Connection,
    /// The removed connection was the user's last one
    pub went_offline: bool,
}

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, Connection>,
    by_user: HashMap<UserId, BTreeSet<ConnectionId>>,
    last_seen: HashMap<UserId, Timestamp>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a connection for an authenticated user
    pub fn register(&mut self, user: UserIdentity, connected_at: Timestamp) -> Connection {
        let id = ConnectionIdFactory::generate();
        let connection = Connection::new(id.clone(), user, connected_at);
        self.by_user
            .entry(connection.user.id.clone())
            .or_default()
            .insert(id.clone());
        self.connections.insert(id, connection.clone());
        connection
    }

    /// Remove a connection; unknown ids are ignored.
    ///
    /// Stamps last-seen with `now` when this was the user's last connection.
    pub fn unregister(
        &mut self,
        connection_id: &ConnectionId,
        now: Timestamp,
    ) -> Option<Unregistered> {
        let connection = self.connections.remove(connection_id)?;
        let user_id = &connection.user.id;

        let went_offline = match self.by_user.get_mut(user_id) {
            Some(ids) => {
                ids.remove(connection_id);
                ids.is_empty()
            }
            None => true,
        };
        if went_offline {
            self.by_user.remove(user_id);
            self.last_seen.insert(user_id.clone(), now);
        }

        Some(Unregistered {
            connection,
            went_offline,
        })
    }

    pub fn get(&self, connection_id: &ConnectionId) -> Option<&Connection> {
        self.connections.get(connection_id)
    }

    pub fn connections_of(&self, user_id: &UserId) -> BTreeSet<ConnectionId> {
        self.by_user.get(user_id).cloned().unwrap_or_default()
    }

    pub fn is_online(&self, user_id: &UserId) -> bool {
        self.by_user.get(user_id).is_some_and(|ids| !ids.is_empty())
    }

    pub fn last_seen(&self, user_id: &UserId) -> Option<Timestamp> {
        self.last_seen.get(user_id).copied()
    }

    pub fn presence(&self, user_id: &UserId) -> Presence {
        let connections = self.by_user.get(user_id).map_or(0, BTreeSet::len);
        Presence {
            user_id: user_id.clone(),
            online: connections > 0,
            connections,
            last_seen: self.last_seen(user_id),
        }
    }

    /// Record that a connection joined `room`
    pub fn add_room(
        &mut self,
        connection_id: &ConnectionId,
        room: RoomName,
    ) -> Result<(), RepositoryError> {
        let connection = self
            .connections
            .get_mut(connection_id)
            .ok_or_else(|| RepositoryError::ConnectionNotFound(connection_id.to_string()))?;
        connection.rooms.insert(room);
        Ok(())
    }

    /// Record that a connection left `room`; `false` if it was not recorded
    pub fn remove_room(&mut self, connection_id: &ConnectionId, room: &RoomName) -> bool {
        self.connections
            .get_mut(connection_id)
            .is_some_and(|connection| connection.rooms.remove(room))
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
