//! Room aggregate: membership and typing state of one room.
//!
//! A `Room` is the unit of mutual exclusion. The repository hands it out
//! behind its own lock, and every read or mutation of membership, typing
//! state and dispatch order for the room happens while holding that lock.

use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

use serde::Serialize;
use tokio::time::Instant;

use super::{
    entity::{UserIdentity, UserSummary},
    typing::{TypingTracker, TypingTransition},
    value_object::{ConnectionId, RoomName, Timestamp, UserId},
};

/// Result of adding a connection to a room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The connection was already a member; nothing changed
    AlreadyMember,
    /// The connection was added. `first_for_user` is set when no other
    /// connection of the same user was in the room.
    Joined { first_for_user: bool },
}

/// Result of removing a connection from a room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveOutcome {
    pub user: UserIdentity,
    /// No other connection of the user remains in the room
    pub last_for_user: bool,
    /// The user's typing indicator was removed and `stop_typing` is owed
    pub typing_cleared: bool,
}

#[derive(Debug, Clone)]
pub struct Room {
    pub name: RoomName,
    pub created_at: Timestamp,
    members: BTreeMap<ConnectionId, UserIdentity>,
    typing: TypingTracker,
    /// Kept in the arena even when empty (configured default rooms)
    pinned: bool,
    /// At least one message of this room is known to be persisted
    has_history: bool,
    /// Removed from the arena; holders of a stale handle must look it up again
    retired: bool,
}

impl Room {
    pub fn new(name: RoomName, created_at: Timestamp, typing_timeout: Duration) -> Self {
        Self {
            name,
            created_at,
            members: BTreeMap::new(),
            typing: TypingTracker::new(typing_timeout),
            pinned: false,
            has_history: false,
            retired: false,
        }
    }

    /// Keep this room in the arena even while it has no members
    pub fn pin(&mut self) {
        self.pinned = true;
    }

    pub fn record_history(&mut self) {
        self.has_history = true;
    }

    /// No members, no typing state, no history and not pinned
    pub fn is_disposable(&self) -> bool {
        !self.pinned && !self.has_history && self.members.is_empty() && self.typing.is_empty()
    }

    pub fn retire(&mut self) {
        self.retired = true;
    }

    pub fn is_retired(&self) -> bool {
        self.retired
    }

    /// Add a connection. Joining twice is a no-op.
    pub fn join(&mut self, connection_id: ConnectionId, user: UserIdentity) -> JoinOutcome {
        if self.members.contains_key(&connection_id) {
            return JoinOutcome::AlreadyMember;
        }
        let first_for_user = !self.has_user(&user.id);
        self.members.insert(connection_id, user);
        JoinOutcome::Joined { first_for_user }
    }

    /// Remove a connection. Leaving a room the connection is not in is a no-op.
    ///
    /// Clears the user's typing indicator in this room.
    pub fn leave(&mut self, connection_id: &ConnectionId) -> Option<LeaveOutcome> {
        let user = self.members.remove(connection_id)?;
        let last_for_user = !self.has_user(&user.id);
        let typing_cleared = self.typing.stop(&user.id);
        Some(LeaveOutcome {
            user,
            last_for_user,
            typing_cleared,
        })
    }

    pub fn is_member(&self, connection_id: &ConnectionId) -> bool {
        self.members.contains_key(connection_id)
    }

    pub fn member(&self, connection_id: &ConnectionId) -> Option<&UserIdentity> {
        self.members.get(connection_id)
    }

    pub fn has_user(&self, user_id: &UserId) -> bool {
        self.members.values().any(|user| &user.id == user_id)
    }

    /// Fan-out targets: every member connection
    pub fn member_connections(&self) -> Vec<ConnectionId> {
        self.members.keys().cloned().collect()
    }

    /// Member connections not owned by `user_id`
    pub fn connections_excluding_user(&self, user_id: &UserId) -> Vec<ConnectionId> {
        self.members
            .iter()
            .filter(|(_, user)| &user.id != user_id)
            .map(|(connection_id, _)| connection_id.clone())
            .collect()
    }

    /// Online users in this room, one entry per user, sorted by user id
    pub fn online_users(&self) -> Vec<UserSummary> {
        let mut seen = BTreeSet::new();
        let mut users: Vec<UserSummary> = self
            .members
            .values()
            .filter(|user| seen.insert(user.id.clone()))
            .map(UserIdentity::summary)
            .collect();
        users.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        users
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Handle a `typing` signal from a member's user
    pub fn start_typing(&mut self, user_id: &UserId, now: Instant) -> TypingTransition {
        self.typing.start(user_id, now)
    }

    /// Handle a `stop_typing` signal; `true` if a `stop_typing` event is owed
    pub fn stop_typing(&mut self, user_id: &UserId) -> bool {
        self.typing.stop(user_id)
    }

    /// Drop expired typing indicators and return their users
    pub fn expire_typing(&mut self, now: Instant) -> Vec<UserId> {
        self.typing.expire(now)
    }

    pub fn typing_users(&self, now: Instant) -> Vec<UserId> {
        self.typing.active(now)
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            name: self.name.clone(),
            created_at: self.created_at,
            users: self.online_users(),
            connection_count: self.member_count(),
        }
    }
}

/// Read-only copy of a room's state, for queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomSnapshot {
    pub name: RoomName,
    pub created_at: Timestamp,
    pub users: Vec<UserSummary>,
    pub connection_count: usize,
}
