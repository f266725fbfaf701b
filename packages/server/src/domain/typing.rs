//! Typing indicator state machine.
//!
//! Per (room, user) there are two states: idle (not tracked) and typing
//! (tracked with a deadline). A tracker instance belongs to one room, so it
//! is keyed by user only.
//!
//! Expired entries are only dropped by [`TypingTracker::expire`], which is
//! what makes the caller emit exactly one `stop_typing` per expiry. Queries
//! compare against the deadline, so an expired entry is never reported as
//! active even before it is swept.

use std::{collections::HashMap, time::Duration};

use tokio::time::Instant;

use super::value_object::UserId;

/// Reference typing timeout
pub const DEFAULT_TYPING_TIMEOUT: Duration = Duration::from_secs(1);

/// Result of a `typing` signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingTransition {
    /// idle → typing; a `typing` event must be broadcast
    Started,
    /// typing → typing; the deadline moved, nothing is broadcast
    Refreshed,
}

#[derive(Debug, Clone)]
pub struct TypingTracker {
    timeout: Duration,
    deadlines: HashMap<UserId, Instant>,
}

impl TypingTracker {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            deadlines: HashMap::new(),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Handle a `typing` signal.
    ///
    /// Callers must run [`expire`](Self::expire) first, so an entry that is
    /// still present here is live and gets refreshed.
    pub fn start(&mut self, user_id: &UserId, now: Instant) -> TypingTransition {
        let deadline = now + self.timeout;
        match self.deadlines.insert(user_id.clone(), deadline) {
            Some(_) => TypingTransition::Refreshed,
            None => TypingTransition::Started,
        }
    }

    /// Handle a `stop_typing` signal, a departure or a disconnect.
    ///
    /// Returns `true` if the user was tracked, in which case a `stop_typing`
    /// event is still owed to the room.
    pub fn stop(&mut self, user_id: &UserId) -> bool {
        self.deadlines.remove(user_id).is_some()
    }

    /// Drop every entry whose deadline has passed and return those users, sorted
    pub fn expire(&mut self, now: Instant) -> Vec<UserId> {
        let mut expired: Vec<UserId> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(user_id, _)| user_id.clone())
            .collect();
        for user_id in &expired {
            self.deadlines.remove(user_id);
        }
        expired.sort();
        expired
    }

    pub fn is_typing(&self, user_id: &UserId, now: Instant) -> bool {
        self.deadlines
            .get(user_id)
            .is_some_and(|deadline| *deadline > now)
    }

    /// Users whose indicator is live at `now`, sorted
    pub fn active(&self, now: Instant) -> Vec<UserId> {
        let mut users: Vec<UserId> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline > now)
            .map(|(user_id, _)| user_id.clone())
            .collect();
        users.sort();
        users
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    #[test]
    fn test_first_signal_starts_typing() {
        // テスト項目: idle 状態での typing シグナルは Started になる
        // given (前提条件):
        let mut tracker = TypingTracker::new(Duration::from_secs(1));
        let now = Instant::now();

        // when (操作):
        let transition = tracker.start(&user("alice"), now);

        // then (期待する結果):
        assert_eq!(transition, TypingTransition::Started);
        assert!(tracker.is_typing(&user("alice"), now));
    }

    #[test]
    fn test_repeated_signal_refreshes_deadline() {
        // テスト項目: タイムアウト内の再シグナルは Refreshed になり、期限が延長される
        // given (前提条件):
        let mut tracker = TypingTracker::new(Duration::from_millis(1000));
        let t0 = Instant::now();
        tracker.start(&user("alice"), t0);

        // when (操作):
        let transition = tracker.start(&user("alice"), t0 + Duration::from_millis(800));

        // then (期待する結果): 最初の期限を過ぎても延長後の期限内なら typing のまま
        assert_eq!(transition, TypingTransition::Refreshed);
        assert!(tracker.is_typing(&user("alice"), t0 + Duration::from_millis(1500)));
        assert!(!tracker.is_typing(&user("alice"), t0 + Duration::from_millis(1800)));
    }

    #[test]
    fn test_expired_entry_is_not_active_before_sweep() {
        // テスト項目: 期限切れのエントリは expire 前でもアクティブとして報告されない
        // given (前提条件):
        let mut tracker = TypingTracker::new(Duration::from_millis(1000));
        let t0 = Instant::now();
        tracker.start(&user("alice"), t0);

        // when (操作):
        let later = t0 + Duration::from_millis(1000);

        // then (期待する結果):
        assert!(!tracker.is_typing(&user("alice"), later));
        assert!(tracker.active(later).is_empty());
        assert!(!tracker.is_empty());
    }

    #[test]
    fn test_expire_reports_each_user_once() {
        // テスト項目: expire は期限切れのユーザーを一度だけ返す
        // given (前提条件):
        let mut tracker = TypingTracker::new(Duration::from_millis(1000));
        let t0 = Instant::now();
        tracker.start(&user("bob"), t0);
        tracker.start(&user("alice"), t0);
        tracker.start(&user("carol"), t0 + Duration::from_millis(900));

        // when (操作):
        let first = tracker.expire(t0 + Duration::from_millis(1200));
        let second = tracker.expire(t0 + Duration::from_millis(1200));

        // then (期待する結果):
        assert_eq!(first, vec![user("alice"), user("bob")]);
        assert!(second.is_empty());
        assert_eq!(
            tracker.active(t0 + Duration::from_millis(1200)),
            vec![user("carol")]
        );
    }

    #[test]
    fn test_stop_reports_whether_user_was_tracked() {
        // テスト項目: stop は追跡中だった場合のみ true を返す
        // given (前提条件):
        let mut tracker = TypingTracker::new(Duration::from_secs(1));
        tracker.start(&user("alice"), Instant::now());

        // when (操作):
        let first = tracker.stop(&user("alice"));
        let second = tracker.stop(&user("alice"));

        // then (期待する結果):
        assert!(first);
        assert!(!second);
        assert!(tracker.is_empty());
    }
}
