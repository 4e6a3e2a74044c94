use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};

struct Handoff<T> {
    payload: T,
    stored_at: DateTime<Utc>,
}

/// Store-once, read-once handoff between the questionnaire and results steps.
///
/// Each key holds at most one payload. [`SessionBridge::take`] removes what it returns, so a
/// reloaded results step finds nothing and cannot submit the same payload twice. Entries
/// older than the configured lifetime read as absent.
pub struct SessionBridge<K, T> {
    slots: Mutex<HashMap<K, Handoff<T>>>,
    ttl: Duration,
}

impl<K, T> SessionBridge<K, T>
where
    K: Eq + Hash,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<K, Handoff<T>>> {
        self.slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn put(&self, key: K, payload: T) {
        self.put_at(key, payload, Utc::now());
    }

    pub fn put_at(&self, key: K, payload: T, now: DateTime<Utc>) {
        self.slots().insert(
            key,
            Handoff {
                payload,
                stored_at: now,
            },
        );
    }

    /// Whether a live, unexpired payload is waiting under `key`. Nothing is consumed.
    pub fn contains(&self, key: &K) -> bool {
        self.contains_at(key, Utc::now())
    }

    pub fn contains_at(&self, key: &K, now: DateTime<Utc>) -> bool {
        self.slots()
            .get(key)
            .map(|handoff| now - handoff.stored_at <= self.ttl)
            .unwrap_or(false)
    }

    pub fn take(&self, key: &K) -> Option<T> {
        self.take_at(key, Utc::now())
    }

    pub fn take_at(&self, key: &K, now: DateTime<Utc>) -> Option<T> {
        self.take_if_at(key, now, |_| true)
    }

    pub fn take_if<F>(&self, key: &K, accept: F) -> Option<T>
    where
        F: FnOnce(&T) -> bool,
    {
        self.take_if_at(key, Utc::now(), accept)
    }

    /// Like [`SessionBridge::take_at`], but a live entry rejected by `accept` stays stored.
    /// Expired entries are dropped either way.
    pub fn take_if_at<F>(&self, key: &K, now: DateTime<Utc>, accept: F) -> Option<T>
    where
        F: FnOnce(&T) -> bool,
    {
        let mut slots = self.slots();
        let handoff = slots.get(key)?;
        if now - handoff.stored_at > self.ttl {
            slots.remove(key);
            return None;
        }
        if !accept(&handoff.payload) {
            return None;
        }
        slots.remove(key).map(|handoff| handoff.payload)
    }

    /// Drop expired entries, returning how many were removed.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let ttl = self.ttl;
        let mut slots = self.slots();
        let before = slots.len();
        slots.retain(|_, handoff| now - handoff.stored_at <= ttl);
        before - slots.len()
    }

    pub fn len(&self) -> usize {
        self.slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bridge() -> SessionBridge<&'static str, u32> {
        SessionBridge::new(Duration::minutes(30))
    }

    #[test]
    fn take_returns_payload_once() {
        let bridge = bridge();
        bridge.put("session-a", 7);

        assert!(bridge.contains(&"session-a"));
        assert_eq!(bridge.take(&"session-a"), Some(7));
        assert_eq!(bridge.take(&"session-a"), None);
        assert!(!bridge.contains(&"session-a"));
    }

    #[test]
    fn put_overwrites_previous_payload_for_same_key() {
        let bridge = bridge();
        bridge.put("session-a", 1);
        bridge.put("session-a", 2);

        assert_eq!(bridge.len(), 1);
        assert_eq!(bridge.take(&"session-a"), Some(2));
    }

    #[test]
    fn keys_are_isolated() {
        let bridge = bridge();
        bridge.put("session-a", 1);

        assert_eq!(bridge.take(&"session-b"), None);
        assert_eq!(bridge.take(&"session-a"), Some(1));
    }

    #[test]
    fn expired_entries_read_as_absent_and_are_consumed() {
        let bridge = bridge();
        let stored = Utc::now();
        bridge.put_at("session-a", 1, stored);

        assert_eq!(
            bridge.take_at(&"session-a", stored + Duration::minutes(31)),
            None
        );
        assert!(bridge.is_empty());
    }

    #[test]
    fn rejected_take_keeps_the_entry() {
        let bridge = bridge();
        bridge.put("session-a", 7);

        assert_eq!(bridge.take_if(&"session-a", |value| *value == 8), None);
        assert_eq!(bridge.take_if(&"session-a", |value| *value == 7), Some(7));
        assert!(bridge.is_empty());
    }

    #[test]
    fn purge_expired_only_removes_old_entries() {
        let bridge = bridge();
        let now = Utc::now();
        bridge.put_at("old", 1, now - Duration::hours(2));
        bridge.put_at("fresh", 2, now);

        assert_eq!(bridge.purge_expired(now), 1);
        assert_eq!(bridge.take_at(&"fresh", now), Some(2));
    }
}
