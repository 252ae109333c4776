use std::any::{type_name, Any};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, instrument};

use tgflow_core::config::DEFAULT_IDLE_TIMEOUT_SECS;
use tgflow_core::UserId;

use crate::clock::{Clock, SystemClock};
use crate::error::{Result, SessionError};
use crate::types::{DataValue, UserSession};

/// Thread-safe, in-memory store of per-user conversation sessions.
///
/// Entries live in a `DashMap`, so every operation locks only the shard that
/// holds the user: calls for one user are atomic, calls for different users
/// proceed in parallel. Sessions idle for longer than the configured timeout
/// are evicted by a sweep that runs on every [`set_state`](Self::set_state).
///
/// Nothing is persisted; a restart starts with an empty store.
#[derive(Debug)]
pub struct SessionStore {
    sessions: DashMap<UserId, UserSession>,
    idle_timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self::with_clock(idle_timeout, Arc::new(SystemClock))
    }

    /// Build a store that reads time from `clock` instead of the system.
    pub fn with_clock(idle_timeout: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: DashMap::new(),
            idle_timeout,
            clock,
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Number of live entries, expired-but-unswept ones included.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Move `user_id` to `state`, creating the session if needed.
    ///
    /// Sweeps expired sessions first, then refreshes `last_activity`. Data
    /// already attached to the session is kept.
    #[instrument(skip_all, fields(user_id = %user_id))]
    pub fn set_state(&self, user_id: UserId, state: impl Into<String>) {
        let state = state.into();
        self.sweep_expired();

        let now = self.clock.now();
        match self.sessions.entry(user_id) {
            Entry::Occupied(mut entry) => {
                let session = entry.get_mut();
                debug!(from = %session.state, to = %state, "state changed");
                session.state = state;
                session.last_activity = now;
            }
            Entry::Vacant(entry) => {
                debug!(to = %state, "session created");
                entry.insert(UserSession::new(state, now));
            }
        }
    }

    /// Snapshot of the user's session, or `None` when there is none.
    ///
    /// Pure read: it neither sweeps nor refreshes `last_activity`.
    pub fn get_state(&self, user_id: UserId) -> Option<UserSession> {
        self.sessions.get(&user_id).map(|s| s.value().clone())
    }

    /// Remove the user's session with all its data.
    ///
    /// Returns `true` if a session existed.
    #[instrument(skip_all, fields(user_id = %user_id))]
    pub fn clear_state(&self, user_id: UserId) -> bool {
        let removed = self.sessions.remove(&user_id).is_some();
        if removed {
            debug!("session cleared");
        }
        removed
    }

    /// Attach `value` under `key`. No-op returning `false` without a session.
    pub fn set_data<T: Any + Send + Sync>(
        &self,
        user_id: UserId,
        key: impl Into<String>,
        value: T,
    ) -> bool {
        match self.sessions.get_mut(&user_id) {
            Some(mut session) => {
                session.data.insert(key.into(), DataValue::new(value));
                true
            }
            None => false,
        }
    }

    /// Typed read from the user's data bag.
    ///
    /// Returns `None` when there is no session, no such key, or the stored
    /// value has another type. Use [`try_get_data`](Self::try_get_data) to
    /// tell a type mismatch apart from absence.
    pub fn get_data<T: Any + Clone>(&self, user_id: UserId, key: &str) -> Option<T> {
        self.try_get_data(user_id, key).ok().flatten()
    }

    /// Like [`get_data`](Self::get_data) but reports a type mismatch.
    pub fn try_get_data<T: Any + Clone>(&self, user_id: UserId, key: &str) -> Result<Option<T>> {
        let Some(session) = self.sessions.get(&user_id) else {
            return Ok(None);
        };
        let Some(value) = session.data.get(key) else {
            return Ok(None);
        };
        match value.downcast_ref::<T>() {
            Some(v) => Ok(Some(v.clone())),
            None => Err(SessionError::DataTypeMismatch {
                key: key.to_string(),
                expected: type_name::<T>(),
                found: value.type_name(),
            }),
        }
    }

    /// Read-modify-write a data value while holding the user's entry lock.
    ///
    /// `f` receives the current value (`None` if the key is unset or holds
    /// another type) and returns the value to store, which is also returned.
    /// `f` must not call back into the store: the shard lock is held while it
    /// runs, so any access to a user on the same shard would deadlock.
    pub fn update_data<T, F>(&self, user_id: UserId, key: &str, f: F) -> Result<T>
    where
        T: Any + Clone + Send + Sync,
        F: FnOnce(Option<T>) -> T,
    {
        let mut session = self
            .sessions
            .get_mut(&user_id)
            .ok_or(SessionError::NoSession { user_id })?;
        let current = session.get::<T>(key);
        let next = f(current);
        session
            .data
            .insert(key.to_string(), DataValue::new(next.clone()));
        Ok(next)
    }

    /// Drop one data value. Returns `true` if it was present.
    pub fn remove_data(&self, user_id: UserId, key: &str) -> bool {
        self.sessions
            .get_mut(&user_id)
            .map(|mut s| s.data.remove(key).is_some())
            .unwrap_or(false)
    }

    /// Evict every session idle for longer than the timeout.
    ///
    /// Each entry is judged under its shard's write lock, so a concurrent
    /// `set_state` on the same user is seen either entirely before or entirely
    /// after the check. Returns the number of evicted sessions.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let mut evicted = 0usize;
        self.sessions.retain(|user_id, session| {
            if self.is_expired(session.last_activity, now) {
                debug!(user_id = %user_id, state = %session.state, "session expired");
                evicted += 1;
                false
            } else {
                true
            }
        });
        evicted
    }

    fn is_expired(&self, last_activity: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        // A timestamp in the future (clock moved back) counts as fresh.
        match (now - last_activity).to_std() {
            Ok(idle) => idle > self.idle_timeout,
            Err(_) => false,
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS))
    }
}
