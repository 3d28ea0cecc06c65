//! In-memory registry of active workout sessions.
//!
//! One service object owns both per-user maps -- active sessions and
//! last-action slots -- behind a single mutex, and is injected into the step
//! engine and the idle sweeper. Critical sections are pure in-memory work and
//! are never held across await points; store I/O always happens outside the
//! lock, and the registry is only mutated after the corresponding store write
//! has committed.

use chrono::{DateTime, Utc};
use liftlog_types::step::LastAction;
use liftlog_types::workout::{ExerciseId, SessionId, SetId, UserId};

use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory state of one active session.
///
/// `set_count` mirrors the number of committed session_sets rows.
/// `last_entry_time` stays `None` until the first set is logged; the sweeper
/// never touches such entries. The scratch fields hold the exercise and
/// weight the next set will be recorded against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
    pub session_id: SessionId,
    pub set_count: u32,
    pub last_entry_time: Option<DateTime<Utc>>,
    pub current_exercise_id: Option<ExerciseId>,
    pub current_exercise_name: Option<String>,
    pub current_weight: Option<u32>,
}

impl ActiveSession {
    fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            set_count: 0,
            last_entry_time: None,
            current_exercise_id: None,
            current_exercise_name: None,
            current_weight: None,
        }
    }
}

#[derive(Debug, Default)]
struct RegistryInner {
    active: HashMap<UserId, ActiveSession>,
    last_actions: HashMap<UserId, LastAction>,
}

/// Process-wide map from user id to active session state, plus the per-user
/// last-action slot for undo.
///
/// A user id maps to at most one entry at any time. Entries are created on
/// session start, mutated on every successful step, and removed on session
/// end (normal, cancelled, or timed-out). Nothing here is ever serialized;
/// a process restart loses all in-progress sessions.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    inner: Mutex<RegistryInner>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly started session, clearing any stale last-action.
    ///
    /// Returns the entry it replaced, if the user already had one.
    pub fn insert(&self, user_id: UserId, session_id: SessionId) -> Option<ActiveSession> {
        let mut inner = self.lock();
        inner.last_actions.remove(&user_id);
        inner.active.insert(user_id, ActiveSession::new(session_id))
    }

    /// Snapshot of a user's entry.
    pub fn get(&self, user_id: UserId) -> Option<ActiveSession> {
        self.lock().active.get(&user_id).cloned()
    }

    /// Remove a user's entry and last-action slot.
    pub fn remove(&self, user_id: UserId) -> Option<ActiveSession> {
        let mut inner = self.lock();
        inner.last_actions.remove(&user_id);
        inner.active.remove(&user_id)
    }

    /// Remove a user's entry only if it still refers to `session_id`.
    ///
    /// Used by the sweeper after its store write: if the user ended the
    /// session (and possibly started a new one) in the meantime, the newer
    /// entry is left alone.
    pub fn remove_if_session(&self, user_id: UserId, session_id: SessionId) -> bool {
        let mut inner = self.lock();
        match inner.active.get(&user_id) {
            Some(entry) if entry.session_id == session_id => {
                inner.active.remove(&user_id);
                inner.last_actions.remove(&user_id);
                true
            }
            _ => false,
        }
    }

    /// Record a committed exercise choice: scratch context plus last-action.
    pub fn record_exercise_chosen(
        &self,
        user_id: UserId,
        exercise_id: ExerciseId,
        name: &str,
    ) {
        let mut inner = self.lock();
        if let Some(entry) = inner.active.get_mut(&user_id) {
            entry.current_exercise_id = Some(exercise_id);
            entry.current_exercise_name = Some(name.to_string());
        }
        inner.last_actions.insert(
            user_id,
            LastAction::ChoseExercise {
                name: name.to_string(),
            },
        );
    }

    /// Record an accepted weight entry.
    pub fn record_weight_entered(&self, user_id: UserId, weight: u32) {
        let mut inner = self.lock();
        if let Some(entry) = inner.active.get_mut(&user_id) {
            entry.current_weight = Some(weight);
        }
        inner
            .last_actions
            .insert(user_id, LastAction::EnteredWeight { value: weight });
    }

    /// Record a committed set: bump the counter, stamp the entry time, and
    /// overwrite the last-action slot.
    pub fn record_set_logged(&self, user_id: UserId, set_id: SetId, now: DateTime<Utc>) {
        let mut inner = self.lock();
        if let Some(entry) = inner.active.get_mut(&user_id) {
            entry.set_count += 1;
            entry.last_entry_time = Some(now);
        }
        inner
            .last_actions
            .insert(user_id, LastAction::EnteredReps { set_id });
    }

    /// Peek at the last-action slot without clearing it.
    pub fn last_action(&self, user_id: UserId) -> Option<LastAction> {
        self.lock().last_actions.get(&user_id).cloned()
    }

    /// Clear the last-action slot (after a successful undo).
    pub fn clear_last_action(&self, user_id: UserId) {
        self.lock().last_actions.remove(&user_id);
    }

    /// Undo bookkeeping for a deleted set: decrement the counter and clear
    /// the last-action slot. The next successful entry reuses the freed
    /// ordinal, keeping set numbers contiguous.
    pub fn record_set_undone(&self, user_id: UserId) {
        let mut inner = self.lock();
        if let Some(entry) = inner.active.get_mut(&user_id) {
            entry.set_count = entry.set_count.saturating_sub(1);
        }
        inner.last_actions.remove(&user_id);
    }

    /// Undo bookkeeping for a weight entry: drop the scratch context and
    /// clear the last-action slot.
    pub fn clear_scratch(&self, user_id: UserId) {
        let mut inner = self.lock();
        if let Some(entry) = inner.active.get_mut(&user_id) {
            entry.current_weight = None;
            entry.current_exercise_id = None;
            entry.current_exercise_name = None;
        }
        inner.last_actions.remove(&user_id);
    }

    /// Users whose last logged set is strictly older than `cutoff`.
    ///
    /// Entries that have never logged a set (`last_entry_time` is `None`)
    /// are never reported. Collection happens under the lock; the caller
    /// does its store I/O outside it and then removes each entry with
    /// [`SessionRegistry::remove_if_session`].
    pub fn idle_entries(&self, cutoff: DateTime<Utc>) -> Vec<(UserId, SessionId)> {
        self.lock()
            .active
            .iter()
            .filter(|(_, entry)| matches!(entry.last_entry_time, Some(t) if t < cutoff))
            .map(|(user_id, entry)| (*user_id, entry.session_id))
            .collect()
    }

    /// Number of active sessions.
    pub fn len(&self) -> usize {
        self.lock().active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().active.is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RegistryInner> {
        // Poisoning carries no invariant here: every mutation leaves both
        // maps consistent before the guard drops.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
