//! Test doubles shared by the engine and sweeper test suites: an in-memory
//! repository, a manually advanced clock, and a recording notifier.

use chrono::{DateTime, Duration, Utc};
use liftlog_types::error::RepositoryError;
use liftlog_types::workout::{
    Exercise, ExerciseId, LoggedSet, RecordedSet, SessionId, SetExerciseId, SetId, User, UserId,
    WorkoutSession,
};

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::clock::Clock;
use crate::repository::workout::WorkoutRepository;
use crate::session::notifier::{NotifyError, SessionNotifier};

#[derive(Default)]
struct MemState {
    users: HashMap<UserId, Option<String>>,
    exercises: Vec<Exercise>,
    sessions: HashMap<SessionId, WorkoutSession>,
    set_exercises: HashMap<SetExerciseId, (ExerciseId, u32)>,
    sets: HashMap<SetId, (SetExerciseId, u32)>,
    session_sets: Vec<(SessionId, SetId, u32)>,
    fail_next: bool,
}

/// HashMap-backed `WorkoutRepository` mirroring the SQLite schema.
///
/// `fail_next` makes the next call return `RepositoryError::Connection`,
/// for exercising the store-fails-registry-untouched contract.
#[derive(Clone, Default)]
pub(crate) struct MemoryWorkoutRepository {
    state: Arc<Mutex<MemState>>,
}

impl MemoryWorkoutRepository {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn fail_next(&self) {
        self.state.lock().unwrap().fail_next = true;
    }

    pub(crate) fn session(&self, session_id: SessionId) -> Option<WorkoutSession> {
        self.state.lock().unwrap().sessions.get(&session_id).cloned()
    }

    pub(crate) fn exercise_count(&self) -> usize {
        self.state.lock().unwrap().exercises.len()
    }

    pub(crate) fn set_count(&self) -> usize {
        self.state.lock().unwrap().sets.len()
    }

    pub(crate) fn set_exercise_count(&self) -> usize {
        self.state.lock().unwrap().set_exercises.len()
    }

    /// Set numbers recorded for a session, in insertion order.
    pub(crate) fn set_numbers(&self, session_id: SessionId) -> Vec<u32> {
        self.state
            .lock()
            .unwrap()
            .session_sets
            .iter()
            .filter(|(sid, _, _)| *sid == session_id)
            .map(|(_, _, n)| *n)
            .collect()
    }

    fn check_fail(state: &mut MemState) -> Result<(), RepositoryError> {
        if state.fail_next {
            state.fail_next = false;
            return Err(RepositoryError::Connection);
        }
        Ok(())
    }
}

impl WorkoutRepository for MemoryWorkoutRepository {
    async fn upsert_user(&self, user: &User) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        Self::check_fail(&mut state)?;
        state.users.insert(user.user_id, user.username.clone());
        Ok(())
    }

    async fn upsert_exercise(&self, name: &str) -> Result<Exercise, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        Self::check_fail(&mut state)?;
        if let Some(existing) = state.exercises.iter().find(|e| e.name == name) {
            return Ok(existing.clone());
        }
        let exercise = Exercise {
            exercise_id: ExerciseId::new(),
            name: name.to_string(),
        };
        state.exercises.push(exercise.clone());
        Ok(exercise)
    }

    async fn create_session(&self, session: &WorkoutSession) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        Self::check_fail(&mut state)?;
        state.sessions.insert(session.session_id, session.clone());
        Ok(())
    }

    async fn close_session(
        &self,
        session_id: SessionId,
        ended_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        Self::check_fail(&mut state)?;
        match state.sessions.get_mut(&session_id) {
            Some(session) if session.end_time.is_none() => {
                session.end_time = Some(ended_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn record_set(
        &self,
        session_id: SessionId,
        exercise_id: ExerciseId,
        weight: u32,
        reps: u32,
        set_number: u32,
    ) -> Result<RecordedSet, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        Self::check_fail(&mut state)?;
        let set_exercise_id = SetExerciseId::new();
        let set_id = SetId::new();
        state.set_exercises.insert(set_exercise_id, (exercise_id, weight));
        state.sets.insert(set_id, (set_exercise_id, reps));
        state.session_sets.push((session_id, set_id, set_number));
        Ok(RecordedSet {
            set_id,
            set_exercise_id,
        })
    }

    async fn delete_set(&self, set_id: SetId) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        Self::check_fail(&mut state)?;
        state.session_sets.retain(|(_, sid, _)| *sid != set_id);
        state.sets.remove(&set_id);
        Ok(())
    }

    async fn list_sessions(
        &self,
        user_id: UserId,
        limit: Option<i64>,
    ) -> Result<Vec<WorkoutSession>, RepositoryError> {
        let state = self.state.lock().unwrap();
        let mut sessions: Vec<WorkoutSession> = state
            .sessions
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        if let Some(limit) = limit {
            sessions.truncate(limit as usize);
        }
        Ok(sessions)
    }

    async fn list_session_sets(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<LoggedSet>, RepositoryError> {
        let state = self.state.lock().unwrap();
        let mut rows: Vec<LoggedSet> = state
            .session_sets
            .iter()
            .filter(|(sid, _, _)| *sid == session_id)
            .filter_map(|(_, set_id, set_number)| {
                let (set_exercise_id, reps) = state.sets.get(set_id)?;
                let (exercise_id, weight) = state.set_exercises.get(set_exercise_id)?;
                let name = state
                    .exercises
                    .iter()
                    .find(|e| e.exercise_id == *exercise_id)?
                    .name
                    .clone();
                Some(LoggedSet {
                    set_number: *set_number,
                    exercise_name: name,
                    weight: *weight,
                    reps: *reps,
                })
            })
            .collect();
        rows.sort_by_key(|row| row.set_number);
        Ok(rows)
    }

    async fn count_session_sets(&self, session_id: SessionId) -> Result<u32, RepositoryError> {
        let state = self.state.lock().unwrap();
        let count = state
            .session_sets
            .iter()
            .filter(|(sid, _, _)| *sid == session_id)
            .count();
        Ok(count as u32)
    }
}

/// Clock that only moves when told to.
#[derive(Clone)]
pub(crate) struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub(crate) fn at(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub(crate) fn advance(&self, delta: Duration) {
        *self.now.lock().unwrap() += delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Notifier that records every message it is asked to deliver.
#[derive(Clone, Default)]
pub(crate) struct RecordingNotifier {
    sent: Arc<Mutex<Vec<(UserId, String)>>>,
}

impl RecordingNotifier {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn messages(&self) -> Vec<(UserId, String)> {
        self.sent.lock().unwrap().clone()
    }
}

impl SessionNotifier for RecordingNotifier {
    async fn notify(&self, user_id: UserId, text: &str) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push((user_id, text.to_string()));
        Ok(())
    }
}
