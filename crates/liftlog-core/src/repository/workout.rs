//! WorkoutRepository trait definition.
//!
//! Provides the store operations behind the step engine and the idle
//! sweeper: user and exercise upserts, session lifecycle, and the
//! transactional set writes.

use chrono::{DateTime, Utc};
use liftlog_types::error::RepositoryError;
use liftlog_types::workout::{
    Exercise, ExerciseId, LoggedSet, RecordedSet, SessionId, SetId, User, UserId, WorkoutSession,
};

/// Repository trait for workout persistence.
///
/// Implementations live in liftlog-infra (e.g., `SqliteWorkoutRepository`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
///
/// Multi-row writes for one step (`record_set`, `delete_set`) MUST commit in
/// a single transaction: the step engine only mutates its in-memory state
/// after the corresponding method returns `Ok`.
pub trait WorkoutRepository: Send + Sync {
    /// Insert the user or refresh a changed username.
    fn upsert_user(
        &self,
        user: &User,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Insert an exercise by name, or fetch the existing row.
    ///
    /// Idempotent: a name maps to exactly one exercise id, ever.
    fn upsert_exercise(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<Exercise, RepositoryError>> + Send;

    /// Insert a new session row (`end_time` NULL).
    fn create_session(
        &self,
        session: &WorkoutSession,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Set `end_time` on an open session.
    ///
    /// Guarded by `end_time IS NULL`: returns `true` when a row transitioned
    /// to closed, `false` when the session was already closed (or unknown).
    fn close_session(
        &self,
        session_id: SessionId,
        ended_at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Record one completed set in a single transaction: the set-exercise
    /// row, the set row, and the session join row with its ordinal.
    fn record_set(
        &self,
        session_id: SessionId,
        exercise_id: ExerciseId,
        weight: u32,
        reps: u32,
        set_number: u32,
    ) -> impl std::future::Future<Output = Result<RecordedSet, RepositoryError>> + Send;

    /// Delete one set in a single transaction: the session join row first,
    /// then the set row. The set-exercise row is intentionally left behind.
    fn delete_set(
        &self,
        set_id: SetId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// List a user's sessions, most recent first.
    fn list_sessions(
        &self,
        user_id: UserId,
        limit: Option<i64>,
    ) -> impl std::future::Future<Output = Result<Vec<WorkoutSession>, RepositoryError>> + Send;

    /// List the sets of a session in `set_number` order.
    fn list_session_sets(
        &self,
        session_id: SessionId,
    ) -> impl std::future::Future<Output = Result<Vec<LoggedSet>, RepositoryError>> + Send;

    /// Number of sets recorded for a session.
    fn count_session_sets(
        &self,
        session_id: SessionId,
    ) -> impl std::future::Future<Output = Result<u32, RepositoryError>> + Send;
}
