//! SQLite workout repository implementation.
//!
//! Implements `WorkoutRepository` from `liftlog-core` using sqlx with split
//! read/write pools: raw queries, private Row structs, RFC 3339 datetime
//! text. The multi-row step writes (`record_set`, `delete_set`) run in one
//! transaction on the writer pool.

use chrono::{DateTime, Utc};
use liftlog_core::repository::workout::WorkoutRepository;
use liftlog_types::error::RepositoryError;
use liftlog_types::workout::{
    Exercise, ExerciseId, LoggedSet, RecordedSet, SessionId, SetExerciseId, SetId, User, UserId,
    WorkoutSession,
};
use sqlx::Row;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `WorkoutRepository`.
pub struct SqliteWorkoutRepository {
    pool: DatabasePool,
}

impl SqliteWorkoutRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

/// Internal row type for mapping SQLite rows to domain WorkoutSession.
struct SessionRow {
    session_id: String,
    user_id: i64,
    start_time: String,
    end_time: Option<String>,
}

impl SessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            session_id: row.try_get("session_id")?,
            user_id: row.try_get("user_id")?,
            start_time: row.try_get("start_time")?,
            end_time: row.try_get("end_time")?,
        })
    }

    fn into_session(self) -> Result<WorkoutSession, RepositoryError> {
        let session_id = self
            .session_id
            .parse::<SessionId>()
            .map_err(|e| RepositoryError::Query(format!("invalid session id: {e}")))?;
        let start_time = parse_datetime(&self.start_time)?;
        let end_time = self.end_time.as_deref().map(parse_datetime).transpose()?;

        Ok(WorkoutSession {
            session_id,
            user_id: UserId(self.user_id),
            start_time,
            end_time,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn query_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Query(e.to_string())
}

// ---------------------------------------------------------------------------
// WorkoutRepository implementation
// ---------------------------------------------------------------------------

impl WorkoutRepository for SqliteWorkoutRepository {
    async fn upsert_user(&self, user: &User) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO users (user_id, username) VALUES (?, ?)
               ON CONFLICT(user_id) DO UPDATE SET username = excluded.username"#,
        )
        .bind(user.user_id.0)
        .bind(&user.username)
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        Ok(())
    }

    async fn upsert_exercise(&self, name: &str) -> Result<Exercise, RepositoryError> {
        // Insert-or-ignore, then fetch: a name maps to exactly one id, and a
        // lost insert race just means the fetch sees the winner's row.
        sqlx::query("INSERT INTO exercises (exercise_id, name) VALUES (?, ?) ON CONFLICT(name) DO NOTHING")
            .bind(ExerciseId::new().to_string())
            .bind(name)
            .execute(&self.pool.writer)
            .await
            .map_err(query_err)?;

        let row = sqlx::query("SELECT exercise_id, name FROM exercises WHERE name = ?")
            .bind(name)
            .fetch_one(&self.pool.writer)
            .await
            .map_err(query_err)?;

        let id_str: String = row.try_get("exercise_id").map_err(query_err)?;
        let exercise_id = id_str
            .parse::<ExerciseId>()
            .map_err(|e| RepositoryError::Query(format!("invalid exercise id: {e}")))?;
        let name: String = row.try_get("name").map_err(query_err)?;

        Ok(Exercise { exercise_id, name })
    }

    async fn create_session(&self, session: &WorkoutSession) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO sessions (session_id, user_id, start_time, end_time) VALUES (?, ?, ?, ?)",
        )
        .bind(session.session_id.to_string())
        .bind(session.user_id.0)
        .bind(format_datetime(&session.start_time))
        .bind(session.end_time.as_ref().map(format_datetime))
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        Ok(())
    }

    async fn close_session(
        &self,
        session_id: SessionId,
        ended_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE sessions SET end_time = ? WHERE session_id = ? AND end_time IS NULL",
        )
        .bind(format_datetime(&ended_at))
        .bind(session_id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_set(
        &self,
        session_id: SessionId,
        exercise_id: ExerciseId,
        weight: u32,
        reps: u32,
        set_number: u32,
    ) -> Result<RecordedSet, RepositoryError> {
        let set_exercise_id = SetExerciseId::new();
        let set_id = SetId::new();

        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;

        sqlx::query("INSERT INTO set_exercises (set_exercise_id, exercise_id, weight) VALUES (?, ?, ?)")
            .bind(set_exercise_id.to_string())
            .bind(exercise_id.to_string())
            .bind(weight as i64)
            .execute(&mut *tx)
            .await
            .map_err(query_err)?;

        sqlx::query("INSERT INTO sets (set_id, set_exercise_id, reps) VALUES (?, ?, ?)")
            .bind(set_id.to_string())
            .bind(set_exercise_id.to_string())
            .bind(reps as i64)
            .execute(&mut *tx)
            .await
            .map_err(query_err)?;

        sqlx::query("INSERT INTO session_sets (session_id, set_id, set_number) VALUES (?, ?, ?)")
            .bind(session_id.to_string())
            .bind(set_id.to_string())
            .bind(set_number as i64)
            .execute(&mut *tx)
            .await
            .map_err(query_err)?;

        tx.commit().await.map_err(query_err)?;

        Ok(RecordedSet {
            set_id,
            set_exercise_id,
        })
    }

    async fn delete_set(&self, set_id: SetId) -> Result<(), RepositoryError> {
        // session_sets references sets, so the join row goes first. The
        // set_exercises row is intentionally left behind.
        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;

        sqlx::query("DELETE FROM session_sets WHERE set_id = ?")
            .bind(set_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(query_err)?;

        sqlx::query("DELETE FROM sets WHERE set_id = ?")
            .bind(set_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(query_err)?;

        tx.commit().await.map_err(query_err)?;

        Ok(())
    }

    async fn list_sessions(
        &self,
        user_id: UserId,
        limit: Option<i64>,
    ) -> Result<Vec<WorkoutSession>, RepositoryError> {
        let mut sql =
            String::from("SELECT * FROM sessions WHERE user_id = ? ORDER BY start_time DESC");
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let rows = sqlx::query(&sql)
            .bind(user_id.0)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_err)?;

        let mut sessions = Vec::with_capacity(rows.len());
        for row in &rows {
            let session_row = SessionRow::from_row(row).map_err(query_err)?;
            sessions.push(session_row.into_session()?);
        }

        Ok(sessions)
    }

    async fn list_session_sets(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<LoggedSet>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT ss.set_number, e.name AS exercise_name, se.weight, s.reps
               FROM session_sets ss
               JOIN sets s ON s.set_id = ss.set_id
               JOIN set_exercises se ON se.set_exercise_id = s.set_exercise_id
               JOIN exercises e ON e.exercise_id = se.exercise_id
               WHERE ss.session_id = ?
               ORDER BY ss.set_number ASC"#,
        )
        .bind(session_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_err)?;

        let mut sets = Vec::with_capacity(rows.len());
        for row in &rows {
            let set_number: i64 = row.try_get("set_number").map_err(query_err)?;
            let exercise_name: String = row.try_get("exercise_name").map_err(query_err)?;
            let weight: i64 = row.try_get("weight").map_err(query_err)?;
            let reps: i64 = row.try_get("reps").map_err(query_err)?;
            sets.push(LoggedSet {
                set_number: set_number as u32,
                exercise_name,
                weight: weight as u32,
                reps: reps as u32,
            });
        }

        Ok(sets)
    }

    async fn count_session_sets(&self, session_id: SessionId) -> Result<u32, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) as cnt FROM session_sets WHERE session_id = ?")
            .bind(session_id.to_string())
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_err)?;

        let count: i64 = row.try_get("cnt").map_err(query_err)?;

        Ok(count as u32)
    }
}
