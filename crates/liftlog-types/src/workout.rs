//! Persisted workout entities and their identifiers.
//!
//! Generated keys are UUID v7 (time-sortable). The user id is not generated:
//! it is the stable external identity delivered by the chat transport.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Unique identifier for a workout session, wrapping a UUID v7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new SessionId using UUID v7 (time-sortable).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Unique identifier for an exercise (shared across users and sessions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExerciseId(pub Uuid);

impl ExerciseId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ExerciseId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExerciseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ExerciseId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Unique identifier for a logged set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SetId(pub Uuid);

impl SetId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SetId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Unique identifier for a set-exercise row (exercise instance + weight).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SetExerciseId(pub Uuid);

impl SetExerciseId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SetExerciseId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SetExerciseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SetExerciseId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Stable external user identity, assigned by the chat transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user of the workout logger.
///
/// Created on first interaction, never deleted. The username is display-only
/// and may change between interactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    pub username: Option<String>,
}

/// An exercise, created lazily the first time its name is seen.
///
/// Shared across all users and sessions; never deleted, since other sessions
/// may reference it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exercise {
    pub exercise_id: ExerciseId,
    pub name: String,
}

/// One continuous workout interaction from start to end/timeout.
///
/// `end_time` is `None` while the session is active. At most one open session
/// per user, enforced by registry membership rather than a store constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutSession {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

impl WorkoutSession {
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}

/// Ids generated by one committed `record_set` transaction.
#[derive(Debug, Clone, Copy)]
pub struct RecordedSet {
    pub set_id: SetId,
    pub set_exercise_id: SetExerciseId,
}

/// Read-path view of one logged set within a session, in display order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggedSet {
    /// 1-based ordinal within the session.
    pub set_number: u32,
    pub exercise_name: String,
    pub weight: u32,
    pub reps: u32,
}
