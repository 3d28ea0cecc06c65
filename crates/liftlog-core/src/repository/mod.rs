//! Persistence abstractions for Liftlog.
//!
//! This module defines the `WorkoutRepository` trait that the infrastructure
//! layer implements for user, exercise, session, and set persistence.

pub mod workout;
