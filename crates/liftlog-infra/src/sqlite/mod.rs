//! SQLite persistence for Liftlog, built on sqlx.

pub mod pool;
pub mod workout;
