//! Shared domain types for Liftlog.
//!
//! This crate contains the core domain types used across the workout logger:
//! ids and persisted entities, the conversation step machine types, error
//! types, and configuration.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod error;
pub mod step;
pub mod workout;
