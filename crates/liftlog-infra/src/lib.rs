//! Infrastructure layer for Liftlog.
//!
//! Contains the SQLite implementation of the repository trait defined in
//! `liftlog-core`, plus data-directory resolution and the config.toml
//! loader.

pub mod config;
pub mod sqlite;
