//! CLI command definitions for the `liftlog` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod commands;
pub mod history;
pub mod log;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Log your workouts from the terminal.
#[derive(Parser)]
#[command(name = "liftlog", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive workout logging session.
    Log {
        /// Stable user id the session belongs to.
        #[arg(long, env = "LIFTLOG_USER_ID", default_value_t = 1)]
        user: i64,

        /// Display name stored alongside the user id.
        #[arg(long, env = "LIFTLOG_USERNAME")]
        username: Option<String>,
    },

    /// List past workout sessions and their sets.
    History {
        /// Stable user id to list sessions for.
        #[arg(long, env = "LIFTLOG_USER_ID", default_value_t = 1)]
        user: i64,

        /// Maximum number of sessions to show.
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
