//! Liftlog CLI entry point.
//!
//! Binary name: `liftlog`
//!
//! Parses CLI arguments, initializes the database and the step engine, then
//! dispatches to the appropriate command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,liftlog=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "liftlog", &mut std::io::stdout());
        return Ok(());
    }

    // Initialize application state (DB, engine)
    let state = AppState::init().await?;

    match cli.command {
        Commands::Log { user, username } => {
            cli::log::run_log_loop(&state, user, username).await?;
        }

        Commands::History { user, limit } => {
            cli::history::show_history(&state, user, limit, cli.json).await?;
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}
