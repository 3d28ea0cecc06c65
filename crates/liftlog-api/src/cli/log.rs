//! Interactive workout logging loop.
//!
//! Renders the step engine's prompts in the terminal, routes free-text
//! input to the entry point matching the current state, and maps the
//! post-set branch point onto an arrow-key menu (the chat transport's
//! inline keyboard, terminal style). The idle sweeper runs alongside the
//! loop and pushes its timeout notice through [`CliNotifier`].

use console::style;
use dialoguer::{Input, Select};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use liftlog_core::clock::SystemClock;
use liftlog_core::session::notifier::{NotifyError, SessionNotifier};
use liftlog_core::session::sweeper::IdleSweeper;
use liftlog_infra::sqlite::workout::SqliteWorkoutRepository;
use liftlog_types::step::{ContinueChoice, StepFault, StepReply, StepState};
use liftlog_types::workout::UserId;

use std::sync::Arc;

use crate::state::AppState;

use super::commands::{self, ReplCommand};

/// Prints sweeper notifications into the running terminal session.
pub struct CliNotifier;

impl SessionNotifier for CliNotifier {
    async fn notify(&self, _user_id: UserId, text: &str) -> Result<(), NotifyError> {
        println!();
        println!("  {}", style(text).yellow());
        Ok(())
    }
}

/// Run the interactive logging loop for one user.
pub async fn run_log_loop(
    state: &AppState,
    user_id: i64,
    username: Option<String>,
) -> anyhow::Result<()> {
    let user = UserId(user_id);

    // The sweeper shares the registry with the engine and lives exactly as
    // long as this loop.
    let cancel = CancellationToken::new();
    let sweeper = IdleSweeper::new(
        Arc::clone(&state.registry),
        SqliteWorkoutRepository::new(state.db_pool.clone()),
        CliNotifier,
        SystemClock,
        state.config.sweep_period(),
        state.config.idle_timeout(),
    );
    let sweeper_task = tokio::spawn(sweeper.run(cancel.clone()));

    println!();
    println!(
        "  {} {}",
        style("liftlog").cyan().bold(),
        style("-- type /help for commands").dim()
    );

    let reply = state.engine.start_session(user, username.as_deref()).await?;
    render(&reply);
    let mut current = reply.state;

    while current != StepState::Closed {
        let reply = match current {
            StepState::ContinueSet => continue_menu(state, user).await?,
            _ => match read_line(current) {
                Some(line) => match dispatch(state, user, current, &line).await? {
                    Some(reply) => reply,
                    None => continue,
                },
                // EOF or interrupted input: treat as cancel.
                None => state.engine.cancel(user).await?,
            },
        };

        render(&reply);
        current = apply(current, &reply);
    }

    cancel.cancel();
    let _ = sweeper_task.await;
    debug!("Logging loop finished");
    Ok(())
}

/// Route one line of input: slash command or state-specific entry.
///
/// Returns `None` when nothing was dispatched (help, unknown command, blank
/// line) and the caller should re-prompt.
async fn dispatch(
    state: &AppState,
    user: UserId,
    current: StepState,
    line: &str,
) -> anyhow::Result<Option<StepReply>> {
    if let Some(cmd) = commands::parse(line) {
        let reply = match cmd {
            ReplCommand::Help => {
                commands::print_help();
                return Ok(None);
            }
            ReplCommand::Unknown(cmd) => {
                println!(
                    "  {} Unknown command: {cmd}. Type {} for help.",
                    style("!").yellow(),
                    style("/help").cyan()
                );
                return Ok(None);
            }
            ReplCommand::Undo => state.engine.undo(user).await?,
            ReplCommand::End => state.engine.end_session(user).await?,
            ReplCommand::Cancel => state.engine.cancel(user).await?,
        };
        return Ok(Some(reply));
    }

    if line.is_empty() {
        return Ok(None);
    }

    let reply = match current {
        StepState::ChoosingExercise => state.engine.choose_exercise(user, line).await?,
        StepState::EnteringWeight => state.engine.enter_weight(user, line).await?,
        StepState::EnteringReps => state.engine.enter_reps(user, line).await?,
        // ContinueSet and Closed never reach here.
        _ => return Ok(None),
    };
    Ok(Some(reply))
}

/// The post-set branch point, rendered as an arrow-key menu.
async fn continue_menu(state: &AppState, user: UserId) -> anyhow::Result<StepReply> {
    let items = [
        "Enter next set",
        "Update weight",
        "Choose another exercise",
        "Undo last entry",
        "End session",
    ];
    let pick = Select::new()
        .with_prompt("Next")
        .items(&items)
        .default(0)
        .interact();

    let reply = match pick {
        Ok(0) => state.engine.continue_choice(user, ContinueChoice::NextSet),
        Ok(1) => state.engine.continue_choice(user, ContinueChoice::UpdateWeight),
        Ok(2) => state.engine.continue_choice(user, ContinueChoice::ChooseExercise),
        Ok(3) => state.engine.undo(user).await?,
        Ok(_) => state.engine.end_session(user).await?,
        // EOF or interrupted menu: treat as cancel.
        Err(_) => state.engine.cancel(user).await?,
    };
    Ok(reply)
}

fn read_line(current: StepState) -> Option<String> {
    let prompt = match current {
        StepState::ChoosingExercise => "exercise",
        StepState::EnteringWeight => "weight (kg)",
        StepState::EnteringReps => "reps",
        _ => ">",
    };

    Input::<String>::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()
        .ok()
        .map(|line| line.trim().to_string())
}

fn render(reply: &StepReply) {
    match reply.fault {
        None => println!("  {}", reply.message),
        Some(_) => println!("  {} {}", style("!").yellow(), style(&reply.message).yellow()),
    }
}

/// Decide which state the loop sits in after a reply.
///
/// A `NothingToUndo` fault reports a closed conversation state but the
/// session itself is still live, so the loop stays where it was. Every other
/// reply state is adopted as-is.
fn apply(current: StepState, reply: &StepReply) -> StepState {
    match reply.fault {
        Some(StepFault::NothingToUndo) => current,
        _ => reply.state,
    }
}
