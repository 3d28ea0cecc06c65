//! Slash command parsing for the logging loop.
//!
//! Commands start with `/` and provide in-chat controls alongside the
//! regular exercise/weight/reps inputs.

use console::style;

/// Available slash commands in the logging loop.
#[derive(Debug, PartialEq)]
pub enum ReplCommand {
    /// Show available commands.
    Help,
    /// Undo the most recent step.
    Undo,
    /// End the session, saving all data.
    End,
    /// Cancel the conversation.
    Cancel,
    /// Unknown command.
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` if the input doesn't start with `/`.
pub fn parse(input: &str) -> Option<ReplCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    match trimmed.to_lowercase().as_str() {
        "/help" | "/h" | "/?" => Some(ReplCommand::Help),
        "/undo" | "/u" => Some(ReplCommand::Undo),
        "/end" | "/done" => Some(ReplCommand::End),
        "/cancel" | "/quit" | "/q" => Some(ReplCommand::Cancel),
        other => Some(ReplCommand::Unknown(other.to_string())),
    }
}

/// Print the help text listing all available commands.
pub fn print_help() {
    println!();
    println!("  {}", style("Available commands:").bold());
    println!();
    println!("  {}    {}", style("/help").cyan(), "Show this help message");
    println!("  {}    {}", style("/undo").cyan(), "Undo the last entry");
    println!("  {}     {}", style("/end").cyan(), "End the session and save");
    println!("  {}  {}", style("/cancel").cyan(), "Cancel the conversation");
    println!();
}
