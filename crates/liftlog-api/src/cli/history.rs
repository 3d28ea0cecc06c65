//! Session history listing.

use anyhow::Result;
use chrono::{DateTime, Utc};
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;

use liftlog_core::repository::workout::WorkoutRepository;
use liftlog_types::workout::{UserId, WorkoutSession};

use crate::state::AppState;

/// Print a user's past sessions with their sets, most recent first.
pub async fn show_history(state: &AppState, user_id: i64, limit: i64, json: bool) -> Result<()> {
    let user = UserId(user_id);
    let sessions = state.repo.list_sessions(user, Some(limit)).await?;

    if json {
        let mut entries = Vec::with_capacity(sessions.len());
        for session in &sessions {
            let sets = state.repo.list_session_sets(session.session_id).await?;
            entries.push(serde_json::json!({
                "session": session,
                "sets": sets,
            }));
        }
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!();
        println!(
            "  {} No workout sessions found. Start one with: {}",
            style("i").blue().bold(),
            style("liftlog log").yellow()
        );
        println!();
        return Ok(());
    }

    for session in &sessions {
        let sets = state.repo.list_session_sets(session.session_id).await?;

        println!();
        println!(
            "  {} {}  {}",
            style("Session").bold(),
            style(session.start_time.format("%Y-%m-%d %H:%M")).cyan(),
            style(format_span(session)).dim()
        );

        if sets.is_empty() {
            println!("  {}", style("no sets logged").dim());
            continue;
        }

        let mut table = Table::new();
        table.load_preset(presets::UTF8_FULL_CONDENSED);
        table.set_content_arrangement(ContentArrangement::Dynamic);

        table.set_header(vec![
            Cell::new("#").fg(Color::White),
            Cell::new("Exercise").fg(Color::White),
            Cell::new("Weight").fg(Color::White),
            Cell::new("Reps").fg(Color::White),
        ]);

        for set in &sets {
            table.add_row(vec![
                Cell::new(set.set_number).fg(Color::DarkGrey),
                Cell::new(&set.exercise_name).fg(Color::Cyan),
                Cell::new(format!("{}kg", set.weight)),
                Cell::new(set.reps),
            ]);
        }

        println!("{table}");
    }

    println!();
    println!(
        "  {} session{}",
        style(sessions.len()).bold(),
        if sessions.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

/// "open", "42 min", or "2 h 05 min" depending on session length.
fn format_span(session: &WorkoutSession) -> String {
    let Some(end_time) = session.end_time else {
        return "open".to_string();
    };
    format_minutes(session.start_time, end_time)
}

fn format_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    let minutes = (end - start).num_minutes().max(0);
    if minutes < 60 {
        format!("{minutes} min")
    } else {
        format!("{} h {:02} min", minutes / 60, minutes % 60)
    }
}
