//! Conversation step machine types.
//!
//! The step engine walks a fixed sequence: choose exercise, enter weight,
//! enter reps, then a branch point for the next set. Every entry point
//! returns a [`StepReply`] carrying the next state, the user-facing message,
//! and an optional recoverable fault.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::workout::SetId;

use std::fmt;

/// States of the per-user conversation state machine.
///
/// `Closed` is the terminal state reached by end, cancel, or sweeper timeout,
/// regardless of which non-terminal state the session was in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    ChoosingExercise,
    EnteringWeight,
    EnteringReps,
    ContinueSet,
    Closed,
}

impl fmt::Display for StepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepState::ChoosingExercise => write!(f, "choosing_exercise"),
            StepState::EnteringWeight => write!(f, "entering_weight"),
            StepState::EnteringReps => write!(f, "entering_reps"),
            StepState::ContinueSet => write!(f, "continue_set"),
            StepState::Closed => write!(f, "closed"),
        }
    }
}

/// Branch choices offered after a set is logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContinueChoice {
    /// Log another set with the same exercise and weight.
    NextSet,
    /// Change the weight, keep the exercise.
    UpdateWeight,
    /// Pick a different exercise.
    ChooseExercise,
}

/// The most recent successful step for a user, kept for undo.
///
/// Exactly one slot per user; overwritten on every successful step, cleared
/// after a successful undo or on session end. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LastAction {
    ChoseExercise { name: String },
    EnteredWeight { value: u32 },
    EnteredReps { set_id: SetId },
}

/// Recoverable faults returned inside a [`StepReply`].
///
/// These are handled entirely within the step engine and surfaced as a
/// user-facing message; they are never process-fatal. Store failures are a
/// separate, propagated error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StepFault {
    /// Input was not a non-negative integer literal.
    #[error("invalid number")]
    InvalidNumber,

    /// The user has no active session.
    #[error("no active session")]
    NoActiveSession,

    /// Undo was requested with an empty last-action slot.
    #[error("nothing to undo")]
    NothingToUndo,

    /// A reps entry arrived without a chosen exercise and weight.
    #[error("missing exercise context")]
    MissingContext,
}

/// What a step engine entry point hands back to the transport layer.
///
/// `fault: None` means the step succeeded and `message` is the next prompt.
/// A fault means the step was rejected without mutation; `state` then
/// reflects where the conversation stands (unchanged for validation faults).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReply {
    pub state: StepState,
    pub message: String,
    pub fault: Option<StepFault>,
}

impl StepReply {
    /// A successful step advancing to `state` with the next prompt.
    pub fn advance(state: StepState, message: impl Into<String>) -> Self {
        Self {
            state,
            message: message.into(),
            fault: None,
        }
    }

    /// A rejected step: `state` is where the conversation stays.
    pub fn rejected(state: StepState, fault: StepFault, message: impl Into<String>) -> Self {
        Self {
            state,
            message: message.into(),
            fault: Some(fault),
        }
    }

    pub fn is_fault(&self) -> bool {
        self.fault.is_some()
    }
}
