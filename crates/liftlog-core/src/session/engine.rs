//! The conversation step engine.
//!
//! One entry point per step kind (start / choose exercise / enter weight /
//! enter reps / continue choice / undo / end / cancel). Each validates its
//! input, writes through the repository inside a single transaction, and
//! only then mutates the in-memory registry, so a failed store call leaves
//! the registry exactly as it was. Recoverable faults come back inside the
//! [`StepReply`]; store failures propagate as errors.

use liftlog_types::error::RepositoryError;
use liftlog_types::step::{ContinueChoice, LastAction, StepFault, StepReply, StepState};
use liftlog_types::workout::{SessionId, User, UserId, WorkoutSession};
use tracing::info;

use std::sync::Arc;

use crate::clock::Clock;
use crate::repository::workout::WorkoutRepository;
use crate::session::registry::SessionRegistry;

/// Parse a non-negative integer literal: ASCII digits only, no sign,
/// decimal point, or unit suffix.
fn parse_count(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}

/// Drives the per-user conversation state machine.
///
/// Generic over the repository port and the clock so the conversation logic
/// stays free of IO concerns (liftlog-core never depends on liftlog-infra).
pub struct StepEngine<R, C> {
    repo: R,
    registry: Arc<SessionRegistry>,
    clock: C,
}

impl<R: WorkoutRepository, C: Clock> StepEngine<R, C> {
    pub fn new(repo: R, registry: Arc<SessionRegistry>, clock: C) -> Self {
        Self {
            repo,
            registry,
            clock,
        }
    }

    /// The registry this engine mutates (shared with the idle sweeper).
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Start a workout session: upsert the user, insert the session row,
    /// register the in-memory entry.
    ///
    /// A still-active previous session is closed through the normal end path
    /// first, so a user never owns two open session rows.
    pub async fn start_session(
        &self,
        user_id: UserId,
        username: Option<&str>,
    ) -> Result<StepReply, RepositoryError> {
        if let Some(previous) = self.registry.get(user_id) {
            self.repo
                .close_session(previous.session_id, self.clock.now())
                .await?;
            self.registry.remove(user_id);
            info!(%user_id, session_id = %previous.session_id, "Closed previous session on restart");
        }

        let user = User {
            user_id,
            username: username.map(str::to_string),
        };
        self.repo.upsert_user(&user).await?;

        let session = WorkoutSession {
            session_id: SessionId::new(),
            user_id,
            start_time: self.clock.now(),
            end_time: None,
        };
        self.repo.create_session(&session).await?;

        self.registry.insert(user_id, session.session_id);
        info!(%user_id, session_id = %session.session_id, "Workout session started");

        Ok(StepReply::advance(
            StepState::ChoosingExercise,
            "Workout session started! Please choose an exercise.",
        ))
    }

    /// Record the chosen exercise and prompt for weight.
    ///
    /// The exercise is upserted by name: the same name always resolves to
    /// the same row, shared across users and sessions.
    pub async fn choose_exercise(
        &self,
        user_id: UserId,
        name: &str,
    ) -> Result<StepReply, RepositoryError> {
        if self.registry.get(user_id).is_none() {
            return Ok(no_active_session());
        }

        let name = name.trim();
        let exercise = self.repo.upsert_exercise(name).await?;
        self.registry
            .record_exercise_chosen(user_id, exercise.exercise_id, &exercise.name);
        info!(%user_id, exercise = %exercise.name, "Exercise chosen");

        Ok(StepReply::advance(
            StepState::EnteringWeight,
            format!("Chosen exercise: {name}. Now enter the weight (kg)."),
        ))
    }

    /// Accept a weight entry, or re-prompt without any state change.
    pub async fn enter_weight(
        &self,
        user_id: UserId,
        raw: &str,
    ) -> Result<StepReply, RepositoryError> {
        if self.registry.get(user_id).is_none() {
            return Ok(no_active_session());
        }

        let Some(weight) = parse_count(raw) else {
            return Ok(StepReply::rejected(
                StepState::EnteringWeight,
                StepFault::InvalidNumber,
                "Please enter a valid weight in kg.",
            ));
        };

        self.registry.record_weight_entered(user_id, weight);

        Ok(StepReply::advance(
            StepState::EnteringReps,
            format!("Weight: {weight}kg. Now enter the number of reps."),
        ))
    }

    /// Accept a reps entry and persist the completed set.
    ///
    /// The set-exercise row, the set row, and the session join row commit in
    /// one transaction; the registry counter and last-action slot are only
    /// updated afterwards.
    pub async fn enter_reps(
        &self,
        user_id: UserId,
        raw: &str,
    ) -> Result<StepReply, RepositoryError> {
        let Some(entry) = self.registry.get(user_id) else {
            return Ok(no_active_session());
        };

        let Some(reps) = parse_count(raw) else {
            return Ok(StepReply::rejected(
                StepState::EnteringReps,
                StepFault::InvalidNumber,
                "Please enter a valid number of reps.",
            ));
        };

        let (Some(exercise_id), Some(weight)) = (entry.current_exercise_id, entry.current_weight)
        else {
            // Out-of-order call from a misbehaving transport: nothing to
            // record a set against.
            return Ok(StepReply::rejected(
                StepState::ChoosingExercise,
                StepFault::MissingContext,
                "Please choose an exercise and enter a weight first.",
            ));
        };

        let set_number = entry.set_count + 1;
        let recorded = self
            .repo
            .record_set(entry.session_id, exercise_id, weight, reps, set_number)
            .await?;

        self.registry
            .record_set_logged(user_id, recorded.set_id, self.clock.now());
        info!(%user_id, session_id = %entry.session_id, set_number, weight, reps, "Set logged");

        Ok(StepReply::advance(
            StepState::ContinueSet,
            format!("Logged: {weight}kg x {reps} reps. Enter another set or update weight."),
        ))
    }

    /// Branch after a logged set. Pure state transition, no store writes.
    pub fn continue_choice(&self, _user_id: UserId, choice: ContinueChoice) -> StepReply {
        let (state, message) = match choice {
            ContinueChoice::NextSet => (StepState::EnteringReps, "Enter reps for the next set."),
            ContinueChoice::UpdateWeight => (StepState::EnteringWeight, "Enter new weight."),
            ContinueChoice::ChooseExercise => {
                (StepState::ChoosingExercise, "Please choose another exercise.")
            }
        };
        StepReply::advance(state, message)
    }

    /// Undo the single most recent step.
    ///
    /// Returns to `ChoosingExercise` unconditionally: undoing a weight entry
    /// also drops the exercise scratch, so exercise choice is the only state
    /// guaranteed to be re-enterable afterwards.
    pub async fn undo(&self, user_id: UserId) -> Result<StepReply, RepositoryError> {
        let Some(action) = self.registry.last_action(user_id) else {
            return Ok(StepReply::rejected(
                StepState::Closed,
                StepFault::NothingToUndo,
                "No action to undo.",
            ));
        };

        match action {
            LastAction::ChoseExercise { name } => {
                // Exercises are shared across sessions and never deleted;
                // this reversal is purely informational.
                info!(%user_id, exercise = %name, "Undoing exercise choice");
                self.registry.clear_last_action(user_id);
            }
            LastAction::EnteredWeight { value } => {
                info!(%user_id, weight = value, "Undoing weight entry");
                self.registry.clear_scratch(user_id);
            }
            LastAction::EnteredReps { set_id } => {
                // The join row and the set row go in one transaction; the
                // set-exercise row stays behind.
                self.repo.delete_set(set_id).await?;
                self.registry.record_set_undone(user_id);
                info!(%user_id, %set_id, "Undid logged set");
            }
        }

        Ok(StepReply::advance(
            StepState::ChoosingExercise,
            "Last action undone. Please choose an exercise.",
        ))
    }

    /// End the session: close the row, then drop the registry entry.
    pub async fn end_session(&self, user_id: UserId) -> Result<StepReply, RepositoryError> {
        let Some(entry) = self.registry.get(user_id) else {
            return Ok(no_active_session());
        };

        self.repo
            .close_session(entry.session_id, self.clock.now())
            .await?;
        self.registry.remove(user_id);
        info!(%user_id, session_id = %entry.session_id, "Session ended");

        Ok(StepReply::advance(
            StepState::Closed,
            "Workout session ended! Data saved.",
        ))
    }

    /// Cancel the conversation, closing any active session.
    ///
    /// The original flow left the session row open here; that asymmetry with
    /// end is resolved by closing through the same path, so cancelled
    /// sessions cannot linger as open rows.
    pub async fn cancel(&self, user_id: UserId) -> Result<StepReply, RepositoryError> {
        let Some(entry) = self.registry.get(user_id) else {
            return Ok(StepReply::advance(StepState::Closed, "Operation cancelled."));
        };

        self.repo
            .close_session(entry.session_id, self.clock.now())
            .await?;
        self.registry.remove(user_id);
        info!(%user_id, session_id = %entry.session_id, "Session cancelled");

        Ok(StepReply::advance(
            StepState::Closed,
            "Operation cancelled. Workout session closed and data saved.",
        ))
    }
}

fn no_active_session() -> StepReply {
    StepReply::rejected(
        StepState::Closed,
        StepFault::NoActiveSession,
        "No active workout session found.",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{ManualClock, MemoryWorkoutRepository};
    use chrono::{TimeZone, Utc};

    fn engine() -> (
        StepEngine<MemoryWorkoutRepository, ManualClock>,
        MemoryWorkoutRepository,
        ManualClock,
    ) {
        let repo = MemoryWorkoutRepository::new();
        let clock = ManualClock::at(Utc.with_ymd_and_hms(2024, 3, 1, 18, 0, 0).unwrap());
        let registry = Arc::new(SessionRegistry::new());
        let engine = StepEngine::new(repo.clone(), registry, clock.clone());
        (engine, repo, clock)
    }

    const USER: UserId = UserId(100);

    async fn start_and_log_one(
        engine: &StepEngine<MemoryWorkoutRepository, ManualClock>,
    ) -> SessionId {
        engine.start_session(USER, Some("alice")).await.unwrap();
        engine.choose_exercise(USER, "Bench Press").await.unwrap();
        engine.enter_weight(USER, "60").await.unwrap();
        engine.enter_reps(USER, "10").await.unwrap();
        engine.registry().get(USER).unwrap().session_id
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("0"), Some(0));
        assert_eq!(parse_count("60"), Some(60));
        assert_eq!(parse_count(" 12 "), Some(12));
        assert_eq!(parse_count("12.5"), None);
        assert_eq!(parse_count("-3"), None);
        assert_eq!(parse_count("+3"), None);
        assert_eq!(parse_count("60kg"), None);
        assert_eq!(parse_count(""), None);
        // Beyond u32::MAX: all digits, still rejected.
        assert_eq!(parse_count("99999999999"), None);
    }

    #[tokio::test]
    async fn test_happy_path_state_sequence() {
        let (engine, _, _) = engine();

        let reply = engine.start_session(USER, Some("alice")).await.unwrap();
        assert_eq!(reply.state, StepState::ChoosingExercise);

        let reply = engine.choose_exercise(USER, "Bench Press").await.unwrap();
        assert_eq!(reply.state, StepState::EnteringWeight);

        let reply = engine.enter_weight(USER, "60").await.unwrap();
        assert_eq!(reply.state, StepState::EnteringReps);

        let reply = engine.enter_reps(USER, "10").await.unwrap();
        assert_eq!(reply.state, StepState::ContinueSet);
        assert!(reply.message.contains("60kg x 10 reps"));

        let reply = engine.continue_choice(USER, ContinueChoice::NextSet);
        assert_eq!(reply.state, StepState::EnteringReps);

        let reply = engine.end_session(USER).await.unwrap();
        assert_eq!(reply.state, StepState::Closed);
    }

    #[tokio::test]
    async fn test_full_scenario_persists_expected_rows() {
        let (engine, repo, _) = engine();

        engine.start_session(USER, Some("alice")).await.unwrap();
        engine.choose_exercise(USER, "Bench Press").await.unwrap();
        engine.enter_weight(USER, "60").await.unwrap();
        engine.enter_reps(USER, "10").await.unwrap();
        let session_id = engine.registry().get(USER).unwrap().session_id;
        engine.continue_choice(USER, ContinueChoice::NextSet);
        engine.enter_reps(USER, "8").await.unwrap();
        engine.end_session(USER).await.unwrap();

        let session = repo.session(session_id).unwrap();
        assert!(session.end_time.is_some());
        assert_eq!(repo.exercise_count(), 1);
        assert_eq!(repo.set_count(), 2);
        // One set-exercise row per logged set, both at weight 60.
        assert_eq!(repo.set_exercise_count(), 2);
        assert_eq!(repo.set_numbers(session_id), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_steps_without_session_report_fault() {
        let (engine, _, _) = engine();

        let reply = engine.choose_exercise(USER, "Squat").await.unwrap();
        assert_eq!(reply.fault, Some(StepFault::NoActiveSession));

        let reply = engine.enter_weight(USER, "60").await.unwrap();
        assert_eq!(reply.fault, Some(StepFault::NoActiveSession));

        let reply = engine.enter_reps(USER, "10").await.unwrap();
        assert_eq!(reply.fault, Some(StepFault::NoActiveSession));

        let reply = engine.end_session(USER).await.unwrap();
        assert_eq!(reply.fault, Some(StepFault::NoActiveSession));
        assert_eq!(reply.message, "No active workout session found.");
    }

    #[tokio::test]
    async fn test_invalid_weight_rejected_without_mutation() {
        let (engine, repo, _) = engine();
        engine.start_session(USER, None).await.unwrap();
        engine.choose_exercise(USER, "Deadlift").await.unwrap();

        for raw in ["12.5", "-3", "abc", "60kg", ""] {
            let reply = engine.enter_weight(USER, raw).await.unwrap();
            assert_eq!(reply.state, StepState::EnteringWeight, "input {raw:?}");
            assert_eq!(reply.fault, Some(StepFault::InvalidNumber));
        }

        // No scratch weight, no store rows, and the last action is still the
        // exercise choice.
        let entry = engine.registry().get(USER).unwrap();
        assert!(entry.current_weight.is_none());
        assert_eq!(repo.set_count(), 0);
        assert!(matches!(
            engine.registry().last_action(USER),
            Some(LastAction::ChoseExercise { .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_reps_rejected_without_mutation() {
        let (engine, repo, _) = engine();
        engine.start_session(USER, None).await.unwrap();
        engine.choose_exercise(USER, "Deadlift").await.unwrap();
        engine.enter_weight(USER, "100").await.unwrap();

        let reply = engine.enter_reps(USER, "8.5").await.unwrap();
        assert_eq!(reply.state, StepState::EnteringReps);
        assert_eq!(reply.fault, Some(StepFault::InvalidNumber));
        assert_eq!(repo.set_count(), 0);
        assert_eq!(engine.registry().get(USER).unwrap().set_count, 0);
    }

    #[tokio::test]
    async fn test_set_numbers_contiguous_across_undo() {
        let (engine, repo, _) = engine();
        engine.start_session(USER, None).await.unwrap();
        engine.choose_exercise(USER, "Squat").await.unwrap();
        engine.enter_weight(USER, "80").await.unwrap();

        engine.enter_reps(USER, "5").await.unwrap();
        engine.enter_reps(USER, "5").await.unwrap();
        engine.enter_reps(USER, "3").await.unwrap();
        let session_id = engine.registry().get(USER).unwrap().session_id;
        assert_eq!(repo.set_numbers(session_id), vec![1, 2, 3]);

        // Undo the third set, then log two more: the freed ordinal is
        // reused and the sequence stays gapless.
        engine.undo(USER).await.unwrap();
        assert_eq!(engine.registry().get(USER).unwrap().set_count, 2);

        engine.choose_exercise(USER, "Squat").await.unwrap();
        engine.enter_weight(USER, "80").await.unwrap();
        engine.enter_reps(USER, "2").await.unwrap();
        engine.enter_reps(USER, "1").await.unwrap();
        assert_eq!(repo.set_numbers(session_id), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_choose_exercise_is_idempotent_by_name() {
        let (engine, repo, _) = engine();
        engine.start_session(USER, None).await.unwrap();

        engine.choose_exercise(USER, "Bench Press").await.unwrap();
        let first = engine.registry().get(USER).unwrap().current_exercise_id;

        engine.choose_exercise(USER, "Bench Press").await.unwrap();
        let second = engine.registry().get(USER).unwrap().current_exercise_id;

        assert_eq!(first, second);
        assert_eq!(repo.exercise_count(), 1);
    }

    #[tokio::test]
    async fn test_undo_reps_removes_set_but_keeps_set_exercise() {
        let (engine, repo, _) = engine();
        let session_id = start_and_log_one(&engine).await;
        assert_eq!(repo.set_count(), 1);
        assert_eq!(repo.set_exercise_count(), 1);

        let reply = engine.undo(USER).await.unwrap();
        assert_eq!(reply.state, StepState::ChoosingExercise);
        assert!(reply.fault.is_none());

        assert_eq!(repo.set_count(), 0);
        assert_eq!(repo.set_numbers(session_id), Vec::<u32>::new());
        // The orphaned set-exercise row is intentionally left behind.
        assert_eq!(repo.set_exercise_count(), 1);
        assert_eq!(engine.registry().get(USER).unwrap().set_count, 0);
        assert!(engine.registry().last_action(USER).is_none());
    }

    #[tokio::test]
    async fn test_undo_weight_clears_scratch() {
        let (engine, _, _) = engine();
        engine.start_session(USER, None).await.unwrap();
        engine.choose_exercise(USER, "Row").await.unwrap();
        engine.enter_weight(USER, "40").await.unwrap();

        let reply = engine.undo(USER).await.unwrap();
        assert_eq!(reply.state, StepState::ChoosingExercise);

        let entry = engine.registry().get(USER).unwrap();
        assert!(entry.current_weight.is_none());
        assert!(entry.current_exercise_id.is_none());
    }

    #[tokio::test]
    async fn test_undo_exercise_choice_touches_no_store_rows() {
        let (engine, repo, _) = engine();
        engine.start_session(USER, None).await.unwrap();
        engine.choose_exercise(USER, "Curl").await.unwrap();

        engine.undo(USER).await.unwrap();

        // The exercise row stays: other sessions may reference it.
        assert_eq!(repo.exercise_count(), 1);
        assert!(engine.registry().last_action(USER).is_none());
    }

    #[tokio::test]
    async fn test_undo_with_empty_slot_reports_nothing_to_undo() {
        let (engine, repo, _) = engine();
        engine.start_session(USER, None).await.unwrap();

        let before = engine.registry().get(USER).unwrap();
        let reply = engine.undo(USER).await.unwrap();

        assert_eq!(reply.fault, Some(StepFault::NothingToUndo));
        assert_eq!(reply.message, "No action to undo.");
        assert_eq!(engine.registry().get(USER).unwrap(), before);
        assert_eq!(repo.set_count(), 0);
    }

    #[tokio::test]
    async fn test_undo_only_reverses_one_step() {
        let (engine, repo, _) = engine();
        start_and_log_one(&engine).await;

        engine.undo(USER).await.unwrap();
        // Slot was cleared; a second undo has nothing left.
        let reply = engine.undo(USER).await.unwrap();
        assert_eq!(reply.fault, Some(StepFault::NothingToUndo));
        assert_eq!(repo.set_count(), 0);
    }

    #[tokio::test]
    async fn test_enter_reps_without_context_is_rejected() {
        let (engine, repo, _) = engine();
        engine.start_session(USER, None).await.unwrap();

        let reply = engine.enter_reps(USER, "10").await.unwrap();
        assert_eq!(reply.fault, Some(StepFault::MissingContext));
        assert_eq!(reply.state, StepState::ChoosingExercise);
        assert_eq!(repo.set_count(), 0);
    }

    #[tokio::test]
    async fn test_store_failure_leaves_registry_untouched() {
        let (engine, repo, _) = engine();
        engine.start_session(USER, None).await.unwrap();
        engine.choose_exercise(USER, "Press").await.unwrap();
        engine.enter_weight(USER, "50").await.unwrap();

        let before = engine.registry().get(USER).unwrap();
        let action_before = engine.registry().last_action(USER);

        repo.fail_next();
        let err = engine.enter_reps(USER, "10").await;
        assert!(err.is_err());

        assert_eq!(engine.registry().get(USER).unwrap(), before);
        assert_eq!(engine.registry().last_action(USER), action_before);
        assert_eq!(repo.set_count(), 0);
    }

    #[tokio::test]
    async fn test_end_session_closes_row_and_second_end_faults() {
        let (engine, repo, _) = engine();
        let session_id = start_and_log_one(&engine).await;

        let reply = engine.end_session(USER).await.unwrap();
        assert!(reply.fault.is_none());
        assert!(repo.session(session_id).unwrap().end_time.is_some());
        assert!(engine.registry().get(USER).is_none());

        let reply = engine.end_session(USER).await.unwrap();
        assert_eq!(reply.fault, Some(StepFault::NoActiveSession));
    }

    #[tokio::test]
    async fn test_cancel_closes_active_session() {
        let (engine, repo, _) = engine();
        let session_id = start_and_log_one(&engine).await;

        let reply = engine.cancel(USER).await.unwrap();
        assert_eq!(reply.state, StepState::Closed);
        assert!(repo.session(session_id).unwrap().end_time.is_some());
        assert!(engine.registry().get(USER).is_none());
    }

    #[tokio::test]
    async fn test_cancel_without_session_just_reports() {
        let (engine, _, _) = engine();
        let reply = engine.cancel(USER).await.unwrap();
        assert_eq!(reply.state, StepState::Closed);
        assert!(reply.fault.is_none());
        assert_eq!(reply.message, "Operation cancelled.");
    }

    #[tokio::test]
    async fn test_restart_closes_previous_session() {
        let (engine, repo, _) = engine();
        let first = start_and_log_one(&engine).await;

        engine.start_session(USER, Some("alice")).await.unwrap();
        let second = engine.registry().get(USER).unwrap().session_id;

        assert_ne!(first, second);
        assert!(repo.session(first).unwrap().end_time.is_some());
        assert!(repo.session(second).unwrap().end_time.is_none());
        // The fresh entry starts clean.
        let entry = engine.registry().get(USER).unwrap();
        assert_eq!(entry.set_count, 0);
        assert!(engine.registry().last_action(USER).is_none());
    }

    #[tokio::test]
    async fn test_update_weight_keeps_exercise() {
        let (engine, repo, _) = engine();
        engine.start_session(USER, None).await.unwrap();
        engine.choose_exercise(USER, "Bench Press").await.unwrap();
        engine.enter_weight(USER, "60").await.unwrap();
        engine.enter_reps(USER, "10").await.unwrap();

        engine.continue_choice(USER, ContinueChoice::UpdateWeight);
        engine.enter_weight(USER, "65").await.unwrap();
        engine.enter_reps(USER, "8").await.unwrap();

        let session_id = engine.registry().get(USER).unwrap().session_id;
        let sets = repo.list_session_sets(session_id).await.unwrap();
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].weight, 60);
        assert_eq!(sets[1].weight, 65);
        assert_eq!(sets[1].exercise_name, "Bench Press");
        assert_eq!(repo.exercise_count(), 1);
    }
}
