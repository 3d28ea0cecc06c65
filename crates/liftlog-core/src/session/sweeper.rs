//! Background sweeper that force-closes idle sessions.
//!
//! Runs on a fixed period, independent of per-user events. Candidates are
//! collected under the registry lock; notification and the store write
//! happen outside it, and the entry is only removed after the close
//! committed -- and only if it still refers to the same session, so a
//! concurrent user-initiated end wins harmlessly.

use chrono::Duration as ChronoDuration;
use liftlog_types::workout::UserId;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use std::sync::Arc;
use std::time::Duration;

use crate::clock::Clock;
use crate::repository::workout::WorkoutRepository;
use crate::session::notifier::SessionNotifier;
use crate::session::registry::SessionRegistry;

/// Message pushed to the user when their session is force-closed.
const TIMEOUT_MESSAGE: &str = "Session timed out. Workout session ended and data saved.";

/// Periodic scan of the session registry that ends sessions whose last
/// logged set is older than the idle timeout.
///
/// Sessions that have not logged any set yet are never swept: they carry no
/// `last_entry_time` to judge idleness by.
pub struct IdleSweeper<R, N, C> {
    registry: Arc<SessionRegistry>,
    repo: R,
    notifier: N,
    clock: C,
    period: Duration,
    idle_timeout: ChronoDuration,
}

impl<R: WorkoutRepository, N: SessionNotifier, C: Clock> IdleSweeper<R, N, C> {
    pub fn new(
        registry: Arc<SessionRegistry>,
        repo: R,
        notifier: N,
        clock: C,
        period: Duration,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            repo,
            notifier,
            clock,
            period,
            idle_timeout: ChronoDuration::seconds(idle_timeout.as_secs() as i64),
        }
    }

    /// Sweep on every tick until the token is cancelled.
    pub async fn run(self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.period);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Idle sweeper stopped");
                    return;
                }
                _ = ticker.tick() => {
                    self.sweep().await;
                }
            }
        }
    }

    /// One scan. Returns the users whose sessions were closed.
    pub async fn sweep(&self) -> Vec<UserId> {
        let now = self.clock.now();
        let candidates = self.registry.idle_entries(now - self.idle_timeout);
        let mut swept = Vec::with_capacity(candidates.len());

        for (user_id, session_id) in candidates {
            if let Err(err) = self.notifier.notify(user_id, TIMEOUT_MESSAGE).await {
                warn!(%user_id, %err, "Timeout notification failed");
            }

            // Same store mutation as a normal end, different trigger. On
            // failure the entry stays and is retried on the next sweep.
            match self.repo.close_session(session_id, now).await {
                Ok(_) => {
                    self.registry.remove_if_session(user_id, session_id);
                    info!(%user_id, %session_id, "Idle session force-closed");
                    swept.push(user_id);
                }
                Err(err) => {
                    error!(%user_id, %session_id, %err, "Failed to close idle session");
                }
            }
        }

        swept
    }
}
