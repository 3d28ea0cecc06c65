//! Out-of-band user notification port.
//!
//! The idle sweeper has no request/response cycle to answer into, so it
//! pushes its "session timed out" message through this trait. The transport
//! layer implements it (the CLI prints a styled line).

use liftlog_types::workout::UserId;
use thiserror::Error;

/// A notification could not be delivered.
///
/// The sweeper logs this and closes the session anyway; an unreachable user
/// must not keep an idle session open.
#[derive(Debug, Error)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

/// Push a message to a user outside the normal step cycle.
pub trait SessionNotifier: Send + Sync {
    fn notify(
        &self,
        user_id: UserId,
        text: &str,
    ) -> impl std::future::Future<Output = Result<(), NotifyError>> + Send;
}
