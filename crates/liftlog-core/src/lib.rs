//! Business logic for the Liftlog workout logger.
//!
//! This crate defines the "ports" (the repository trait and the notifier
//! trait) that the infrastructure and transport layers implement, plus the
//! conversation step engine, the in-memory session registry, and the idle
//! sweeper. It depends only on `liftlog-types` -- never on `liftlog-infra`
//! or any database/IO crate.

pub mod clock;
pub mod repository;
pub mod session;

#[cfg(test)]
pub(crate) mod testkit;
