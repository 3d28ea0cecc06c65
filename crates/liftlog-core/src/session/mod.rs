//! The conversational session core: registry, step engine, and idle sweeper.

pub mod engine;
pub mod notifier;
pub mod registry;
pub mod sweeper;
