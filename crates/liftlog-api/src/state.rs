//! Application state wiring the engine to the concrete infrastructure.
//!
//! The step engine is generic over the repository and clock traits; AppState
//! pins it to the SQLite implementation and the system clock.

use std::path::PathBuf;
use std::sync::Arc;

use liftlog_core::clock::SystemClock;
use liftlog_core::session::engine::StepEngine;
use liftlog_core::session::registry::SessionRegistry;
use liftlog_infra::config::{database_url, load_config, resolve_data_dir};
use liftlog_infra::sqlite::pool::DatabasePool;
use liftlog_infra::sqlite::workout::SqliteWorkoutRepository;
use liftlog_types::config::LiftlogConfig;

/// Concrete type alias for the engine generics pinned to infra implementations.
pub type ConcreteStepEngine = StepEngine<SqliteWorkoutRepository, SystemClock>;

/// Shared application state for the CLI commands.
pub struct AppState {
    pub engine: Arc<ConcreteStepEngine>,
    pub registry: Arc<SessionRegistry>,
    pub repo: SqliteWorkoutRepository,
    pub config: LiftlogConfig,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state: connect to the DB, wire the engine.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir).await?;

        let db_pool = DatabasePool::new(&database_url(&data_dir)).await?;
        let config = load_config(&data_dir).await;

        let registry = Arc::new(SessionRegistry::new());
        let engine = StepEngine::new(
            SqliteWorkoutRepository::new(db_pool.clone()),
            Arc::clone(&registry),
            SystemClock,
        );

        Ok(Self {
            engine: Arc::new(engine),
            registry,
            repo: SqliteWorkoutRepository::new(db_pool.clone()),
            config,
            data_dir,
            db_pool,
        })
    }
}
