//! Configuration types for Liftlog.
//!
//! `LiftlogConfig` represents the top-level `config.toml` that controls the
//! idle sweeper cadence. All fields have sensible defaults.

use serde::{Deserialize, Serialize};

use std::time::Duration;

/// Top-level configuration, loaded from `{data_dir}/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiftlogConfig {
    /// How often the idle sweeper scans the session registry, in seconds.
    #[serde(default = "default_sweep_period_secs")]
    pub sweep_period_secs: u64,

    /// How long a session may sit without a logged set before it is
    /// force-closed, in seconds.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

fn default_sweep_period_secs() -> u64 {
    60
}

fn default_idle_timeout_secs() -> u64 {
    2 * 60 * 60
}

impl Default for LiftlogConfig {
    fn default() -> Self {
        Self {
            sweep_period_secs: default_sweep_period_secs(),
            idle_timeout_secs: default_idle_timeout_secs(),
        }
    }
}

impl LiftlogConfig {
    pub fn sweep_period(&self) -> Duration {
        Duration::from_secs(self.sweep_period_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}
