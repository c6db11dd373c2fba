//! Configuration module for Stakeplan.
//!
//! This module provides structured configuration loading from environment
//! variables (optionally seeded from a `.env` file) and from session files.

mod planner_env_config;
mod session_file;

pub use planner_env_config::{DEFAULT_MONTE_CARLO_ITERATIONS, PlannerEnvConfig};
pub use session_file::SessionFile;

use crate::domain::config::PlannerConfig;
use anyhow::{Context, Result};

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub planner: PlannerConfig,
    pub monte_carlo_iterations: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let env_config = PlannerEnvConfig::from_env().context("Failed to load planner config")?;
        Self::from_env_config(&env_config)
    }

    pub fn from_env_config(env_config: &PlannerEnvConfig) -> Result<Self> {
        Ok(Self {
            planner: env_config.planner_config()?,
            monte_carlo_iterations: env_config.monte_carlo_iterations,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            planner: PlannerConfig::default(),
            monte_carlo_iterations: DEFAULT_MONTE_CARLO_ITERATIONS,
        }
    }
}
