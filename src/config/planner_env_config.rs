//! Planner configuration parsing from environment variables.
//!
//! This module handles loading the target profit constants, the profit
//! alignment limits and the simulation defaults.

use crate::domain::config::{
    ALIGNMENT_MAX_PASSES, ALIGNMENT_TOLERANCE, BASE_RISK_FRACTION, BENCHMARK_WIN_RATE,
    PlannerConfig,
};
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;

pub const DEFAULT_MONTE_CARLO_ITERATIONS: usize = 1000;

/// Planner environment configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerEnvConfig {
    // Target Profit
    pub benchmark_win_rate: Decimal,
    pub base_risk_fraction: Decimal,

    // Profit Alignment
    pub alignment_tolerance: Decimal,
    pub alignment_max_passes: usize,

    // Simulation
    pub monte_carlo_iterations: usize,
}

impl Default for PlannerEnvConfig {
    fn default() -> Self {
        Self {
            benchmark_win_rate: BENCHMARK_WIN_RATE,
            base_risk_fraction: BASE_RISK_FRACTION,
            alignment_tolerance: ALIGNMENT_TOLERANCE,
            alignment_max_passes: ALIGNMENT_MAX_PASSES,
            monte_carlo_iterations: DEFAULT_MONTE_CARLO_ITERATIONS,
        }
    }
}

impl PlannerEnvConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an arbitrary key lookup; unset keys fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            benchmark_win_rate: Self::parse_decimal(
                &lookup,
                "BENCHMARK_WIN_RATE",
                BENCHMARK_WIN_RATE,
            )?,
            base_risk_fraction: Self::parse_decimal(
                &lookup,
                "BASE_RISK_FRACTION",
                BASE_RISK_FRACTION,
            )?,
            alignment_tolerance: Self::parse_decimal(
                &lookup,
                "ALIGNMENT_TOLERANCE",
                ALIGNMENT_TOLERANCE,
            )?,
            alignment_max_passes: Self::parse_usize(
                &lookup,
                "ALIGNMENT_MAX_PASSES",
                ALIGNMENT_MAX_PASSES,
            )?,
            monte_carlo_iterations: Self::parse_usize(
                &lookup,
                "MONTE_CARLO_ITERATIONS",
                DEFAULT_MONTE_CARLO_ITERATIONS,
            )?,
        })
    }

    /// Validated domain configuration
    pub fn planner_config(&self) -> Result<PlannerConfig> {
        PlannerConfig::new(
            self.benchmark_win_rate,
            self.base_risk_fraction,
            self.alignment_tolerance,
            self.alignment_max_passes,
        )
        .context("Invalid planner configuration")
    }

    fn parse_decimal<F>(lookup: &F, key: &str, default: Decimal) -> Result<Decimal>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(key) {
            Some(raw) => Decimal::from_str(raw.trim()).context(format!("Failed to parse {}", key)),
            None => Ok(default),
        }
    }

    fn parse_usize<F>(lookup: &F, key: &str, default: usize) -> Result<usize>
    where
        F: Fn(&str) -> Option<String>,
    {
        lookup(key)
            .unwrap_or_else(|| default.to_string())
            .trim()
            .parse::<usize>()
            .context(format!("Failed to parse {}", key))
    }
}
