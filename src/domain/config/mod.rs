//! Configuration domain module
//!
//! This module contains the validated value objects that parameterize the
//! planning engine, independent of where their values are loaded from.

pub mod planner_config;

pub use planner_config::{
    ALIGNMENT_MAX_PASSES, ALIGNMENT_TOLERANCE, BASE_RISK_FRACTION, BENCHMARK_WIN_RATE,
    PlannerConfig, PlannerConfigError,
};
