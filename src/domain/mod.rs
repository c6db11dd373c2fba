// Planner configuration value objects
pub mod config;

// Domain-specific error types
pub mod errors;

// Stake planning engine
pub mod planning;

// Repository traits
pub mod repositories;

// Sessions and trades
pub mod session;
