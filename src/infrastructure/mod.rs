pub mod repositories;

pub use repositories::{InMemorySessionRepository, InMemoryTradeRepository};
