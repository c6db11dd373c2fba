// Declared session parameters
pub mod parameters;

// Session aggregate driving the planner
pub mod planning_session;

// Persistent session identity
pub mod record;

// Runtime state derived from trades
pub mod state;

// Planned trades and outcomes
pub mod trade;

pub use parameters::SessionParameters;
pub use planning_session::{PlanningSession, SessionProgress, SessionStatus};
pub use record::SessionRecord;
pub use state::SessionRuntimeState;
pub use trade::{Trade, TradeOutcome, TradeStatus};
