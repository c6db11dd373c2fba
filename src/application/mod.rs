pub mod planning_service;
pub mod table_cache;

pub use planning_service::PlanningService;
pub use table_cache::{BalanceTableCache, CachedPlan};
