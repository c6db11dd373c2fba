use crate::domain::config::PlannerConfig;
use crate::domain::planning::{RequiredBalanceTable, TargetProfitCalculator};
use crate::domain::session::{PlanningSession, SessionParameters};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Target profit and required-balance table derived from one parameter set
#[derive(Debug, Clone)]
pub struct CachedPlan {
    pub target_profit: Decimal,
    pub table: Arc<RequiredBalanceTable>,
}

/// Cache of required-balance tables keyed by session parameters.
///
/// Tables are immutable once built, so sessions sharing parameters share one
/// table. Entries are only valid for the planner config the cache was built with.
pub struct BalanceTableCache {
    calculator: TargetProfitCalculator,
    plans: RwLock<HashMap<SessionParameters, CachedPlan>>,
}

impl std::fmt::Debug for BalanceTableCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BalanceTableCache")
            .field("plans", &"<RwLock>")
            .finish()
    }
}

impl BalanceTableCache {
    pub fn new(config: &PlannerConfig) -> Self {
        Self {
            calculator: TargetProfitCalculator::new(config),
            plans: RwLock::new(HashMap::new()),
        }
    }

    /// Cached plan for `params`, building and storing it on first use
    pub fn get_or_build(&self, params: &SessionParameters) -> CachedPlan {
        let cached = match self.plans.read() {
            Ok(guard) => guard.get(params).cloned(),
            Err(poisoned) => poisoned.into_inner().get(params).cloned(),
        };
        if let Some(plan) = cached {
            return plan;
        }

        let target_profit = self.calculator.compute(params);
        let plan = CachedPlan {
            target_profit,
            table: Arc::new(PlanningSession::build_table(params, target_profit)),
        };
        tracing::debug!(
            "BalanceTableCache: Built table for {:?} (target profit ${})",
            params,
            target_profit
        );

        let mut guard = match self.plans.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("BalanceTableCache: Lock poisoned during write, recovering");
                poisoned.into_inner()
            }
        };
        // Another caller may have built the same table meanwhile; keep the first
        guard.entry(*params).or_insert(plan).clone()
    }

    pub fn len(&self) -> usize {
        match self.plans.read() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for BalanceTableCache {
    fn default() -> Self {
        Self::new(&PlannerConfig::default())
    }
}
