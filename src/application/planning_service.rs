//! Planning Service
//!
//! Application façade over the planning engine. Loads sessions from the
//! repositories, drives them through `PlanningSession` and persists the trades
//! each operation touches.
//!
//! # Concurrency
//!
//! Operations on one session are serialized by a per-session mutex, so two
//! callers can never both plan a trade or both resolve the same pending trade.
//! Different sessions proceed in parallel and share cached tables.

use crate::application::table_cache::BalanceTableCache;
use crate::domain::config::PlannerConfig;
use crate::domain::errors::PlanningError;
use crate::domain::planning::AlignmentReport;
use crate::domain::repositories::{SessionRepository, TradeRepository};
use crate::domain::session::{
    PlanningSession, SessionParameters, SessionProgress, SessionRecord, Trade, TradeOutcome,
};
use anyhow::Result;
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Per-session mutexes. An entry lives only while some caller holds or
/// awaits its mutex.
#[derive(Default)]
struct SessionLocks {
    locks: StdMutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    async fn acquire(&self, session_id: Uuid) -> SessionGuard<'_> {
        let lock = self
            .registry()
            .entry(session_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        SessionGuard {
            locks: self,
            session_id,
            guard: Some(lock.lock_owned().await),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.registry().len()
    }

    fn registry(&self) -> MutexGuard<'_, HashMap<Uuid, Arc<Mutex<()>>>> {
        match self.locks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                error!("SessionLocks: Lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

struct SessionGuard<'a> {
    locks: &'a SessionLocks,
    session_id: Uuid,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        let mut registry = self.locks.registry();
        // Only the registry itself still references an idle mutex
        if registry
            .get(&self.session_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            registry.remove(&self.session_id);
        }
    }
}

pub struct PlanningService {
    config: PlannerConfig,
    session_repository: Arc<dyn SessionRepository>,
    trade_repository: Arc<dyn TradeRepository>,
    tables: BalanceTableCache,
    locks: SessionLocks,
}

impl PlanningService {
    pub fn new(
        config: PlannerConfig,
        session_repository: Arc<dyn SessionRepository>,
        trade_repository: Arc<dyn TradeRepository>,
    ) -> Self {
        Self {
            tables: BalanceTableCache::new(&config),
            config,
            session_repository,
            trade_repository,
            locks: SessionLocks::default(),
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Validate parameters and persist a new session
    pub async fn open_session(&self, params: SessionParameters) -> Result<SessionProgress> {
        params.validate()?;

        let record = SessionRecord::new(params);
        self.session_repository.save(&record).await?;

        let session = self.restore(&record, Vec::new());
        if !session.table().is_feasible_from(params.capital) {
            warn!(
                "PlanningService: Session {} starts below the required balance (capital ${} < ${:?})",
                record.id,
                params.capital,
                session.table().starting_requirement()
            );
        }

        info!(
            "PlanningService: Opened session {} (capital=${}, trades={}, accuracy={}%, R={}) target profit ${}",
            record.id,
            params.capital,
            params.total_trades,
            params.accuracy,
            params.risk_reward_ratio,
            session.target_profit()
        );

        Ok(session.progress())
    }

    /// Replace the parameters of a session that has no trades yet
    pub async fn update_parameters(
        &self,
        session_id: Uuid,
        params: SessionParameters,
    ) -> Result<SessionProgress> {
        params.validate()?;

        let _guard = self.locks.acquire(session_id).await;

        let mut record = self.load_record(session_id).await?;
        let trades = self.trade_repository.find_by_session(session_id).await?;
        if !trades.is_empty() {
            return Err(PlanningError::ParametersLocked {
                session_id,
                trades: trades.len(),
            }
            .into());
        }

        record.parameters = params;
        self.session_repository.save(&record).await?;

        info!("PlanningService: Updated parameters of session {}", session_id);
        Ok(self.restore(&record, trades).progress())
    }

    /// Plan the next trade of a session and persist it as pending
    pub async fn plan_next(&self, session_id: Uuid) -> Result<Option<Trade>> {
        let _guard = self.locks.acquire(session_id).await;

        let mut session = self.load_session(session_id).await?;
        let trade = session.plan_next_trade()?;
        if let Some(trade) = &trade {
            self.trade_repository.save(trade).await?;
        }
        Ok(trade)
    }

    /// Resolve a pending trade of a session
    pub async fn record(
        &self,
        session_id: Uuid,
        trade_id: Uuid,
        outcome: TradeOutcome,
    ) -> Result<Trade> {
        let _guard = self.locks.acquire(session_id).await;

        let mut session = self.load_session(session_id).await?;
        let trade = session.record_outcome(trade_id, outcome)?;
        self.trade_repository.save(&trade).await?;

        let progress = session.progress();
        info!(
            "PlanningService: Session {} balance ${} ({} wins, {} of {} trades, {:?})",
            session_id,
            progress.current_balance,
            progress.wins,
            progress.completed_trades,
            session.parameters().total_trades,
            progress.status
        );

        Ok(trade)
    }

    /// Align realized profit with the target and persist the adjusted trade
    pub async fn reconcile(&self, session_id: Uuid) -> Result<AlignmentReport> {
        let _guard = self.locks.acquire(session_id).await;

        let mut session = self.load_session(session_id).await?;
        let report = session.align_profit()?;

        if let Some(trade) = report
            .adjusted_trade
            .and_then(|id| session.trades().iter().find(|t| t.id == id))
        {
            self.trade_repository.save(trade).await?;
        }

        Ok(report)
    }

    pub async fn progress(&self, session_id: Uuid) -> Result<SessionProgress> {
        let _guard = self.locks.acquire(session_id).await;

        Ok(self.load_session(session_id).await?.progress())
    }

    /// Trade history of a session in sequence order
    pub async fn trades(&self, session_id: Uuid) -> Result<Vec<Trade>> {
        self.load_record(session_id).await?;
        self.trade_repository.find_by_session(session_id).await
    }

    pub async fn list_sessions(&self) -> Result<Vec<Uuid>> {
        self.session_repository.list_ids().await
    }

    async fn load_record(&self, session_id: Uuid) -> Result<SessionRecord> {
        Ok(self
            .session_repository
            .load(session_id)
            .await?
            .ok_or(PlanningError::SessionNotFound(session_id))?)
    }

    async fn load_session(&self, session_id: Uuid) -> Result<PlanningSession> {
        let record = self.load_record(session_id).await?;
        let trades = self.trade_repository.find_by_session(session_id).await?;
        Ok(self.restore(&record, trades))
    }

    fn restore(&self, record: &SessionRecord, trades: Vec<Trade>) -> PlanningSession {
        let plan = self.tables.get_or_build(&record.parameters);
        PlanningSession::restore(record, &self.config, plan.target_profit, plan.table, trades)
    }
}
