//! In-Memory Repository Implementations
//!
//! This module provides thread-safe, in-memory implementations of the
//! repository traits defined in `domain::repositories`.
//!
//! # Features
//!
//! - **Thread-safe**: Uses `Arc<RwLock>` for concurrent access
//! - **Async**: All operations are async-ready
//!
//! # Limitations
//!
//! - Data is lost on application restart
//! - No persistence across multiple instances

use crate::domain::repositories::{SessionRepository, TradeRepository};
use crate::domain::session::{SessionRecord, Trade};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory implementation of SessionRepository
pub struct InMemorySessionRepository {
    sessions: Arc<RwLock<HashMap<Uuid, SessionRecord>>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemorySessionRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn save(&self, session: &SessionRecord) -> Result<()> {
        self.sessions
            .write()
            .await
            .insert(session.id, session.clone());
        Ok(())
    }

    async fn load(&self, id: Uuid) -> Result<Option<SessionRecord>> {
        Ok(self.sessions.read().await.get(&id).cloned())
    }

    async fn list_ids(&self) -> Result<Vec<Uuid>> {
        let sessions = self.sessions.read().await;
        let mut records: Vec<&SessionRecord> = sessions.values().collect();
        records.sort_by_key(|s| s.created_at);
        Ok(records.into_iter().map(|s| s.id).collect())
    }
}

/// In-memory implementation of TradeRepository
/// Trades are kept in insertion order; updates replace in place
pub struct InMemoryTradeRepository {
    trades: Arc<RwLock<Vec<Trade>>>,
}

impl InMemoryTradeRepository {
    pub fn new() -> Self {
        Self {
            trades: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemoryTradeRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TradeRepository for InMemoryTradeRepository {
    async fn save(&self, trade: &Trade) -> Result<()> {
        let mut trades = self.trades.write().await;
        match trades.iter_mut().find(|t| t.id == trade.id) {
            Some(existing) => *existing = trade.clone(),
            None => trades.push(trade.clone()),
        }
        Ok(())
    }

    async fn find_by_session(&self, session_id: Uuid) -> Result<Vec<Trade>> {
        let trades = self.trades.read().await;
        let mut found: Vec<Trade> = trades
            .iter()
            .filter(|t| t.session_id == session_id)
            .cloned()
            .collect();
        found.sort_by_key(|t| t.sequence);
        Ok(found)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.trades.read().await.len())
    }
}
