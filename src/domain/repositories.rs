//! Repository Pattern Abstractions
//!
//! This module defines repository traits for session persistence,
//! enabling clean separation between planning logic and storage implementation.
//!
//! # Design
//!
//! - `SessionRepository`: Persists session identities and their parameters
//! - `TradeRepository`: Persists planned trades, pending and resolved
//!
//! Runtime state is never stored. It is rebuilt from a session's trades on load.
//!
//! # Example
//!
//! ```rust,no_run
//! use stakeplan::domain::repositories::TradeRepository;
//! use stakeplan::infrastructure::InMemoryTradeRepository;
//!
//! # async {
//! let repo = InMemoryTradeRepository::new();
//! // repo.save(&trade).await?;
//! // let history = repo.find_by_session(session_id).await?;
//! # };
//! ```

use crate::domain::session::{SessionRecord, Trade};
use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Repository for persisting and retrieving sessions
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Insert or replace a session record
    async fn save(&self, session: &SessionRecord) -> Result<()>;

    /// Load a session by id
    async fn load(&self, id: Uuid) -> Result<Option<SessionRecord>>;

    /// Ids of all stored sessions, oldest first
    async fn list_ids(&self) -> Result<Vec<Uuid>>;
}

/// Repository for persisting and retrieving planned trades
#[async_trait]
pub trait TradeRepository: Send + Sync {
    /// Insert a trade, or replace the stored trade with the same id
    async fn save(&self, trade: &Trade) -> Result<()>;

    /// All trades of a session in sequence order
    async fn find_by_session(&self, session_id: Uuid) -> Result<Vec<Trade>>;

    /// Count total number of trades
    async fn count(&self) -> Result<usize>;
}
