use crate::domain::session::parameters::SessionParameters;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persistent identity of a session.
///
/// Runtime state is not stored: it is rebuilt from the session's trades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: Uuid,
    pub parameters: SessionParameters,
    pub created_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(parameters: SessionParameters) -> Self {
        Self {
            id: Uuid::new_v4(),
            parameters,
            created_at: Utc::now(),
        }
    }
}
