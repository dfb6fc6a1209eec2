use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SESSIONS_TABLE: &str = "Sessions";

/// Login session; only the SHA-256 of the cookie token is stored
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub created_time: DateTime<Utc>,
    pub token_hash: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
