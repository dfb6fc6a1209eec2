use super::decode_first;
use crate::error::StoreError;
use crate::models::{Session, SESSIONS_TABLE};
use crate::store::{fields, Filter, Query, RecordStore};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;

/// Repository for login sessions
pub struct SessionRepository {
    store: Arc<dyn RecordStore>,
}

impl SessionRepository {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        user_id: &str,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Session, StoreError> {
        self.store
            .create(
                SESSIONS_TABLE,
                fields(json!({
                    "userId": user_id,
                    "tokenHash": token_hash,
                    "expiresAt": expires_at.to_rfc3339(),
                })),
            )
            .await?
            .decode()
    }

    pub async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<Session>, StoreError> {
        let records = self
            .store
            .select(
                SESSIONS_TABLE,
                &Query::new(Filter::eq("tokenHash", token_hash)).limit(1),
            )
            .await?;
        decode_first(records)
    }
}
