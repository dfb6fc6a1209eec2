use super::decode_all;
use crate::error::StoreError;
use crate::models::codec::comma_list;
use crate::models::{Devlog, DEVLOGS_TABLE};
use crate::store::{fields, Filter, Query, RecordStore};
use rust_decimal::Decimal;
use serde_json::json;
use std::sync::Arc;

/// Hours and links of a devlog being written
#[derive(Debug, Clone)]
pub struct NewDevlog<'a> {
    pub user_id: &'a str,
    pub content: &'a str,
    pub code_hours: Decimal,
    pub art_hours: Decimal,
    pub pending_code_hours: Decimal,
    pub pending_art_hours: Decimal,
    pub project_ids: &'a [String],
}

/// Repository for devlog records
pub struct DevlogRepository {
    store: Arc<dyn RecordStore>,
}

impl DevlogRepository {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, devlog: NewDevlog<'_>) -> Result<Devlog, StoreError> {
        self.store
            .create(
                DEVLOGS_TABLE,
                fields(json!({
                    "userId": devlog.user_id,
                    "content": devlog.content,
                    "hours": devlog.code_hours + devlog.art_hours,
                    "codeHours": devlog.code_hours,
                    "artHours": devlog.art_hours,
                    "pendingCodeHours": devlog.pending_code_hours,
                    "pendingArtHours": devlog.pending_art_hours,
                    "projectIds": comma_list::join(devlog.project_ids),
                })),
            )
            .await?
            .decode()
    }

    /// All devlogs written by a user
    pub async fn find_by_user(&self, user_id: &str) -> Result<Vec<Devlog>, StoreError> {
        let records = self
            .store
            .select(DEVLOGS_TABLE, &Query::new(Filter::eq("userId", user_id)))
            .await?;
        decode_all(records)
    }
}
