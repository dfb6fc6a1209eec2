use crate::error::StoreError;
use crate::models::{YswsSubmission, YSWS_TABLE};
use crate::store::{fields, RecordStore};
use rust_decimal::Decimal;
use serde_json::json;
use std::sync::Arc;

/// Repository for YSWS payout records
pub struct YswsRepository {
    store: Arc<dyn RecordStore>,
}

impl YswsRepository {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        project_id: &str,
        user_id: &str,
    ) -> Result<YswsSubmission, StoreError> {
        self.store
            .create(
                YSWS_TABLE,
                fields(json!({
                    "projectId": project_id,
                    "userId": user_id,
                    "status": "pending",
                })),
            )
            .await?
            .decode()
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<YswsSubmission>, StoreError> {
        self.store
            .find(YSWS_TABLE, id)
            .await?
            .map(|r| r.decode())
            .transpose()
    }

    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.store.destroy(YSWS_TABLE, id).await
    }

    /// Retire a pending record replaced by a newer review round.
    ///
    /// Paid records are left alone.
    pub async fn supersede(&self, id: &str) -> Result<Option<YswsSubmission>, StoreError> {
        match self.find_by_id(id).await? {
            Some(record) if record.status == "pending" => self
                .store
                .update(YSWS_TABLE, id, fields(json!({ "status": "superseded" })))
                .await?
                .decode()
                .map(Some),
            _ => Ok(None),
        }
    }

    /// Record the hours and coins paid out for the submission
    pub async fn record_payout(
        &self,
        id: &str,
        hours: Decimal,
        coins: i64,
        rate: Decimal,
    ) -> Result<YswsSubmission, StoreError> {
        self.store
            .update(
                YSWS_TABLE,
                id,
                fields(json!({
                    "status": "paid",
                    "hoursAwarded": hours,
                    "coinsAwarded": coins,
                    "coinRate": rate,
                })),
            )
            .await?
            .decode()
    }
}
