use super::decode_all;
use crate::error::StoreError;
use crate::models::{BlackholeSubmission, SubmissionStatus, BLACKHOLE_TABLE};
use crate::store::{fields, Filter, Query, RecordStore};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::sync::Arc;

/// Repository for blackhole submissions
pub struct BlackholeRepository {
    store: Arc<dyn RecordStore>,
}

impl BlackholeRepository {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Insert a pending submission with the coin cost snapshot
    pub async fn create(
        &self,
        user_id: &str,
        username: &str,
        project_id: &str,
        coin_cost: i64,
        hours: Decimal,
    ) -> Result<BlackholeSubmission, StoreError> {
        self.store
            .create(
                BLACKHOLE_TABLE,
                fields(json!({
                    "userId": user_id,
                    "username": username,
                    "projectId": project_id,
                    "status": SubmissionStatus::Pending.as_str(),
                    "coinCost": coin_cost,
                    "hours": hours,
                })),
            )
            .await?
            .decode()
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<BlackholeSubmission>, StoreError> {
        self.store
            .find(BLACKHOLE_TABLE, id)
            .await?
            .map(|r| r.decode())
            .transpose()
    }

    pub async fn find_pending(&self) -> Result<Vec<BlackholeSubmission>, StoreError> {
        let records = self
            .store
            .select(
                BLACKHOLE_TABLE,
                &Query::new(Filter::eq("status", SubmissionStatus::Pending.as_str())),
            )
            .await?;
        decode_all(records)
    }

    pub async fn find_pending_for_project(
        &self,
        project_id: &str,
    ) -> Result<Vec<BlackholeSubmission>, StoreError> {
        let filter = Filter::eq("projectId", project_id)
            .and(Filter::eq("status", SubmissionStatus::Pending.as_str()));
        let records = self
            .store
            .select(BLACKHOLE_TABLE, &Query::new(filter))
            .await?;
        decode_all(records)
    }

    /// Record a reviewer's decision
    pub async fn decide(
        &self,
        id: &str,
        status: SubmissionStatus,
        reviewer: &str,
        reason: Option<&str>,
        reviewed_at: DateTime<Utc>,
    ) -> Result<BlackholeSubmission, StoreError> {
        self.store
            .update(
                BLACKHOLE_TABLE,
                id,
                fields(json!({
                    "status": status.as_str(),
                    "reviewer": reviewer,
                    "reason": reason,
                    "reviewedAt": reviewed_at.to_rfc3339(),
                })),
            )
            .await?
            .decode()
    }

    /// Put a decided submission back into the pending queue
    pub async fn reopen(&self, id: &str) -> Result<BlackholeSubmission, StoreError> {
        self.store
            .update(
                BLACKHOLE_TABLE,
                id,
                fields(json!({
                    "status": SubmissionStatus::Pending.as_str(),
                    "reviewer": Value::Null,
                    "reason": Value::Null,
                    "reviewedAt": Value::Null,
                })),
            )
            .await?
            .decode()
    }
}
