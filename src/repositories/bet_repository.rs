use super::decode_all;
use crate::error::StoreError;
use crate::models::{Bet, BetStatus, BETS_TABLE};
use crate::store::{fields, Filter, Query, RecordStore};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::sync::Arc;

/// Terms of a bet being placed
#[derive(Debug, Clone)]
pub struct NewBet<'a> {
    pub user_id: &'a str,
    pub amount: i64,
    pub hours_goal: Decimal,
    pub multiplier: Decimal,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
}

/// Repository for bet records
pub struct BetRepository {
    store: Arc<dyn RecordStore>,
}

impl BetRepository {
    /// Create a new BetRepository
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Insert a new active bet
    pub async fn create(&self, bet: NewBet<'_>) -> Result<Bet, StoreError> {
        self.store
            .create(
                BETS_TABLE,
                fields(json!({
                    "userId": bet.user_id,
                    "status": BetStatus::Active.as_str(),
                    "amount": bet.amount,
                    "hoursGoal": bet.hours_goal,
                    "multiplier": bet.multiplier,
                    "startDate": bet.start_date.to_rfc3339(),
                    "endDate": bet.end_date.to_rfc3339(),
                    "expiryDate": bet.expiry_date.to_rfc3339(),
                })),
            )
            .await?
            .decode()
    }

    /// Find a bet by record id
    pub async fn find_by_id(&self, id: &str) -> Result<Option<Bet>, StoreError> {
        self.store
            .find(BETS_TABLE, id)
            .await?
            .map(|r| r.decode())
            .transpose()
    }

    /// Find all bets for a user
    pub async fn find_by_user(&self, user_id: &str) -> Result<Vec<Bet>, StoreError> {
        let records = self
            .store
            .select(BETS_TABLE, &Query::new(Filter::eq("userId", user_id)))
            .await?;
        decode_all(records)
    }

    pub async fn update_status(&self, id: &str, status: BetStatus) -> Result<Bet, StoreError> {
        self.store
            .update(BETS_TABLE, id, fields(json!({ "status": status.as_str() })))
            .await?
            .decode()
    }

    pub async fn mark_claimed(
        &self,
        id: &str,
        coins_earned: i64,
        claimed_at: DateTime<Utc>,
    ) -> Result<Bet, StoreError> {
        self.store
            .update(
                BETS_TABLE,
                id,
                fields(json!({
                    "status": BetStatus::Claimed.as_str(),
                    "coinsEarned": coins_earned,
                    "claimedAt": claimed_at.to_rfc3339(),
                })),
            )
            .await?
            .decode()
    }

    /// Undo `mark_claimed`, leaving the bet claimable again
    pub async fn revert_claim(&self, id: &str) -> Result<Bet, StoreError> {
        self.store
            .update(
                BETS_TABLE,
                id,
                fields(json!({
                    "status": BetStatus::Won.as_str(),
                    "coinsEarned": Value::Null,
                    "claimedAt": Value::Null,
                })),
            )
            .await?
            .decode()
    }

    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.store.destroy(BETS_TABLE, id).await
    }
}
