use super::decode_first;
use crate::error::StoreError;
use crate::models::codec::json_list;
use crate::models::{Currency, User, UserRole, USERS_TABLE};
use crate::store::{fields, Filter, Query, RecordStore};
use serde_json::json;
use std::sync::Arc;

/// Repository for user records
pub struct UserRepository {
    store: Arc<dyn RecordStore>,
}

impl UserRepository {
    /// Create a new UserRepository
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Insert a new user with empty balances
    pub async fn create(
        &self,
        username: &str,
        email: Option<&str>,
        role: UserRole,
    ) -> Result<User, StoreError> {
        let record = self
            .store
            .create(
                USERS_TABLE,
                fields(json!({
                    "username": username,
                    "email": email,
                    "role": role.as_str(),
                    "coins": 0,
                    "stellarships": 0,
                    "paintchips": 0,
                    "devlogStreak": 0,
                    "maxDevlogStreak": 0,
                    "completedQuests": "[]",
                })),
            )
            .await?;
        record.decode()
    }

    /// Find a user by record id
    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        self.store
            .find(USERS_TABLE, id)
            .await?
            .map(|r| r.decode())
            .transpose()
    }

    /// Find a user by username
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let records = self
            .store
            .select(USERS_TABLE, &Query::new(Filter::eq("username", username)).limit(1))
            .await?;
        decode_first(records)
    }

    /// Overwrite one currency balance
    pub async fn set_balance(
        &self,
        id: &str,
        currency: Currency,
        balance: i64,
    ) -> Result<User, StoreError> {
        let mut patch = crate::store::Fields::new();
        patch.insert(currency.as_str().to_string(), json!(balance));
        self.store.update(USERS_TABLE, id, patch).await?.decode()
    }

    /// Store recomputed devlog streak markers
    pub async fn set_streaks(&self, id: &str, current: u32, max: u32) -> Result<User, StoreError> {
        self.store
            .update(
                USERS_TABLE,
                id,
                fields(json!({ "devlogStreak": current, "maxDevlogStreak": max })),
            )
            .await?
            .decode()
    }

    /// Replace the list of claimed quest ids
    pub async fn set_completed_quests(
        &self,
        id: &str,
        quest_ids: &[String],
    ) -> Result<User, StoreError> {
        self.store
            .update(
                USERS_TABLE,
                id,
                fields(json!({ "completedQuests": json_list::encode(quest_ids) })),
            )
            .await?
            .decode()
    }
}
