//! Currency credits and debits against user records.
//!
//! The store has no transactions, so each operation is a read-modify-write
//! of one balance field. Transient store failures are retried a fixed number
//! of times; this does not protect against concurrent double-spend.

use crate::error::{AppError, AppResult};
use crate::models::{Currency, User};
use crate::repositories::UserRepository;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Attempts per balance update
pub const MAX_ATTEMPTS: u32 = 3;

/// Base delay between attempts, multiplied by the attempt number
pub const RETRY_BACKOFF: Duration = Duration::from_millis(100);

/// Run `op` until it succeeds, fails permanently, or runs out of attempts
pub async fn with_retry<T, F, Fut>(label: &str, mut op: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < MAX_ATTEMPTS => {
                warn!("{} failed (attempt {}/{}): {}", label, attempt, MAX_ATTEMPTS, e);
                tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Applies balance changes to the three user currencies
pub struct CurrencyLedger {
    user_repo: Arc<UserRepository>,
}

impl CurrencyLedger {
    pub fn new(user_repo: Arc<UserRepository>) -> Self {
        Self { user_repo }
    }

    /// Add `amount` to a balance
    pub async fn credit(
        &self,
        user_id: &str,
        currency: Currency,
        amount: i64,
        reason: &str,
    ) -> AppResult<User> {
        if amount <= 0 {
            return Err(AppError::Validation("Credit amount must be positive".into()));
        }
        let user = with_retry("credit", move || self.apply(user_id, currency, amount)).await?;
        info!(
            "Credited {} {} to {} ({}), balance now {}",
            amount,
            currency.as_str(),
            user_id,
            reason,
            user.balance(currency)
        );
        Ok(user)
    }

    /// Remove `amount` from a balance; fails rather than going negative
    pub async fn debit(
        &self,
        user_id: &str,
        currency: Currency,
        amount: i64,
        reason: &str,
    ) -> AppResult<User> {
        if amount <= 0 {
            return Err(AppError::Validation("Debit amount must be positive".into()));
        }
        let user = with_retry("debit", move || self.apply(user_id, currency, -amount)).await?;
        info!(
            "Debited {} {} from {} ({}), balance now {}",
            amount,
            currency.as_str(),
            user_id,
            reason,
            user.balance(currency)
        );
        Ok(user)
    }

    async fn apply(&self, user_id: &str, currency: Currency, delta: i64) -> AppResult<User> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        let available = user.balance(currency);
        let balance = available + delta;
        if balance < 0 {
            return Err(AppError::InsufficientFunds {
                currency: currency.as_str(),
                required: -delta,
                available,
            });
        }

        Ok(self.user_repo.set_balance(user_id, currency, balance).await?)
    }
}
