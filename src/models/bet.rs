use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

pub const BETS_TABLE: &str = "Bets";

/// Bet status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetStatus {
    Active,
    Won,
    Lost,
    Claimed,
    Expired,
}

impl BetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BetStatus::Active => "active",
            BetStatus::Won => "won",
            BetStatus::Lost => "lost",
            BetStatus::Claimed => "claimed",
            BetStatus::Expired => "expired",
        }
    }

    /// No further transitions happen from these
    pub fn is_terminal(&self) -> bool {
        matches!(self, BetStatus::Lost | BetStatus::Claimed | BetStatus::Expired)
    }
}

/// Bet record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bet {
    pub id: String,
    pub created_time: DateTime<Utc>,
    #[serde(default)]
    pub user_id: String,
    pub status: BetStatus,
    pub amount: i64,
    pub hours_goal: Decimal,
    pub multiplier: Decimal,
    pub start_date: DateTime<Utc>,
    /// Claimable from
    pub end_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    #[serde(default)]
    pub coins_earned: Option<i64>,
    #[serde(default)]
    pub claimed_at: Option<DateTime<Utc>>,
}

impl Bet {
    /// Coins paid out for a won bet: `round(amount * multiplier)`
    pub fn payout(&self) -> i64 {
        (Decimal::from(self.amount) * self.multiplier)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .unwrap_or(0)
    }
}
