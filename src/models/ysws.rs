use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const YSWS_TABLE: &str = "YSWS";

/// "You Ship, We Ship" submission used to record coin payouts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YswsSubmission {
    pub id: String,
    pub created_time: DateTime<Utc>,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub hours_awarded: Option<Decimal>,
    #[serde(default)]
    pub coins_awarded: Option<i64>,
    #[serde(default)]
    pub coin_rate: Option<Decimal>,
}
