use super::codec::comma_list;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const DEVLOGS_TABLE: &str = "Devlogs";

/// Devlog record. The record creation time is the devlog's timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Devlog {
    pub id: String,
    pub created_time: DateTime<Utc>,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub hours: Decimal,
    #[serde(default)]
    pub code_hours: Decimal,
    #[serde(default)]
    pub art_hours: Decimal,
    #[serde(default)]
    pub pending_code_hours: Decimal,
    #[serde(default)]
    pub pending_art_hours: Decimal,
    // No referential integrity: ids may point at deleted projects
    #[serde(default, with = "comma_list")]
    pub project_ids: Vec<String>,
}

impl Devlog {
    /// Logged hours, falling back to the code/art split for older records
    pub fn logged_hours(&self) -> Decimal {
        if self.hours > Decimal::ZERO {
            self.hours
        } else {
            self.code_hours + self.art_hours
        }
    }
}
