use super::codec::json_list;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const USERS_TABLE: &str = "Users";

/// Platform role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Reviewer,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Reviewer => "reviewer",
            UserRole::Admin => "admin",
        }
    }
}

/// The three independent per-user currencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    Coins,
    Stellarships,
    Paintchips,
}

impl Currency {
    /// Field name of the balance on the user record
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Coins => "coins",
            Currency::Stellarships => "stellarships",
            Currency::Paintchips => "paintchips",
        }
    }
}

/// User record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub created_time: DateTime<Utc>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub coins: i64,
    #[serde(default)]
    pub stellarships: i64,
    #[serde(default)]
    pub paintchips: i64,
    #[serde(default)]
    pub devlog_streak: u32,
    #[serde(default)]
    pub max_devlog_streak: u32,
    #[serde(default, with = "json_list")]
    pub completed_quests: Vec<String>,
}

impl User {
    /// Current balance of a currency
    pub fn balance(&self, currency: Currency) -> i64 {
        match currency {
            Currency::Coins => self.coins,
            Currency::Stellarships => self.stellarships,
            Currency::Paintchips => self.paintchips,
        }
    }

    pub fn is_reviewer(&self) -> bool {
        matches!(self.role, UserRole::Reviewer | UserRole::Admin)
    }

    pub fn has_completed(&self, quest_id: &str) -> bool {
        self.completed_quests.iter().any(|q| q == quest_id)
    }
}
