use super::codec::comma_list;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const PROJECTS_TABLE: &str = "Projects";

/// Project status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Wip,
    Submitted,
    Second,
    /// Any status this service does not drive (set by hand in the store)
    #[serde(other)]
    Other,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Wip => "wip",
            ProjectStatus::Submitted => "submitted",
            ProjectStatus::Second => "second",
            ProjectStatus::Other => "other",
        }
    }
}

/// A basic reviewer's verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BasicVote {
    Crazygood,
    Good,
    Unsure,
    Nothours,
}

impl BasicVote {
    /// Tally field on the project record
    pub fn as_str(&self) -> &'static str {
        match self {
            BasicVote::Crazygood => "crazygood",
            BasicVote::Good => "good",
            BasicVote::Unsure => "unsure",
            BasicVote::Nothours => "nothours",
        }
    }
}

/// Decision taken on a project escalated to the second review queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecondDecision {
    #[serde(rename = "award10")]
    Award10,
    #[serde(rename = "award9")]
    Award9,
    #[serde(rename = "backToWip")]
    BackToWip,
}

impl SecondDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecondDecision::Award10 => "award10",
            SecondDecision::Award9 => "award9",
            SecondDecision::BackToWip => "backToWip",
        }
    }
}

/// Project record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub created_time: DateTime<Utc>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub owner_id: String,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub crazygood: u32,
    #[serde(default)]
    pub good: u32,
    #[serde(default)]
    pub unsure: u32,
    #[serde(default)]
    pub nothours: u32,
    #[serde(default, with = "comma_list")]
    pub reviewers: Vec<String>,
    #[serde(default)]
    pub awaiting_review: bool,
    #[serde(default)]
    pub second_reviewer: Option<String>,
    #[serde(default)]
    pub second_decision: Option<SecondDecision>,
    #[serde(default)]
    pub ysws_submission_id: Option<String>,
    #[serde(default)]
    pub hackatime_hours: Decimal,
    #[serde(default)]
    pub art_hours: Decimal,
    #[serde(default)]
    pub coins_awarded: Option<i64>,
    #[serde(default)]
    pub review_outcome: Option<String>,
}

impl Project {
    /// Hours that count towards rewards and thresholds
    pub fn total_hours(&self) -> Decimal {
        self.hackatime_hours + self.art_hours
    }

    pub fn tally(&self, vote: BasicVote) -> u32 {
        match vote {
            BasicVote::Crazygood => self.crazygood,
            BasicVote::Good => self.good,
            BasicVote::Unsure => self.unsure,
            BasicVote::Nothours => self.nothours,
        }
    }

    pub fn has_reviewed(&self, reviewer_id: &str) -> bool {
        self.reviewers.iter().any(|r| r == reviewer_id)
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }
}
