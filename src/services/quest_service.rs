//! Quest progress and claims, driven by the derived devlog stats.

use crate::error::{AppError, AppResult};
use crate::hackatime::HoursProvider;
use crate::models::quest::{catalog, find_quest};
use crate::models::{Devlog, ProjectStatus, Quest, QuestRequirement, QuestReward, User};
use crate::repositories::{DevlogRepository, ProjectRepository, UserRepository};
use crate::services::ledger::CurrencyLedger;
use crate::services::saga::{Compensation, Compensator};
use crate::services::stats::{compute_stats, DevlogStats};
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::{info, warn};

/// Progress towards one quest
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestProgress {
    pub quest: Quest,
    /// Progress counting every devlog, shown to the user
    pub visual: Decimal,
    /// Progress counting approved devlogs only, used to unlock the quest
    pub approved: Decimal,
    pub target: Decimal,
    pub completed: bool,
    pub claimed: bool,
}

/// Stats plus tracked hours for one user
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    #[serde(flatten)]
    pub devlogs: DevlogStats,
    pub tracked_hours: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QuestClaim {
    Claimed { reward: QuestReward },
    AlreadyClaimed,
}

fn measure(requirement: QuestRequirement, stats: &UserStats) -> (Decimal, Decimal, Decimal) {
    let d = &stats.devlogs;
    match requirement {
        QuestRequirement::ApprovedDevlogs(n) => (
            Decimal::from(d.total_devlogs),
            Decimal::from(d.approved_devlogs),
            Decimal::from(n),
        ),
        // Streak markers only ever count approved devlogs
        QuestRequirement::MaxStreak(n) => (
            Decimal::from(d.max_streak),
            Decimal::from(d.max_streak),
            Decimal::from(n),
        ),
        QuestRequirement::ApprovedHours(h) => (d.total_hours, d.approved_hours, h),
        QuestRequirement::ApprovedArtHours(h) => (d.total_art_hours, d.approved_art_hours, h),
        QuestRequirement::TrackedHours(h) => (stats.tracked_hours, stats.tracked_hours, h),
    }
}

/// Evaluate one quest against a user's stats
pub fn progress_for(quest: Quest, stats: &UserStats, user: &User) -> QuestProgress {
    let (visual, approved, target) = measure(quest.requirement, stats);
    QuestProgress {
        claimed: user.has_completed(quest.id),
        completed: approved >= target,
        quest,
        visual,
        approved,
        target,
    }
}

pub struct QuestService {
    user_repo: Arc<UserRepository>,
    devlog_repo: Arc<DevlogRepository>,
    project_repo: Arc<ProjectRepository>,
    ledger: Arc<CurrencyLedger>,
    compensator: Arc<Compensator>,
    hours: Arc<dyn HoursProvider>,
}

impl QuestService {
    pub fn new(
        user_repo: Arc<UserRepository>,
        devlog_repo: Arc<DevlogRepository>,
        project_repo: Arc<ProjectRepository>,
        ledger: Arc<CurrencyLedger>,
        compensator: Arc<Compensator>,
        hours: Arc<dyn HoursProvider>,
    ) -> Self {
        Self {
            user_repo,
            devlog_repo,
            project_repo,
            ledger,
            compensator,
            hours,
        }
    }

    async fn load_user(&self, user_id: &str) -> AppResult<User> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    /// Ids of linked projects that are currently submitted
    async fn submitted_project_ids(&self, devlogs: &[Devlog]) -> AppResult<HashSet<String>> {
        let linked: BTreeSet<&str> = devlogs
            .iter()
            .flat_map(|d| d.project_ids.iter().map(String::as_str))
            .collect();

        let projects =
            try_join_all(linked.into_iter().map(|id| self.project_repo.find_by_id(id))).await?;

        Ok(projects
            .into_iter()
            .flatten()
            .filter(|p| p.status == ProjectStatus::Submitted)
            .map(|p| p.id)
            .collect())
    }

    pub async fn devlog_stats(&self, user_id: &str, now: DateTime<Utc>) -> AppResult<DevlogStats> {
        let devlogs = self.devlog_repo.find_by_user(user_id).await?;
        let submitted = self.submitted_project_ids(&devlogs).await?;
        Ok(compute_stats(&devlogs, &submitted, now.date_naive()))
    }

    async fn tracked_hours(&self, user: &User, now: DateTime<Utc>) -> Decimal {
        let Some(email) = user.email.as_deref() else {
            return Decimal::ZERO;
        };
        match self.hours.hours_between(email, user.created_time, now).await {
            Ok(hours) => hours,
            Err(e) => {
                warn!("Tracked hours unavailable for {}: {}", user.id, e);
                Decimal::ZERO
            }
        }
    }

    pub async fn stats_for(&self, user: &User, now: DateTime<Utc>) -> AppResult<UserStats> {
        let devlogs = self.devlog_stats(&user.id, now).await?;
        let tracked_hours = self.tracked_hours(user, now).await;
        Ok(UserStats {
            devlogs,
            tracked_hours,
        })
    }

    /// Recompute and store the user's streak markers
    pub async fn refresh_streaks(&self, user_id: &str, now: DateTime<Utc>) -> AppResult<User> {
        let stats = self.devlog_stats(user_id, now).await?;
        Ok(self
            .user_repo
            .set_streaks(user_id, stats.current_streak, stats.max_streak)
            .await?)
    }

    /// Progress on every quest in the catalog
    pub async fn progress(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<QuestProgress>> {
        let user = self.load_user(user_id).await?;
        let stats = self.stats_for(&user, now).await?;
        Ok(catalog()
            .into_iter()
            .map(|quest| progress_for(quest, &stats, &user))
            .collect())
    }

    /// Claim a completed quest's reward. Claiming twice pays once.
    pub async fn claim_quest(
        &self,
        user_id: &str,
        quest_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<QuestClaim> {
        let quest = find_quest(quest_id)
            .ok_or_else(|| AppError::NotFound(format!("Unknown quest: {}", quest_id)))?;
        let user = self.load_user(user_id).await?;

        if user.has_completed(quest.id) {
            info!("Quest {} already claimed by {}", quest.id, user_id);
            return Ok(QuestClaim::AlreadyClaimed);
        }

        let stats = self.stats_for(&user, now).await?;
        let progress = progress_for(quest.clone(), &stats, &user);
        if !progress.completed {
            return Err(AppError::Validation(format!(
                "Quest not complete: {} of {}",
                progress.approved, progress.target
            )));
        }

        let previous = user.completed_quests.clone();
        let mut completed = previous.clone();
        completed.push(quest.id.to_string());

        let mut saga = self.compensator.begin("claim_quest");
        saga.step(
            self.user_repo.set_completed_quests(user_id, &completed),
            |_| Compensation::RestoreCompletedQuests {
                user_id: user_id.to_string(),
                quest_ids: previous,
            },
        )
        .await?;

        let reward = quest.reward;
        saga.finish(
            self.ledger
                .credit(user_id, reward.currency, reward.amount, "quest reward"),
        )
        .await?;

        info!(
            "Quest {} claimed by {}: {} {}",
            quest.id,
            user_id,
            reward.amount,
            reward.currency.as_str()
        );
        Ok(QuestClaim::Claimed { reward })
    }
}
