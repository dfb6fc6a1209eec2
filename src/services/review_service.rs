use crate::config::RewardPolicy;
use crate::error::{AppError, AppResult};
use crate::models::{BasicVote, Currency, Project, ProjectStatus, SecondDecision};
use crate::repositories::{ProjectRepository, YswsRepository};
use crate::services::ledger::CurrencyLedger;
use crate::services::saga::{Compensation, Compensator};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Where a project's basic review tallies point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasicVerdict {
    /// Not enough agreement yet
    Pending,
    /// Enough doubt to escalate to the second review queue
    Escalate,
    /// Award at the top rate
    AwardTop,
    /// Award at the standard rate
    AwardStandard,
}

/// Apply the review thresholds to a set of tallies.
///
/// Escalation wins over awards; a top award needs `threshold` crazygood
/// votes, a standard award `threshold` crazygood and good votes combined.
pub fn tally_verdict(
    crazygood: u32,
    good: u32,
    unsure: u32,
    nothours: u32,
    threshold: u32,
) -> BasicVerdict {
    if unsure + nothours >= threshold {
        BasicVerdict::Escalate
    } else if crazygood >= threshold {
        BasicVerdict::AwardTop
    } else if crazygood + good >= threshold {
        BasicVerdict::AwardStandard
    } else {
        BasicVerdict::Pending
    }
}

/// Coins for `hours` at `rate` coins per hour, rounded half away from zero
pub fn award_coins(hours: Decimal, rate: Decimal) -> i64 {
    (hours * rate)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(0)
}

/// Result of a review action
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum ReviewOutcome {
    Pending,
    Escalated,
    Awarded { coins: i64, rate: Decimal },
    ReturnedToWip,
}

#[derive(Debug, Clone)]
pub struct ReviewResult {
    pub project: Project,
    pub outcome: ReviewOutcome,
}

/// Basic and second stage review of submitted projects
pub struct ReviewService {
    project_repo: Arc<ProjectRepository>,
    ysws_repo: Arc<YswsRepository>,
    ledger: Arc<CurrencyLedger>,
    compensator: Arc<Compensator>,
    policy: RewardPolicy,
}

impl ReviewService {
    pub fn new(
        project_repo: Arc<ProjectRepository>,
        ysws_repo: Arc<YswsRepository>,
        ledger: Arc<CurrencyLedger>,
        compensator: Arc<Compensator>,
        policy: RewardPolicy,
    ) -> Self {
        Self {
            project_repo,
            ysws_repo,
            ledger,
            compensator,
            policy,
        }
    }

    async fn load_project(&self, project_id: &str) -> AppResult<Project> {
        self.project_repo
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Project not found".into()))
    }

    /// Projects waiting for a basic vote that `reviewer_id` can still cast
    pub async fn basic_queue(&self, reviewer_id: &str) -> AppResult<Vec<Project>> {
        Ok(self.project_repo.find_review_queue(reviewer_id).await?)
    }

    /// Projects escalated to the second review queue
    pub async fn second_queue(&self) -> AppResult<Vec<Project>> {
        Ok(self.project_repo.find_by_status(ProjectStatus::Second).await?)
    }

    /// Cast a basic review vote
    pub async fn submit_basic_vote(
        &self,
        project_id: &str,
        reviewer_id: &str,
        vote: BasicVote,
    ) -> AppResult<ReviewResult> {
        let project = self.load_project(project_id).await?;

        if project.status != ProjectStatus::Submitted {
            return Err(AppError::Conflict("Project is not awaiting review".into()));
        }
        if project.has_reviewed(reviewer_id) {
            return Err(AppError::Conflict(
                "You have already reviewed this project".into(),
            ));
        }
        if !project.awaiting_review {
            return Err(AppError::Conflict(
                "Project is not available for review".into(),
            ));
        }
        if project.is_owned_by(reviewer_id) {
            return Err(AppError::Forbidden("You cannot review your own project".into()));
        }

        let mut updated = project.clone();
        match vote {
            BasicVote::Crazygood => updated.crazygood += 1,
            BasicVote::Good => updated.good += 1,
            BasicVote::Unsure => updated.unsure += 1,
            BasicVote::Nothours => updated.nothours += 1,
        }
        updated.reviewers.push(reviewer_id.to_string());

        let verdict = tally_verdict(
            updated.crazygood,
            updated.good,
            updated.unsure,
            updated.nothours,
            self.policy.review_vote_threshold,
        );

        info!(
            "Basic vote on {} by {}: {} (now {}) -> {:?}",
            project_id,
            reviewer_id,
            vote.as_str(),
            updated.tally(vote),
            verdict
        );

        match verdict {
            BasicVerdict::Pending => {
                let project = self.project_repo.save_review_state(&updated).await?;
                Ok(ReviewResult {
                    project,
                    outcome: ReviewOutcome::Pending,
                })
            }
            BasicVerdict::Escalate => {
                updated.status = ProjectStatus::Second;
                updated.awaiting_review = false;
                let project = self.project_repo.save_review_state(&updated).await?;
                Ok(ReviewResult {
                    project,
                    outcome: ReviewOutcome::Escalated,
                })
            }
            BasicVerdict::AwardTop => {
                let rate = self.policy.review_top_rate;
                self.award(&project, updated, rate, "award10").await
            }
            BasicVerdict::AwardStandard => {
                let rate = self.policy.review_standard_rate;
                self.award(&project, updated, rate, "award9").await
            }
        }
    }

    /// Decide a project in the second review queue. Only one decision is
    /// ever recorded per review round.
    pub async fn submit_second_decision(
        &self,
        project_id: &str,
        reviewer_id: &str,
        decision: SecondDecision,
    ) -> AppResult<ReviewResult> {
        let project = self.load_project(project_id).await?;

        if project.status != ProjectStatus::Second {
            return Err(AppError::Conflict(
                "Project is not in the second review queue".into(),
            ));
        }
        if project.second_reviewer.is_some() {
            return Err(AppError::Conflict(
                "A second review decision has already been made".into(),
            ));
        }
        if project.is_owned_by(reviewer_id) {
            return Err(AppError::Forbidden("You cannot review your own project".into()));
        }

        let mut updated = project.clone();
        updated.second_reviewer = Some(reviewer_id.to_string());
        updated.second_decision = Some(decision);

        info!(
            "Second decision on {} by {}: {}",
            project_id,
            reviewer_id,
            decision.as_str()
        );

        match decision {
            SecondDecision::BackToWip => {
                updated.status = ProjectStatus::Wip;
                updated.crazygood = 0;
                updated.good = 0;
                updated.unsure = 0;
                updated.nothours = 0;
                updated.reviewers.clear();
                updated.awaiting_review = false;
                updated.review_outcome = Some(decision.as_str().to_string());

                let project = self.project_repo.save_review_state(&updated).await?;
                Ok(ReviewResult {
                    project,
                    outcome: ReviewOutcome::ReturnedToWip,
                })
            }
            SecondDecision::Award10 => {
                updated.status = ProjectStatus::Submitted;
                let rate = self.policy.review_top_rate;
                self.award(&project, updated, rate, decision.as_str()).await
            }
            SecondDecision::Award9 => {
                updated.status = ProjectStatus::Submitted;
                let rate = self.policy.review_standard_rate;
                self.award(&project, updated, rate, decision.as_str()).await
            }
        }
    }

    /// Pay the owner for the project's hours and record the payout.
    ///
    /// `snapshot` is the project as loaded, restored if a later write fails.
    async fn award(
        &self,
        snapshot: &Project,
        mut updated: Project,
        rate: Decimal,
        label: &str,
    ) -> AppResult<ReviewResult> {
        let submission_id = snapshot.ysws_submission_id.clone().ok_or_else(|| {
            AppError::Message(format!(
                "Project {} has no linked YSWS submission",
                snapshot.id
            ))
        })?;
        if self.ysws_repo.find_by_id(&submission_id).await?.is_none() {
            return Err(AppError::Message(format!(
                "YSWS submission {} linked from project {} does not exist",
                submission_id, snapshot.id
            )));
        }

        let hours = updated.total_hours();
        let coins = award_coins(hours, rate);

        updated.awaiting_review = false;
        updated.coins_awarded = Some(coins);
        updated.review_outcome = Some(label.to_string());

        let mut saga = self.compensator.begin("review_award");

        let project = saga
            .step(self.project_repo.save_review_state(&updated), |_| {
                Compensation::RestoreProject(Box::new(snapshot.clone()))
            })
            .await?;

        if coins > 0 {
            saga.step(
                self.ledger
                    .credit(&project.owner_id, Currency::Coins, coins, "project award"),
                |_| Compensation::Debit {
                    user_id: project.owner_id.clone(),
                    currency: Currency::Coins,
                    amount: coins,
                },
            )
            .await?;
        } else {
            warn!("Project {} awarded with no hours logged", project.id);
        }

        saga.finish(self.ysws_repo.record_payout(&submission_id, hours, coins, rate))
            .await?;

        info!(
            "Awarded {} coins for project {} ({}h at {}/h)",
            coins, project.id, hours, rate
        );

        Ok(ReviewResult {
            project,
            outcome: ReviewOutcome::Awarded { coins, rate },
        })
    }
}
