use crate::config::RewardPolicy;
use crate::error::{AppError, AppResult};
use crate::models::{BlackholeSubmission, Currency, SubmissionStatus};
use crate::repositories::{BlackholeRepository, ProjectRepository, UserRepository};
use crate::services::ledger::CurrencyLedger;
use crate::services::saga::{Compensation, Compensator};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

/// Blackhole submissions: pay coins to submit a project, one reviewer decides
pub struct BlackholeService {
    user_repo: Arc<UserRepository>,
    project_repo: Arc<ProjectRepository>,
    blackhole_repo: Arc<BlackholeRepository>,
    ledger: Arc<CurrencyLedger>,
    compensator: Arc<Compensator>,
    policy: RewardPolicy,
}

impl BlackholeService {
    pub fn new(
        user_repo: Arc<UserRepository>,
        project_repo: Arc<ProjectRepository>,
        blackhole_repo: Arc<BlackholeRepository>,
        ledger: Arc<CurrencyLedger>,
        compensator: Arc<Compensator>,
        policy: RewardPolicy,
    ) -> Self {
        Self {
            user_repo,
            project_repo,
            blackhole_repo,
            ledger,
            compensator,
            policy,
        }
    }

    /// Charge the submission cost and queue the project for review.
    ///
    /// If the submission cannot be stored after the debit, the coins are
    /// credited back.
    pub async fn submit_to_blackhole(
        &self,
        username: &str,
        project_id: &str,
    ) -> AppResult<BlackholeSubmission> {
        let user = self
            .user_repo
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        let cost = self.policy.blackhole_cost;
        if user.coins < cost {
            return Err(AppError::InsufficientFunds {
                currency: Currency::Coins.as_str(),
                required: cost,
                available: user.coins,
            });
        }

        let project = self
            .project_repo
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Project not found".into()))?;

        if !project.is_owned_by(&user.id) {
            return Err(AppError::Forbidden("You do not own this project".into()));
        }

        let hours = project.total_hours();
        if hours < self.policy.blackhole_min_hours {
            return Err(AppError::Validation(format!(
                "Project needs at least {} hours, has {}",
                self.policy.blackhole_min_hours, hours
            )));
        }

        if !self
            .blackhole_repo
            .find_pending_for_project(project_id)
            .await?
            .is_empty()
        {
            return Err(AppError::Conflict(
                "Project already has a pending blackhole submission".into(),
            ));
        }

        let mut saga = self.compensator.begin("blackhole_submit");
        if cost > 0 {
            saga.step(
                self.ledger
                    .debit(&user.id, Currency::Coins, cost, "blackhole submission"),
                |_| Compensation::Credit {
                    user_id: user.id.clone(),
                    currency: Currency::Coins,
                    amount: cost,
                },
            )
            .await?;
        }

        let submission = saga
            .finish(
                self.blackhole_repo
                    .create(&user.id, &user.username, project_id, cost, hours),
            )
            .await?;

        info!(
            "Blackhole submission {} by {} for project {} ({} coins)",
            submission.id, user.username, project_id, cost
        );
        Ok(submission)
    }

    pub async fn pending(&self) -> AppResult<Vec<BlackholeSubmission>> {
        Ok(self.blackhole_repo.find_pending().await?)
    }

    /// Approve a pending submission and reward the submitter
    pub async fn approve_blackhole_submission(
        &self,
        submission_id: &str,
        reviewer: &str,
    ) -> AppResult<BlackholeSubmission> {
        let submission = self
            .load_for_decision(submission_id, reviewer, SubmissionStatus::Approved)
            .await?;
        if submission.status == SubmissionStatus::Approved {
            return Ok(submission);
        }

        let reward = self.policy.blackhole_stellarship_reward;
        let mut saga = self.compensator.begin("blackhole_approve");
        let decided = saga
            .step(
                self.blackhole_repo.decide(
                    submission_id,
                    SubmissionStatus::Approved,
                    reviewer,
                    None,
                    Utc::now(),
                ),
                |s| Compensation::ReopenBlackholeSubmission {
                    submission_id: s.id.clone(),
                },
            )
            .await?;

        if reward > 0 {
            saga.finish(self.ledger.credit(
                &decided.user_id,
                Currency::Stellarships,
                reward,
                "blackhole approval",
            ))
            .await?;
        }

        info!(
            "Blackhole submission {} approved by {}",
            submission_id, reviewer
        );
        Ok(decided)
    }

    /// Reject a pending submission. The coin cost is not refunded.
    pub async fn reject_blackhole_submission(
        &self,
        submission_id: &str,
        reviewer: &str,
        reason: Option<&str>,
    ) -> AppResult<BlackholeSubmission> {
        let submission = self
            .load_for_decision(submission_id, reviewer, SubmissionStatus::Rejected)
            .await?;
        if submission.status == SubmissionStatus::Rejected {
            return Ok(submission);
        }

        let reason = reason.map(str::trim).filter(|r| !r.is_empty());
        let decided = self
            .blackhole_repo
            .decide(
                submission_id,
                SubmissionStatus::Rejected,
                reviewer,
                reason,
                Utc::now(),
            )
            .await?;

        info!(
            "Blackhole submission {} rejected by {}",
            submission_id, reviewer
        );
        Ok(decided)
    }

    /// Load a submission and check it can take `target`. Returns the record
    /// unchanged when it already carries `target`.
    async fn load_for_decision(
        &self,
        submission_id: &str,
        reviewer: &str,
        target: SubmissionStatus,
    ) -> AppResult<BlackholeSubmission> {
        if reviewer.trim().is_empty() {
            return Err(AppError::Unauthorized("Reviewer identity is required".into()));
        }

        let submission = self
            .blackhole_repo
            .find_by_id(submission_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Submission not found".into()))?;

        if submission.status == SubmissionStatus::Pending || submission.status == target {
            if submission.status == target {
                warn!(
                    "Blackhole submission {} already {}, ignoring repeat decision",
                    submission_id,
                    target.as_str()
                );
            }
            return Ok(submission);
        }

        Err(AppError::Conflict(format!(
            "Submission already {}",
            submission.status.as_str()
        )))
    }
}
