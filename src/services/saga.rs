//! Compensating transactions.
//!
//! Workflows that touch several records (debit coins, then create a
//! submission; mark a bet claimed, then credit it) run their writes through a
//! [`Saga`]. Each successful step registers the [`Compensation`] that undoes
//! it; when a later step fails the compensations run newest first. A failed
//! compensation is logged as critical and left for manual repair.

use crate::error::{AppError, AppResult};
use crate::models::{Currency, Project};
use crate::repositories::{
    BetRepository, BlackholeRepository, ProjectRepository, UserRepository, YswsRepository,
};
use crate::services::ledger::CurrencyLedger;
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info};

/// Inverse of a completed write
#[derive(Debug, Clone)]
pub enum Compensation {
    Credit {
        user_id: String,
        currency: Currency,
        amount: i64,
    },
    Debit {
        user_id: String,
        currency: Currency,
        amount: i64,
    },
    RestoreProject(Box<Project>),
    DeleteBet {
        bet_id: String,
    },
    RevertBetClaim {
        bet_id: String,
    },
    DeleteYswsSubmission {
        submission_id: String,
    },
    ReopenBlackholeSubmission {
        submission_id: String,
    },
    RestoreCompletedQuests {
        user_id: String,
        quest_ids: Vec<String>,
    },
}

/// Executes compensations against the repositories
pub struct Compensator {
    ledger: Arc<CurrencyLedger>,
    user_repo: Arc<UserRepository>,
    project_repo: Arc<ProjectRepository>,
    bet_repo: Arc<BetRepository>,
    ysws_repo: Arc<YswsRepository>,
    blackhole_repo: Arc<BlackholeRepository>,
}

impl Compensator {
    pub fn new(
        ledger: Arc<CurrencyLedger>,
        user_repo: Arc<UserRepository>,
        project_repo: Arc<ProjectRepository>,
        bet_repo: Arc<BetRepository>,
        ysws_repo: Arc<YswsRepository>,
        blackhole_repo: Arc<BlackholeRepository>,
    ) -> Self {
        Self {
            ledger,
            user_repo,
            project_repo,
            bet_repo,
            ysws_repo,
            blackhole_repo,
        }
    }

    /// Start a saga named after the workflow it protects
    pub fn begin(&self, name: &'static str) -> Saga<'_> {
        Saga {
            name,
            compensator: self,
            undo: Vec::new(),
        }
    }

    async fn compensate(&self, compensation: &Compensation) -> AppResult<()> {
        match compensation {
            Compensation::Credit {
                user_id,
                currency,
                amount,
            } => {
                self.ledger
                    .credit(user_id, *currency, *amount, "rollback")
                    .await?;
            }
            Compensation::Debit {
                user_id,
                currency,
                amount,
            } => {
                self.ledger
                    .debit(user_id, *currency, *amount, "rollback")
                    .await?;
            }
            Compensation::RestoreProject(project) => {
                self.project_repo.save_review_state(project).await?;
            }
            Compensation::DeleteBet { bet_id } => {
                self.bet_repo.delete(bet_id).await?;
            }
            Compensation::RevertBetClaim { bet_id } => {
                self.bet_repo.revert_claim(bet_id).await?;
            }
            Compensation::DeleteYswsSubmission { submission_id } => {
                self.ysws_repo.delete(submission_id).await?;
            }
            Compensation::ReopenBlackholeSubmission { submission_id } => {
                self.blackhole_repo.reopen(submission_id).await?;
            }
            Compensation::RestoreCompletedQuests { user_id, quest_ids } => {
                self.user_repo
                    .set_completed_quests(user_id, quest_ids)
                    .await?;
            }
        }
        Ok(())
    }
}

/// An in-flight multi-record write
pub struct Saga<'a> {
    name: &'static str,
    compensator: &'a Compensator,
    undo: Vec<Compensation>,
}

impl<'a> Saga<'a> {
    /// Run a step; on success register its compensation, on failure roll back
    pub async fn step<T, E, F>(
        &mut self,
        action: impl Future<Output = Result<T, E>>,
        undo: F,
    ) -> AppResult<T>
    where
        E: Into<AppError>,
        F: FnOnce(&T) -> Compensation,
    {
        match action.await {
            Ok(value) => {
                self.undo.push(undo(&value));
                Ok(value)
            }
            Err(e) => {
                let err = e.into();
                error!("{}: step failed: {}", self.name, err);
                self.unwind().await;
                Err(err)
            }
        }
    }

    /// Run the final step; the saga is complete when it succeeds
    pub async fn finish<T, E>(mut self, action: impl Future<Output = Result<T, E>>) -> AppResult<T>
    where
        E: Into<AppError>,
    {
        match action.await {
            Ok(value) => Ok(value),
            Err(e) => {
                let err = e.into();
                error!("{}: final step failed: {}", self.name, err);
                self.unwind().await;
                Err(err)
            }
        }
    }

    async fn unwind(&mut self) {
        while let Some(compensation) = self.undo.pop() {
            match self.compensator.compensate(&compensation).await {
                Ok(()) => info!("{}: compensated {:?}", self.name, compensation),
                Err(e) => {
                    error!(
                        "CRITICAL: {}: compensation {:?} failed, manual repair needed: {}",
                        self.name, compensation, e
                    );
                }
            }
        }
    }
}
