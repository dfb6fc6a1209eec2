use super::decode_all;
use crate::error::StoreError;
use crate::models::codec::comma_list;
use crate::models::{Project, ProjectStatus, PROJECTS_TABLE};
use crate::store::{fields, Filter, Query, RecordStore};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::sync::Arc;

/// Repository for project records
pub struct ProjectRepository {
    store: Arc<dyn RecordStore>,
}

impl ProjectRepository {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Insert a new work-in-progress project
    pub async fn create(
        &self,
        owner_id: &str,
        name: &str,
        hackatime_hours: Decimal,
        art_hours: Decimal,
    ) -> Result<Project, StoreError> {
        self.store
            .create(
                PROJECTS_TABLE,
                fields(json!({
                    "name": name,
                    "ownerId": owner_id,
                    "status": ProjectStatus::Wip.as_str(),
                    "hackatimeHours": hackatime_hours,
                    "artHours": art_hours,
                    "crazygood": 0,
                    "good": 0,
                    "unsure": 0,
                    "nothours": 0,
                })),
            )
            .await?
            .decode()
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Project>, StoreError> {
        self.store
            .find(PROJECTS_TABLE, id)
            .await?
            .map(|r| r.decode())
            .transpose()
    }

    pub async fn find_by_status(&self, status: ProjectStatus) -> Result<Vec<Project>, StoreError> {
        let records = self
            .store
            .select(PROJECTS_TABLE, &Query::new(Filter::eq("status", status.as_str())))
            .await?;
        decode_all(records)
    }

    /// Submitted projects awaiting a basic review that `reviewer_id` may vote on
    pub async fn find_review_queue(&self, reviewer_id: &str) -> Result<Vec<Project>, StoreError> {
        let filter = Filter::eq("status", ProjectStatus::Submitted.as_str())
            .and(Filter::eq("awaitingReview", true))
            .and(Filter::list_contains("reviewers", reviewer_id).negate())
            .and(Filter::eq("ownerId", reviewer_id).negate());
        let records = self
            .store
            .select(PROJECTS_TABLE, &Query::new(filter))
            .await?;
        decode_all(records)
    }

    /// Move a project into the review queue, linked to its YSWS submission.
    ///
    /// Starts a fresh review round: tallies and decisions from an earlier
    /// round are cleared.
    pub async fn mark_submitted(
        &self,
        id: &str,
        ysws_submission_id: &str,
    ) -> Result<Project, StoreError> {
        self.store
            .update(
                PROJECTS_TABLE,
                id,
                fields(json!({
                    "status": ProjectStatus::Submitted.as_str(),
                    "awaitingReview": true,
                    "yswsSubmissionId": ysws_submission_id,
                    "crazygood": 0,
                    "good": 0,
                    "unsure": 0,
                    "nothours": 0,
                    "reviewers": "",
                    "secondReviewer": Value::Null,
                    "secondDecision": Value::Null,
                    "coinsAwarded": Value::Null,
                    "reviewOutcome": Value::Null,
                })),
            )
            .await?
            .decode()
    }

    /// Persist every review-owned field of `project`.
    ///
    /// Also used to restore a snapshot when an award has to be rolled back.
    pub async fn save_review_state(&self, project: &Project) -> Result<Project, StoreError> {
        self.store
            .update(
                PROJECTS_TABLE,
                &project.id,
                fields(json!({
                    "status": project.status.as_str(),
                    "crazygood": project.crazygood,
                    "good": project.good,
                    "unsure": project.unsure,
                    "nothours": project.nothours,
                    "reviewers": comma_list::join(&project.reviewers),
                    "awaitingReview": project.awaiting_review,
                    "secondReviewer": project.second_reviewer,
                    "secondDecision": project.second_decision.map(|d| d.as_str()),
                    "coinsAwarded": project.coins_awarded,
                    "reviewOutcome": project.review_outcome,
                })),
            )
            .await?
            .decode()
    }
}
