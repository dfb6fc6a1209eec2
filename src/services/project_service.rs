use crate::error::{AppError, AppResult};
use crate::models::{Project, ProjectStatus};
use crate::repositories::{ProjectRepository, YswsRepository};
use crate::services::saga::{Compensation, Compensator};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};

/// Project creation and submission into the review queue
pub struct ProjectService {
    project_repo: Arc<ProjectRepository>,
    ysws_repo: Arc<YswsRepository>,
    compensator: Arc<Compensator>,
}

impl ProjectService {
    pub fn new(
        project_repo: Arc<ProjectRepository>,
        ysws_repo: Arc<YswsRepository>,
        compensator: Arc<Compensator>,
    ) -> Self {
        Self {
            project_repo,
            ysws_repo,
            compensator,
        }
    }

    pub async fn create_project(
        &self,
        owner_id: &str,
        name: &str,
        hackatime_hours: Decimal,
        art_hours: Decimal,
    ) -> AppResult<Project> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Project name is required".into()));
        }
        if hackatime_hours < Decimal::ZERO || art_hours < Decimal::ZERO {
            return Err(AppError::Validation("Hours must not be negative".into()));
        }

        let project = self
            .project_repo
            .create(owner_id, name, hackatime_hours, art_hours)
            .await?;
        info!("Created project {} for {}", project.id, owner_id);
        Ok(project)
    }

    /// Move an owned `wip` project into the basic review queue
    pub async fn submit_for_review(&self, user_id: &str, project_id: &str) -> AppResult<Project> {
        let project = self
            .project_repo
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Project not found".into()))?;

        if !project.is_owned_by(user_id) {
            return Err(AppError::Forbidden("You do not own this project".into()));
        }
        if project.status != ProjectStatus::Wip {
            return Err(AppError::Conflict(format!(
                "Project is already {}",
                project.status.as_str()
            )));
        }

        let mut saga = self.compensator.begin("submit_for_review");
        let submission = saga
            .step(self.ysws_repo.create(project_id, user_id), |s| {
                Compensation::DeleteYswsSubmission {
                    submission_id: s.id.clone(),
                }
            })
            .await?;

        let previous = project.ysws_submission_id.clone();
        let project = saga
            .finish(self.project_repo.mark_submitted(project_id, &submission.id))
            .await?;

        if let Some(stale) = previous.filter(|id| *id != submission.id) {
            if let Err(e) = self.ysws_repo.supersede(&stale).await {
                warn!("Could not retire ysws record {} for {}: {}", stale, project.id, e);
            }
        }

        info!(
            "Project {} submitted for review (ysws {})",
            project.id, submission.id
        );
        Ok(project)
    }
}
