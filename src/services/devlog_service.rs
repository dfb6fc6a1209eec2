use crate::error::{AppError, AppResult};
use crate::models::{Devlog, ProjectStatus};
use crate::repositories::devlog_repository::NewDevlog;
use crate::repositories::{DevlogRepository, ProjectRepository};
use crate::services::quest_service::QuestService;
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};

/// Fields of a devlog submitted by a user
#[derive(Debug, Clone)]
pub struct DevlogInput {
    pub content: String,
    pub code_hours: Decimal,
    pub art_hours: Decimal,
    pub project_ids: Vec<String>,
}

pub struct DevlogService {
    devlog_repo: Arc<DevlogRepository>,
    project_repo: Arc<ProjectRepository>,
    quests: Arc<QuestService>,
}

impl DevlogService {
    pub fn new(
        devlog_repo: Arc<DevlogRepository>,
        project_repo: Arc<ProjectRepository>,
        quests: Arc<QuestService>,
    ) -> Self {
        Self {
            devlog_repo,
            project_repo,
            quests,
        }
    }

    /// Write a devlog and refresh the author's streak markers.
    ///
    /// Hours logged against projects that are not yet submitted are also
    /// kept in the pending fields until a project is submitted.
    pub async fn create_devlog(
        &self,
        user_id: &str,
        input: DevlogInput,
        now: DateTime<Utc>,
    ) -> AppResult<Devlog> {
        if input.code_hours < Decimal::ZERO || input.art_hours < Decimal::ZERO {
            return Err(AppError::Validation("Hours must not be negative".into()));
        }
        if input.code_hours + input.art_hours <= Decimal::ZERO {
            return Err(AppError::Validation("A devlog must log some hours".into()));
        }

        let mut project_ids = input.project_ids;
        project_ids.retain(|id| !id.trim().is_empty());
        project_ids.sort();
        project_ids.dedup();

        let projects =
            try_join_all(project_ids.iter().map(|id| self.project_repo.find_by_id(id))).await?;

        let mut any_submitted = false;
        for (id, project) in project_ids.iter().zip(projects) {
            let project =
                project.ok_or_else(|| AppError::NotFound(format!("Project {} not found", id)))?;
            if !project.is_owned_by(user_id) {
                return Err(AppError::Forbidden(format!(
                    "You do not own project {}",
                    id
                )));
            }
            any_submitted |= project.status == ProjectStatus::Submitted;
        }

        let (pending_code_hours, pending_art_hours) = if any_submitted {
            (Decimal::ZERO, Decimal::ZERO)
        } else {
            (input.code_hours, input.art_hours)
        };

        let devlog = self
            .devlog_repo
            .create(NewDevlog {
                user_id,
                content: input.content.trim(),
                code_hours: input.code_hours,
                art_hours: input.art_hours,
                pending_code_hours,
                pending_art_hours,
                project_ids: &project_ids,
            })
            .await?;

        info!(
            "Devlog {} by {}: {}h code, {}h art",
            devlog.id, user_id, input.code_hours, input.art_hours
        );

        // The devlog is stored either way; stale markers are fixed on the next write
        if let Err(e) = self.quests.refresh_streaks(user_id, now).await {
            warn!("Could not refresh streaks for {}: {}", user_id, e);
        }

        Ok(devlog)
    }
}
