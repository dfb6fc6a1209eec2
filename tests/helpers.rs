#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use nebula_backend::auth::issue_session;
use nebula_backend::config::{AppConfig, RewardPolicy};
use nebula_backend::error::{AppError, AppResult};
use nebula_backend::hackatime::HoursProvider;
use nebula_backend::models::*;
use nebula_backend::store::{fields, MemoryStore};
use nebula_backend::AppState;
use rust_decimal::Decimal;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Hours provider returning a fixed, adjustable figure
#[derive(Default)]
pub struct FixedHours {
    hours: Mutex<Decimal>,
    failing: Mutex<bool>,
}

impl FixedHours {
    pub async fn set(&self, hours: i64) {
        *self.hours.lock().await = Decimal::from(hours);
    }

    pub async fn set_failing(&self, failing: bool) {
        *self.failing.lock().await = failing;
    }
}

#[async_trait]
impl HoursProvider for FixedHours {
    async fn hours_between(
        &self,
        _email: &str,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> AppResult<Decimal> {
        if *self.failing.lock().await {
            return Err(AppError::ExternalService("hackatime down".into()));
        }
        Ok(*self.hours.lock().await)
    }
}

/// Application wired over an in-memory store
pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub hours: Arc<FixedHours>,
    pub state: Arc<AppState>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_policy(RewardPolicy::default())
    }

    pub fn with_policy(rewards: RewardPolicy) -> Self {
        let store = Arc::new(MemoryStore::new());
        let hours = Arc::new(FixedHours::default());
        let config = AppConfig {
            rewards,
            ..AppConfig::default()
        };
        let state = Arc::new(AppState::new(config, store.clone(), hours.clone()));
        Self {
            store,
            hours,
            state,
        }
    }

    /// Create a user holding `coins`
    pub async fn user(&self, username: &str, role: UserRole, coins: i64) -> User {
        let email = format!("{}@example.com", username);
        let user = self
            .state
            .user_repo
            .create(username, Some(&email), role)
            .await
            .expect("Failed to create user");
        if coins == 0 {
            return user;
        }
        self.state
            .user_repo
            .set_balance(&user.id, Currency::Coins, coins)
            .await
            .expect("Failed to fund user")
    }

    pub async fn reload_user(&self, id: &str) -> User {
        self.state
            .user_repo
            .find_by_id(id)
            .await
            .expect("Failed to load user")
            .expect("User missing")
    }

    pub async fn reload_project(&self, id: &str) -> Project {
        self.state
            .project_repo
            .find_by_id(id)
            .await
            .expect("Failed to load project")
            .expect("Project missing")
    }

    /// Create a wip project with the given code and art hours
    pub async fn project(&self, owner: &User, code_hours: i64, art_hours: i64) -> Project {
        self.state
            .projects
            .create_project(
                &owner.id,
                "Test Project",
                Decimal::from(code_hours),
                Decimal::from(art_hours),
            )
            .await
            .expect("Failed to create project")
    }

    /// Create a project and submit it for review
    pub async fn submitted_project(
        &self,
        owner: &User,
        code_hours: i64,
        art_hours: i64,
    ) -> Project {
        let project = self.project(owner, code_hours, art_hours).await;
        self.state
            .projects
            .submit_for_review(&owner.id, &project.id)
            .await
            .expect("Failed to submit project")
    }

    /// Insert a devlog created at `at`
    pub async fn devlog_at(&self, user: &User, at: DateTime<Utc>, hours: i64, projects: &[&str]) {
        self.store
            .seed(
                DEVLOGS_TABLE,
                at,
                fields(json!({
                    "userId": user.id,
                    "content": "worked on it",
                    "hours": hours,
                    "codeHours": hours,
                    "artHours": 0,
                    "projectIds": projects.join(","),
                })),
            )
            .await;
    }

    /// Session token for `user`
    pub async fn login(&self, user: &User) -> String {
        issue_session(&self.state.session_repo, &user.id, Duration::days(1))
            .await
            .expect("Failed to issue session")
    }
}

pub fn hours(h: i64) -> Decimal {
    Decimal::from(h)
}
