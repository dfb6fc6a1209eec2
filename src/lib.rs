//! Nebula Backend Library
//!
//! Review, blackhole, betting and quest workflows for the Nebula devlog
//! platform, exposed for the binary, tests and other consumers.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod hackatime;
pub mod models;
pub mod repositories;
pub mod services;
pub mod store;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};

use config::{StoreBackend, StoreConfig};
use hackatime::HoursProvider;
use repositories::*;
use services::*;
use std::sync::Arc;
use store::{AirtableStore, MemoryStore, RecordStore};

/// Application state containing all repositories and services
pub struct AppState {
    pub config: AppConfig,
    pub user_repo: Arc<UserRepository>,
    pub project_repo: Arc<ProjectRepository>,
    pub devlog_repo: Arc<DevlogRepository>,
    pub bet_repo: Arc<BetRepository>,
    pub blackhole_repo: Arc<BlackholeRepository>,
    pub ysws_repo: Arc<YswsRepository>,
    pub session_repo: Arc<SessionRepository>,
    pub projects: Arc<ProjectService>,
    pub reviews: Arc<ReviewService>,
    pub blackhole: Arc<BlackholeService>,
    pub betting: Arc<BettingService>,
    pub quests: Arc<QuestService>,
    pub devlogs: Arc<DevlogService>,
}

impl AppState {
    /// Wire repositories and services over one record store
    pub fn new(
        config: AppConfig,
        store: Arc<dyn RecordStore>,
        hours: Arc<dyn HoursProvider>,
    ) -> Self {
        let user_repo = Arc::new(UserRepository::new(store.clone()));
        let project_repo = Arc::new(ProjectRepository::new(store.clone()));
        let devlog_repo = Arc::new(DevlogRepository::new(store.clone()));
        let bet_repo = Arc::new(BetRepository::new(store.clone()));
        let blackhole_repo = Arc::new(BlackholeRepository::new(store.clone()));
        let ysws_repo = Arc::new(YswsRepository::new(store.clone()));
        let session_repo = Arc::new(SessionRepository::new(store));

        let ledger = Arc::new(CurrencyLedger::new(user_repo.clone()));
        let compensator = Arc::new(Compensator::new(
            ledger.clone(),
            user_repo.clone(),
            project_repo.clone(),
            bet_repo.clone(),
            ysws_repo.clone(),
            blackhole_repo.clone(),
        ));

        let policy = config.rewards.clone();

        let projects = Arc::new(ProjectService::new(
            project_repo.clone(),
            ysws_repo.clone(),
            compensator.clone(),
        ));
        let reviews = Arc::new(ReviewService::new(
            project_repo.clone(),
            ysws_repo.clone(),
            ledger.clone(),
            compensator.clone(),
            policy.clone(),
        ));
        let blackhole = Arc::new(BlackholeService::new(
            user_repo.clone(),
            project_repo.clone(),
            blackhole_repo.clone(),
            ledger.clone(),
            compensator.clone(),
            policy.clone(),
        ));
        let betting = Arc::new(BettingService::new(
            bet_repo.clone(),
            user_repo.clone(),
            ledger.clone(),
            compensator.clone(),
            hours.clone(),
            policy,
        ));
        let quests = Arc::new(QuestService::new(
            user_repo.clone(),
            devlog_repo.clone(),
            project_repo.clone(),
            ledger,
            compensator,
            hours,
        ));
        let devlogs = Arc::new(DevlogService::new(
            devlog_repo.clone(),
            project_repo.clone(),
            quests.clone(),
        ));

        Self {
            config,
            user_repo,
            project_repo,
            devlog_repo,
            bet_repo,
            blackhole_repo,
            ysws_repo,
            session_repo,
            projects,
            reviews,
            blackhole,
            betting,
            quests,
            devlogs,
        }
    }
}

/// Build the record store selected by configuration
pub fn build_store(config: &StoreConfig) -> AppResult<Arc<dyn RecordStore>> {
    let store: Arc<dyn RecordStore> = match config.backend {
        StoreBackend::Airtable => Arc::new(AirtableStore::new(config)?),
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
    };
    Ok(store)
}
