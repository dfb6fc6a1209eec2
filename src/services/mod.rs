pub mod betting_service;
pub mod blackhole_service;
pub mod devlog_service;
pub mod ledger;
pub mod project_service;
pub mod quest_service;
pub mod review_service;
pub mod saga;
pub mod stats;

pub use betting_service::BettingService;
pub use blackhole_service::BlackholeService;
pub use devlog_service::{DevlogInput, DevlogService};
pub use ledger::CurrencyLedger;
pub use project_service::ProjectService;
pub use quest_service::QuestService;
pub use review_service::ReviewService;
pub use saga::{Compensation, Compensator, Saga};
