//! Domain models for the Nebula backend.
//!
//! Each model mirrors one table of the record store. Field names are the
//! camelCase column names; `id` and `createdTime` come from record metadata.

pub mod bet;
pub mod blackhole;
pub mod codec;
pub mod devlog;
pub mod project;
pub mod quest;
pub mod session;
pub mod user;
pub mod ysws;

// Re-export all models for convenient access
pub use bet::{Bet, BetStatus, BETS_TABLE};
pub use blackhole::{BlackholeSubmission, SubmissionStatus, BLACKHOLE_TABLE};
pub use devlog::{Devlog, DEVLOGS_TABLE};
pub use project::{BasicVote, Project, ProjectStatus, SecondDecision, PROJECTS_TABLE};
pub use quest::{Quest, QuestRequirement, QuestReward};
pub use session::{Session, SESSIONS_TABLE};
pub use user::{Currency, User, UserRole, USERS_TABLE};
pub use ysws::{YswsSubmission, YSWS_TABLE};
