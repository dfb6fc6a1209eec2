pub mod bet_repository;
pub mod blackhole_repository;
pub mod devlog_repository;
pub mod project_repository;
pub mod session_repository;
pub mod user_repository;
pub mod ysws_repository;

// Re-export all repositories for convenient access
pub use bet_repository::BetRepository;
pub use blackhole_repository::BlackholeRepository;
pub use devlog_repository::DevlogRepository;
pub use project_repository::ProjectRepository;
pub use session_repository::SessionRepository;
pub use user_repository::UserRepository;
pub use ysws_repository::YswsRepository;

use crate::error::StoreError;
use crate::store::Record;
use serde::de::DeserializeOwned;

fn decode_all<T: DeserializeOwned>(records: Vec<Record>) -> Result<Vec<T>, StoreError> {
    records.iter().map(Record::decode).collect()
}

fn decode_first<T: DeserializeOwned>(records: Vec<Record>) -> Result<Option<T>, StoreError> {
    records.first().map(Record::decode).transpose()
}
