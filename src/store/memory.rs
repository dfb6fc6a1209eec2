use super::{Fields, Query, Record, RecordStore};
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

/// Store operation, used to target injected failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Select,
    Find,
    Create,
    Update,
    Destroy,
}

/// In-process record store.
///
/// Keeps records in insertion order per table and mirrors Airtable's patch
/// semantics (a `null` field clears the cell). Failures can be injected per
/// table and operation to exercise rollback paths.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Vec<Record>>>,
    failures: Mutex<HashMap<(String, Operation), InjectedFailure>>,
}

#[derive(Debug, Default, Clone, Copy)]
struct InjectedFailure {
    skip: u32,
    remaining: u32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `times` calls of `operation` on `table` fail with a transient error
    pub async fn fail_next(&self, table: &str, operation: Operation, times: u32) {
        self.fail_after(table, operation, 0, times).await;
    }

    /// Let `skip` calls of `operation` on `table` through, then fail the next `times`
    pub async fn fail_after(&self, table: &str, operation: Operation, skip: u32, times: u32) {
        self.failures.lock().await.insert(
            (table.to_string(), operation),
            InjectedFailure {
                skip,
                remaining: times,
            },
        );
    }

    /// Insert a record with an explicit creation time
    pub async fn seed(&self, table: &str, created_time: DateTime<Utc>, fields: Fields) -> Record {
        let record = Record {
            id: new_record_id(),
            created_time,
            fields: strip_nulls(fields),
        };
        self.tables
            .write()
            .await
            .entry(table.to_string())
            .or_default()
            .push(record.clone());
        record
    }

    /// Number of records currently in `table`
    pub async fn count(&self, table: &str) -> usize {
        self.tables.read().await.get(table).map_or(0, Vec::len)
    }

    async fn check_failure(&self, table: &str, operation: Operation) -> Result<(), StoreError> {
        let mut failures = self.failures.lock().await;
        if let Some(injected) = failures.get_mut(&(table.to_string(), operation)) {
            if injected.skip > 0 {
                injected.skip -= 1;
            } else if injected.remaining > 0 {
                injected.remaining -= 1;
                debug!("Injected {:?} failure on {}", operation, table);
                return Err(StoreError::Unavailable(format!(
                    "injected {:?} failure on {}",
                    operation, table
                )));
            }
        }
        Ok(())
    }
}

fn new_record_id() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("rec{}", &id[..14])
}

fn strip_nulls(fields: Fields) -> Fields {
    fields.into_iter().filter(|(_, v)| !v.is_null()).collect()
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Record>, StoreError> {
        self.check_failure(table, Operation::Select).await?;

        let tables = self.tables.read().await;
        let matching = tables
            .get(table)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| query.filter.matches(&r.fields))
                    .take(query.max_records.unwrap_or(usize::MAX))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        Ok(matching)
    }

    async fn find(&self, table: &str, id: &str) -> Result<Option<Record>, StoreError> {
        self.check_failure(table, Operation::Find).await?;

        let tables = self.tables.read().await;
        Ok(tables
            .get(table)
            .and_then(|records| records.iter().find(|r| r.id == id).cloned()))
    }

    async fn create(&self, table: &str, fields: Fields) -> Result<Record, StoreError> {
        self.check_failure(table, Operation::Create).await?;
        Ok(self.seed(table, Utc::now(), fields).await)
    }

    async fn update(&self, table: &str, id: &str, fields: Fields) -> Result<Record, StoreError> {
        self.check_failure(table, Operation::Update).await?;

        let mut tables = self.tables.write().await;
        let record = tables
            .get_mut(table)
            .and_then(|records| records.iter_mut().find(|r| r.id == id))
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        for (key, value) in fields {
            if value == Value::Null {
                record.fields.remove(&key);
            } else {
                record.fields.insert(key, value);
            }
        }

        Ok(record.clone())
    }

    async fn destroy(&self, table: &str, id: &str) -> Result<(), StoreError> {
        self.check_failure(table, Operation::Destroy).await?;

        let mut tables = self.tables.write().await;
        let records = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let before = records.len();
        records.retain(|r| r.id != id);

        if records.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
