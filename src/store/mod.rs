//! Record store access.
//!
//! The platform keeps every entity as a record in a hosted spreadsheet-style
//! database. Repositories talk to it through [`RecordStore`], which has an
//! HTTP implementation ([`AirtableStore`]) and an in-memory one
//! ([`MemoryStore`]) for tests and local development.

pub mod airtable;
pub mod formula;
pub mod memory;

pub use airtable::AirtableStore;
pub use formula::{escape_formula, Filter};
pub use memory::{MemoryStore, Operation};

use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field map of a record
pub type Fields = Map<String, Value>;

/// A single record as returned by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(rename = "createdTime")]
    pub created_time: DateTime<Utc>,
    #[serde(default)]
    pub fields: Fields,
}

impl Record {
    /// Decode the record into a model.
    ///
    /// `id` and `createdTime` are merged into the field map so models can
    /// declare them as ordinary fields.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        let mut fields = self.fields.clone();
        fields.insert("id".to_string(), Value::String(self.id.clone()));
        fields.insert(
            "createdTime".to_string(),
            Value::String(self.created_time.to_rfc3339()),
        );

        serde_json::from_value(Value::Object(fields)).map_err(|source| StoreError::Decode {
            id: self.id.clone(),
            source,
        })
    }
}

/// Select query
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub filter: Filter,
    pub max_records: Option<usize>,
}

impl Query {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            max_records: None,
        }
    }

    pub fn limit(mut self, max_records: usize) -> Self {
        self.max_records = Some(max_records);
        self
    }
}

/// CRUD access to the remote tabular store
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Select all records in `table` matching the query
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Record>, StoreError>;

    /// Fetch a record by id
    async fn find(&self, table: &str, id: &str) -> Result<Option<Record>, StoreError>;

    /// Create a record
    async fn create(&self, table: &str, fields: Fields) -> Result<Record, StoreError>;

    /// Patch the given fields of a record, leaving the others untouched
    async fn update(&self, table: &str, id: &str, fields: Fields) -> Result<Record, StoreError>;

    /// Delete a record
    async fn destroy(&self, table: &str, id: &str) -> Result<(), StoreError>;
}

/// Build a [`Fields`] map from a `json!` object literal
pub fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        _ => Fields::new(),
    }
}
