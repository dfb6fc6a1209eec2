use super::{Fields, Query, Record, RecordStore};
use crate::config::StoreConfig;
use crate::error::StoreError;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

/// Airtable caps a page at 100 records
const PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
struct ListResponse {
    records: Vec<Record>,
    offset: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Typed {
        #[serde(rename = "type")]
        kind: String,
        message: Option<String>,
    },
    Plain(String),
}

/// Record store backed by the Airtable REST API
pub struct AirtableStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl AirtableStore {
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            base_url: format!("{}/{}", config.api_url, config.base_id),
            api_key: config.api_key.clone(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.base_url, table)
    }

    fn record_url(&self, table: &str, id: &str) -> String {
        format!("{}/{}/{}", self.base_url, table, id)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let response = request.bearer_auth(&self.api_key).send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("Record store rate limit hit");
            return Err(StoreError::RateLimited);
        }

        let text = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorBody>(&text) {
            Ok(ErrorBody {
                error: ErrorDetail::Typed { kind, message },
            }) => match message {
                Some(message) => format!("{}: {}", kind, message),
                None => kind,
            },
            Ok(ErrorBody {
                error: ErrorDetail::Plain(message),
            }) => message,
            Err(_) => text,
        };

        Err(StoreError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl RecordStore for AirtableStore {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Record>, StoreError> {
        let formula = query.filter.to_formula();
        debug!("select {} where {}", table, formula);

        let mut records = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let mut params: Vec<(&str, String)> = vec![
                ("filterByFormula", formula.clone()),
                ("pageSize", PAGE_SIZE.to_string()),
            ];
            if let Some(max) = query.max_records {
                params.push(("maxRecords", max.to_string()));
            }
            if let Some(ref offset) = offset {
                params.push(("offset", offset.clone()));
            }

            let page: ListResponse = self
                .send(self.client.get(self.table_url(table)).query(&params))
                .await?
                .json()
                .await?;

            records.extend(page.records);

            match page.offset {
                Some(next) if query.max_records.map_or(true, |max| records.len() < max) => {
                    offset = Some(next);
                }
                _ => break,
            }
        }

        if let Some(max) = query.max_records {
            records.truncate(max);
        }

        Ok(records)
    }

    async fn find(&self, table: &str, id: &str) -> Result<Option<Record>, StoreError> {
        match self.send(self.client.get(self.record_url(table, id))).await {
            Ok(response) => Ok(Some(response.json().await?)),
            Err(StoreError::Api { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create(&self, table: &str, fields: Fields) -> Result<Record, StoreError> {
        let body = serde_json::json!({ "fields": fields, "typecast": true });
        let record = self
            .send(self.client.post(self.table_url(table)).json(&body))
            .await?
            .json()
            .await?;
        Ok(record)
    }

    async fn update(&self, table: &str, id: &str, fields: Fields) -> Result<Record, StoreError> {
        let body = serde_json::json!({ "fields": fields, "typecast": true });
        match self
            .send(self.client.patch(self.record_url(table, id)).json(&body))
            .await
        {
            Ok(response) => Ok(response.json().await?),
            Err(StoreError::Api { status: 404, .. }) => Err(StoreError::NotFound(id.to_string())),
            Err(e) => Err(e),
        }
    }

    async fn destroy(&self, table: &str, id: &str) -> Result<(), StoreError> {
        match self.send(self.client.delete(self.record_url(table, id))).await {
            Ok(_) => Ok(()),
            Err(StoreError::Api { status: 404, .. }) => Err(StoreError::NotFound(id.to_string())),
            Err(e) => Err(e),
        }
    }
}
