//! Hours worked, as reported by the Hackatime time-tracking service.

use crate::config::HackatimeConfig;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode, Url};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, warn};

/// Source of "hours worked" figures for bets and quests
#[async_trait]
pub trait HoursProvider: Send + Sync {
    /// Hours tracked for the account registered under `email` in `[start, end)`
    async fn hours_between(
        &self,
        email: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Decimal>;
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    user_id: u64,
}

#[derive(Debug, Deserialize)]
struct StatsResponse {
    data: StatsData,
}

#[derive(Debug, Deserialize)]
struct StatsData {
    #[serde(default)]
    total_seconds: f64,
}

/// HTTP client for the Hackatime stats API
pub struct HackatimeClient {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl HackatimeClient {
    pub fn new(config: &HackatimeConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build Hackatime client: {}", e)))?;
        let base_url = Url::parse(&config.api_url)
            .map_err(|e| AppError::Config(format!("Invalid HACKATIME_API_URL: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Config("HACKATIME_API_URL cannot be a base URL".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get(&self, url: Url) -> AppResult<reqwest::Response> {
        let mut request = self.client.get(url);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        request
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Hackatime request failed: {}", e)))
    }

    /// Resolve the numeric Hackatime id for an email
    pub async fn lookup_user_id(&self, email: &str) -> AppResult<u64> {
        let url = self.endpoint(&["api", "v1", "users", "lookup_email", email])?;
        let response = self.get(url).await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(AppError::NotFound(
                "No Hackatime account found for your email".into(),
            )),
            StatusCode::TOO_MANY_REQUESTS => Err(AppError::RateLimited),
            status if !status.is_success() => Err(AppError::ExternalService(format!(
                "Hackatime lookup returned {}",
                status
            ))),
            _ => {
                let body: LookupResponse = response.json().await.map_err(|e| {
                    AppError::ExternalService(format!("Malformed Hackatime lookup: {}", e))
                })?;
                Ok(body.user_id)
            }
        }
    }
}

/// Convert tracked seconds to hours, rounded to two decimals
pub fn seconds_to_hours(seconds: f64) -> Decimal {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Decimal::ZERO;
    }
    Decimal::try_from(seconds / 3600.0)
        .map(|h| h.round_dp(2))
        .unwrap_or(Decimal::ZERO)
}

#[async_trait]
impl HoursProvider for HackatimeClient {
    async fn hours_between(
        &self,
        email: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Decimal> {
        if end <= start {
            return Ok(Decimal::ZERO);
        }

        let user_id = self.lookup_user_id(email).await?;
        let mut url = self.endpoint(&["api", "v1", "users", &user_id.to_string(), "stats"])?;
        url.query_pairs_mut()
            .append_pair("start_date", &start.to_rfc3339())
            .append_pair("end_date", &end.to_rfc3339());

        let response = self.get(url).await?;
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::RateLimited);
        }
        if !status.is_success() {
            warn!("Hackatime stats for user {} returned {}", user_id, status);
            return Err(AppError::ExternalService(format!(
                "Hackatime stats returned {}",
                status
            )));
        }

        let stats: StatsResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("Malformed Hackatime stats: {}", e)))?;

        let hours = seconds_to_hours(stats.data.total_seconds);
        debug!("Hackatime user {} tracked {}h between {} and {}", user_id, hours, start, end);
        Ok(hours)
    }
}
