use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Which record store implementation backs the repositories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Airtable,
    Memory,
}

/// Record store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub api_url: String,
    pub api_key: String,
    pub base_id: String,
    pub timeout_secs: u64,
}

/// Time-tracking (Hackatime) API configuration
#[derive(Debug, Clone)]
pub struct HackatimeConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

/// Reward and policy constants for the review, blackhole and betting workflows
#[derive(Debug, Clone)]
pub struct RewardPolicy {
    /// Votes needed to cross any basic review threshold
    pub review_vote_threshold: u32,
    /// Coins per hour for a "crazygood" award
    pub review_top_rate: Decimal,
    /// Coins per hour for a "good" award
    pub review_standard_rate: Decimal,
    pub blackhole_cost: i64,
    pub blackhole_min_hours: Decimal,
    pub blackhole_stellarship_reward: i64,
    pub bet_min_amount: i64,
    pub bet_max_amount: i64,
    pub bet_duration_days: i64,
    pub bet_claim_window_days: i64,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub hackatime: HackatimeConfig,
    pub rewards: RewardPolicy,
    pub log_level: String,
    pub log_format: String,
    pub http_port: u16,
    pub environment: String,
    pub session_cookie: String,
}

fn parse_or<T: FromStr>(key: &str, default: T) -> Result<T, String> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| format!("Invalid value for {}: {}", key, raw)),
        Err(_) => Ok(default),
    }
}

impl StoreConfig {
    /// Create record store config from environment variables
    pub fn from_env() -> Result<Self, String> {
        let backend = match env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "airtable".to_string())
            .to_lowercase()
            .as_str()
        {
            "airtable" => StoreBackend::Airtable,
            "memory" => StoreBackend::Memory,
            other => {
                return Err(format!(
                    "Invalid STORE_BACKEND: {}. Must be one of: [\"airtable\", \"memory\"]",
                    other
                ))
            }
        };

        let api_key = env::var("AIRTABLE_API_KEY").unwrap_or_default();
        let base_id = env::var("AIRTABLE_BASE_ID").unwrap_or_default();

        if backend == StoreBackend::Airtable {
            if api_key.is_empty() {
                return Err("AIRTABLE_API_KEY environment variable is required".to_string());
            }
            if base_id.is_empty() {
                return Err("AIRTABLE_BASE_ID environment variable is required".to_string());
            }
        }

        let api_url = env::var("AIRTABLE_API_URL")
            .unwrap_or_else(|_| "https://api.airtable.com/v0".to_string());

        let timeout_secs = parse_or("AIRTABLE_TIMEOUT_SECS", 15u64)?;
        if timeout_secs == 0 {
            return Err("AIRTABLE_TIMEOUT_SECS must be greater than 0".to_string());
        }

        Ok(Self {
            backend,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
            base_id,
            timeout_secs,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            api_url: "https://api.airtable.com/v0".to_string(),
            api_key: String::new(),
            base_id: String::new(),
            timeout_secs: 15,
        }
    }
}

impl HackatimeConfig {
    pub fn from_env() -> Result<Self, String> {
        let api_url = env::var("HACKATIME_API_URL")
            .unwrap_or_else(|_| "https://hackatime.hackclub.com".to_string());
        let api_key = env::var("HACKATIME_API_KEY").ok().filter(|k| !k.is_empty());
        let timeout_secs = parse_or("HACKATIME_TIMEOUT_SECS", 10u64)?;

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
            timeout_secs,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for HackatimeConfig {
    fn default() -> Self {
        Self {
            api_url: "https://hackatime.hackclub.com".to_string(),
            api_key: None,
            timeout_secs: 10,
        }
    }
}

impl RewardPolicy {
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();

        let policy = Self {
            review_vote_threshold: parse_or(
                "REVIEW_VOTE_THRESHOLD",
                defaults.review_vote_threshold,
            )?,
            review_top_rate: parse_or("REVIEW_TOP_RATE", defaults.review_top_rate)?,
            review_standard_rate: parse_or("REVIEW_STANDARD_RATE", defaults.review_standard_rate)?,
            blackhole_cost: parse_or("BLACKHOLE_COST", defaults.blackhole_cost)?,
            blackhole_min_hours: parse_or("BLACKHOLE_MIN_HOURS", defaults.blackhole_min_hours)?,
            blackhole_stellarship_reward: parse_or(
                "BLACKHOLE_STELLARSHIP_REWARD",
                defaults.blackhole_stellarship_reward,
            )?,
            bet_min_amount: parse_or("BET_MIN_AMOUNT", defaults.bet_min_amount)?,
            bet_max_amount: parse_or("BET_MAX_AMOUNT", defaults.bet_max_amount)?,
            bet_duration_days: parse_or("BET_DURATION_DAYS", defaults.bet_duration_days)?,
            bet_claim_window_days: parse_or(
                "BET_CLAIM_WINDOW_DAYS",
                defaults.bet_claim_window_days,
            )?,
        };

        policy.validate()?;
        Ok(policy)
    }

    /// Reject policies that would break the workflow invariants
    pub fn validate(&self) -> Result<(), String> {
        if self.review_vote_threshold == 0 {
            return Err("REVIEW_VOTE_THRESHOLD must be greater than 0".to_string());
        }
        if self.review_top_rate < Decimal::ZERO || self.review_standard_rate < Decimal::ZERO {
            return Err("Review coin rates must not be negative".to_string());
        }
        if self.blackhole_cost < 0 {
            return Err("BLACKHOLE_COST must not be negative".to_string());
        }
        if self.bet_min_amount <= 0 || self.bet_max_amount < self.bet_min_amount {
            return Err(format!(
                "Invalid bet bounds: min {} max {}",
                self.bet_min_amount, self.bet_max_amount
            ));
        }
        if self.bet_duration_days <= 0 || self.bet_claim_window_days <= 0 {
            return Err("Bet duration and claim window must be positive".to_string());
        }
        Ok(())
    }
}

impl Default for RewardPolicy {
    fn default() -> Self {
        Self {
            review_vote_threshold: 2,
            review_top_rate: Decimal::from(10),
            review_standard_rate: Decimal::from(9),
            blackhole_cost: 10,
            blackhole_min_hours: Decimal::from(10),
            blackhole_stellarship_reward: 1,
            bet_min_amount: 1,
            bet_max_amount: 100,
            bet_duration_days: 7,
            bet_claim_window_days: 7,
        }
    }
}

impl AppConfig {
    /// Create application config from environment variables
    pub fn from_env() -> Result<Self, String> {
        let store = StoreConfig::from_env()?;
        let hackatime = HackatimeConfig::from_env()?;
        let rewards = RewardPolicy::from_env()?;

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_format = env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
        let http_port = parse_or("HTTP_PORT", 8080u16)?;
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        let session_cookie = env::var("SESSION_COOKIE").unwrap_or_else(|_| "session".to_string());

        // Validate log level
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&log_level.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid LOG_LEVEL: {}. Must be one of: {:?}",
                log_level, valid_log_levels
            ));
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&log_format.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid LOG_FORMAT: {}. Must be one of: {:?}",
                log_format, valid_log_formats
            ));
        }

        // Validate environment
        let valid_environments = ["development", "staging", "production"];
        if !valid_environments.contains(&environment.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid ENVIRONMENT: {}. Must be one of: {:?}",
                environment, valid_environments
            ));
        }

        Ok(Self {
            store,
            hackatime,
            rewards,
            log_level: log_level.to_lowercase(),
            log_format: log_format.to_lowercase(),
            http_port,
            environment: environment.to_lowercase(),
            session_cookie,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Check if running in development
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn json_logs(&self) -> bool {
        self.log_format == "json"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            hackatime: HackatimeConfig::default(),
            rewards: RewardPolicy::default(),
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            http_port: 8080,
            environment: "development".to_string(),
            session_cookie: "session".to_string(),
        }
    }
}
