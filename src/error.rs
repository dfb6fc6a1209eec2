use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::error;

/// Generic message returned to clients for internal failures
pub const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred";

static EXPOSE_INTERNAL_ERRORS: AtomicBool = AtomicBool::new(false);

/// Forward internal error messages to clients (development only)
pub fn set_expose_internal_errors(expose: bool) {
    EXPOSE_INTERNAL_ERRORS.store(expose, Ordering::Relaxed);
}

/// Record store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Transport-level failure talking to the store
    #[error("Record store request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response from the store API
    #[error("Record store returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Store asked us to slow down
    #[error("Record store rate limited")]
    RateLimited,

    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Record fields did not decode into the expected model
    #[error("Malformed record {id}: {source}")]
    Decode {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    /// Store temporarily unavailable
    #[error("Record store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Errors worth retrying in read-modify-write loops
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            StoreError::Api { status, .. } => *status >= 500,
            StoreError::RateLimited | StoreError::Unavailable(_) => true,
            StoreError::NotFound(_) | StoreError::Decode { .. } => false,
        }
    }
}

/// Application-level error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Record store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation errors
    #[error("{0}")]
    Validation(String),

    /// Not found errors
    #[error("{0}")]
    NotFound(String),

    /// Missing or invalid session
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed
    #[error("{0}")]
    Forbidden(String),

    /// State conflict (already voted, already decided, ...)
    #[error("{0}")]
    Conflict(String),

    /// Not enough of a currency for a debit
    #[error("Insufficient {currency}: need {required}, have {available}")]
    InsufficientFunds {
        currency: &'static str,
        required: i64,
        available: i64,
    },

    #[error("Too many requests, please try again later")]
    RateLimited,

    /// External service errors
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Generic error with message
    #[error("{0}")]
    Message(String),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Check if error is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AppError::NotFound(_) | AppError::Store(StoreError::NotFound(_))
        )
    }

    /// Transient failures a retry loop may paper over
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::Store(e) => e.is_transient(),
            AppError::RateLimited => true,
            _ => false,
        }
    }

    /// Get HTTP status code for the error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::InsufficientFunds { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) | AppError::Store(StoreError::NotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::RateLimited | AppError::Store(StoreError::RateLimited) => {
                StatusCode::TOO_MANY_REQUESTS
            }
            AppError::ExternalService(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the message was written for end users and may be forwarded as-is
    pub fn is_client_safe(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_)
                | AppError::NotFound(_)
                | AppError::Unauthorized(_)
                | AppError::Forbidden(_)
                | AppError::Conflict(_)
                | AppError::InsufficientFunds { .. }
                | AppError::RateLimited
        )
    }

    /// Message sent to the client
    pub fn client_message(&self, expose_internal: bool) -> String {
        if self.is_client_safe() || expose_internal {
            self.to_string()
        } else {
            GENERIC_ERROR_MESSAGE.to_string()
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let message = self.client_message(EXPOSE_INTERNAL_ERRORS.load(Ordering::Relaxed));
        let body = serde_json::json!({ "success": false, "error": message });

        (status, Json(body)).into_response()
    }
}
