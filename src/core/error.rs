//! Typed error handling for the NMI integration service
//!
//! Every failure the service can produce carries a stable, machine-readable
//! code so that callers can branch on it instead of parsing messages.
//!
//! # Error Categories
//!
//! - [`GatewayError`]: validation failures and classified gateway failures
//!   (the `NMI Error <code>: <message>` record)
//! - [`PlanError`]: errors raised by the recurring plan registry
//! - [`ConfigError`]: errors raised while loading or validating configuration
//! - [`ServiceError`]: the umbrella type used by the HTTP surface
//!
//! # Example
//!
//! ```rust,ignore
//! use nmi_pay::prelude::*;
//!
//! match service.process_payment(request).await {
//!     Ok(payment) => println!("approved: {}", payment.transaction_id),
//!     Err(e) if e.code == ErrorCode::DuplicateTransaction => {
//!         println!("already submitted");
//!     }
//!     Err(e) => eprintln!("{}", e),
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Error codes
// =============================================================================

/// Stable machine-readable error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidCard,
    InvalidAmount,
    InvalidRequest,
    DuplicateTransaction,
    ProcessingError,
    PartialResponse,
    InvalidRefund,
    NetworkError,
    AuthenticationFailed,
    InvalidAction,
    SystemError,
}

impl ErrorCode {
    /// Wire name of the code (e.g. `invalid_card`)
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidCard => "invalid_card",
            ErrorCode::InvalidAmount => "invalid_amount",
            ErrorCode::InvalidRequest => "invalid_request",
            ErrorCode::DuplicateTransaction => "duplicate_transaction",
            ErrorCode::ProcessingError => "processing_error",
            ErrorCode::PartialResponse => "partial_response",
            ErrorCode::InvalidRefund => "invalid_refund",
            ErrorCode::NetworkError => "network_error",
            ErrorCode::AuthenticationFailed => "authentication_failed",
            ErrorCode::InvalidAction => "invalid_action",
            ErrorCode::SystemError => "system_error",
        }
    }

    /// HTTP status the transport layer should answer with
    ///
    /// Caller-side mistakes map to 4xx, upstream and infrastructure failures
    /// to 5xx.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidCard
            | ErrorCode::InvalidAmount
            | ErrorCode::InvalidRequest
            | ErrorCode::InvalidRefund
            | ErrorCode::InvalidAction => StatusCode::BAD_REQUEST,
            ErrorCode::DuplicateTransaction => StatusCode::CONFLICT,
            ErrorCode::AuthenticationFailed => StatusCode::PAYMENT_REQUIRED,
            ErrorCode::ProcessingError | ErrorCode::PartialResponse | ErrorCode::NetworkError => {
                StatusCode::BAD_GATEWAY
            }
            ErrorCode::SystemError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Gateway Errors
// =============================================================================

/// A classified failure: validation, gateway decline, transport or decoding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayError {
    pub code: ErrorCode,
    pub message: String,
    /// Extra detail pulled out of the gateway text (e.g. the `REFID:` tail)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Untouched upstream payload, kept for diagnostics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl GatewayError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            raw: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Attach the raw upstream text; empty payloads are not recorded
    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        let raw = raw.into();
        if !raw.is_empty() {
            self.raw = Some(raw);
        }
        self
    }

    pub fn invalid_card(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidCard, message)
    }

    pub fn invalid_amount(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidAmount, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    pub fn invalid_refund(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRefund, message)
    }

    pub fn duplicate_transaction() -> Self {
        Self::new(
            ErrorCode::DuplicateTransaction,
            "duplicate transaction detected",
        )
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NetworkError, message)
    }

    pub fn processing(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ProcessingError, message)
    }

    pub fn system(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SystemError, message)
    }

    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NMI Error {}: {}", self.code, self.message)
    }
}

impl std::error::Error for GatewayError {}

impl From<GatewayError> for ServiceError {
    fn from(err: GatewayError) -> Self {
        ServiceError::Gateway(err)
    }
}

// =============================================================================
// Plan Errors
// =============================================================================

/// Errors related to the recurring plan registry
#[derive(Debug)]
pub enum PlanError {
    /// Plan was not found
    NotFound { id: String },

    /// A plan with this id is already registered
    AlreadyExists { id: String },

    /// Id, name or amount missing from the plan payload
    MissingFields { message: String },

    /// The registry lock was poisoned by a panicking writer
    Unavailable { message: String },
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanError::NotFound { id } => write!(f, "Plan '{}' not found", id),
            PlanError::AlreadyExists { id } => write!(f, "Plan ID '{}' already exists", id),
            PlanError::MissingFields { message } => write!(f, "{}", message),
            PlanError::Unavailable { message } => {
                write!(f, "Plan registry unavailable: {}", message)
            }
        }
    }
}

impl std::error::Error for PlanError {}

impl PlanError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PlanError::NotFound { .. } => StatusCode::NOT_FOUND,
            PlanError::AlreadyExists { .. } => StatusCode::CONFLICT,
            PlanError::MissingFields { .. } => StatusCode::BAD_REQUEST,
            PlanError::Unavailable { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            PlanError::NotFound { .. } => "plan_not_found",
            PlanError::AlreadyExists { .. } => "plan_already_exists",
            PlanError::MissingFields { .. } => "invalid_request",
            PlanError::Unavailable { .. } => "system_error",
        }
    }
}

impl From<PlanError> for ServiceError {
    fn from(err: PlanError) -> Self {
        ServiceError::Plan(err)
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A mandatory setting is absent or empty
    #[error("{field} is required")]
    MissingField { field: String },

    /// A setting is present but unusable
    #[error("Invalid value '{value}' for '{field}': {message}")]
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },

    /// Failed to parse a YAML configuration document
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// IO error while reading a configuration file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unreadable dotenv file
    #[error("Failed to read env file: {0}")]
    EnvFile(String),
}

// =============================================================================
// Service Error
// =============================================================================

/// The umbrella error type returned by the HTTP surface
#[derive(Debug)]
pub enum ServiceError {
    /// Validation and gateway failures
    Gateway(GatewayError),

    /// Plan registry errors
    Plan(PlanError),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Gateway(e) => write!(f, "{}", e),
            ServiceError::Plan(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServiceError::Gateway(e) => Some(e),
            ServiceError::Plan(e) => Some(e),
        }
    }
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Raw gateway payload, when the error came from a gateway answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl ServiceError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Gateway(e) => e.status_code(),
            ServiceError::Plan(e) => e.status_code(),
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            ServiceError::Gateway(e) => e.code.as_str(),
            ServiceError::Plan(e) => e.error_code(),
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        let message = match self {
            ServiceError::Gateway(e) => e.message.clone(),
            other => other.to_string(),
        };
        let raw = match self {
            ServiceError::Gateway(e) => e.raw.clone(),
            _ => None,
        };

        ErrorResponse {
            code: self.error_code().to_string(),
            message,
            details: self.details(),
            raw,
        }
    }

    /// Get additional details for the error
    fn details(&self) -> Option<serde_json::Value> {
        match self {
            ServiceError::Gateway(GatewayError {
                details: Some(details),
                ..
            }) => Some(serde_json::Value::String(details.clone())),
            ServiceError::Plan(PlanError::NotFound { id })
            | ServiceError::Plan(PlanError::AlreadyExists { id }) => {
                Some(serde_json::json!({ "plan_id": id }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), "{}", self);
        } else {
            tracing::debug!(code = self.error_code(), "{}", self);
        }
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Result type aliases
// =============================================================================

/// Result of a validation or gateway operation
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Result of an HTTP-surface operation
pub type ServiceResult<T> = Result<T, ServiceError>;

// =============================================================================
// Tests
// =============================================================================
