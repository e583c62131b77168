//! # Client Error Types
//!
//! Everything that can go wrong between a page and the backend.
//!
//! ## Status Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    HTTP Status → ClientError                            │
//! │                                                                         │
//! │  transport failure ─────────────► Http(reqwest::Error)   retryable      │
//! │  401 ───────────────────────────► Unauthorized           → /login       │
//! │  403 ───────────────────────────► Forbidden                             │
//! │  404 ───────────────────────────► NotFound                              │
//! │  400/422 with {field: message} ─► Validation(FieldErrors) → form        │
//! │  other 4xx/5xx ─────────────────► Api { status, message } 5xx retryable │
//! │  body not as expected ──────────► InvalidResponse / Serialization       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use partsdesk_core::{CoreError, FieldErrors, ValidationError};
use serde::Serialize;
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Request never got a response (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Missing or rejected `token` cookie.
    #[error("Authentication required")]
    Unauthorized,

    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Field-level failures, either checked locally or returned by the server.
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// Any other non-success status.
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// A cart or ledger rule refused the operation before any request.
    #[error(transparent)]
    Core(#[from] CoreError),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<FieldErrors> for ClientError {
    fn from(errors: FieldErrors) -> Self {
        ClientError::Validation(errors)
    }
}

impl From<ValidationError> for ClientError {
    fn from(err: ValidationError) -> Self {
        ClientError::Validation(FieldErrors::from(err))
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::Config(format!("invalid URL: {}", err))
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Config(err.to_string())
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::Config(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

/// Machine-readable error code for the rendering layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    Network,
    Unauthorized,
    Forbidden,
    NotFound,
    ValidationError,
    ServerError,
    BadResponse,
    Config,
    BusinessRule,
}

impl ClientError {
    /// Whether a "Retry" button makes sense.
    ///
    /// Transport failures and 5xx answers may succeed on a second attempt;
    /// everything else will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Http(_) => true,
            ClientError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// True when the session is gone and the user must log in again.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized)
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ClientError::Http(_) => ErrorCode::Network,
            ClientError::Unauthorized => ErrorCode::Unauthorized,
            ClientError::Forbidden(_) => ErrorCode::Forbidden,
            ClientError::NotFound(_) => ErrorCode::NotFound,
            ClientError::Validation(_) => ErrorCode::ValidationError,
            ClientError::Api { .. } => ErrorCode::ServerError,
            ClientError::InvalidResponse(_) | ClientError::Serialization(_) => {
                ErrorCode::BadResponse
            }
            ClientError::Config(_) => ErrorCode::Config,
            ClientError::Core(_) => ErrorCode::BusinessRule,
        }
    }

    /// Short text for a banner or toast.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Http(e) if e.is_timeout() => {
                "The server took too long to answer.".to_string()
            }
            ClientError::Http(_) => "Could not reach the server.".to_string(),
            ClientError::Unauthorized => "Your session has expired. Please log in.".to_string(),
            ClientError::Forbidden(_) => "You do not have access to this.".to_string(),
            ClientError::NotFound(_) => "The record no longer exists.".to_string(),
            ClientError::Validation(errors) => errors.to_string(),
            ClientError::Api { message, .. } if !message.is_empty() => message.clone(),
            ClientError::Api { status, .. } => format!("Server error ({}).", status),
            ClientError::InvalidResponse(_) | ClientError::Serialization(_) => {
                "The server sent an unexpected response.".to_string()
            }
            ClientError::Config(msg) => msg.clone(),
            ClientError::Core(err) => err.to_string(),
        }
    }

    /// Field errors to show beside form inputs, if any.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            ClientError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}
