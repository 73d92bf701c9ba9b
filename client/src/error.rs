//! Error handling for the Battery Health certificate client
//!
//! `ApiError` classifies failures of the remote certificate service;
//! `AppError` is what operations on the session, store and pipelines return.

use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single call to the certificate service
#[derive(Error, Debug)]
pub enum ApiError {
    /// The service no longer accepts the session token
    #[error("Session expired. Please login again.")]
    SessionExpired,

    #[error("Login failed: {0}")]
    LoginFailed(String),

    /// Non-success response other than an auth failure
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    /// Success response that carried no usable data
    #[error("No data extracted from PDF")]
    NoData,

    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    #[error("{0}")]
    Transport(#[from] reqwest::Error),
}

impl ApiError {
    /// Whether this failure ends the session rather than a single item
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::SessionExpired)
    }

    /// Short reason recorded against a failed batch item
    pub fn reason(&self) -> String {
        match self {
            ApiError::Transport(e) if e.is_timeout() => "Request timed out".to_string(),
            other => other.to_string(),
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Not logged in")]
    NotAuthenticated,

    #[error("No certificates to generate")]
    NoCertificates,

    #[error("No valid certificates to generate. Please fix validation errors.")]
    NoValidCertificates,

    #[error("Please fix validation errors before generating:\n\n• {}", .0.join("\n• "))]
    ValidationFailed(Vec<String>),

    #[error("Cancelled by operator")]
    Cancelled,
}

impl AppError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIGURATION_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Api(ApiError::SessionExpired) => "SESSION_EXPIRED",
            AppError::Api(ApiError::LoginFailed(_)) => "LOGIN_FAILED",
            AppError::Api(_) => "EXTERNAL_SERVICE_ERROR",
            AppError::NotAuthenticated => "NOT_AUTHENTICATED",
            AppError::NoCertificates => "NO_CERTIFICATES",
            AppError::NoValidCertificates => "NO_VALID_CERTIFICATES",
            AppError::ValidationFailed(_) => "VALIDATION_ERROR",
            AppError::Cancelled => "CANCELLED",
        }
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, AppError::Api(e) if e.is_auth_failure())
    }
}

/// Result type alias for client operations
pub type AppResult<T> = Result<T, AppError>;
