//! Error types for Flickmeter
//!
//! Two layers live here. The per-concern `thiserror` enums describe what went
//! wrong inside a component, and [`ErrorInfo`] is the flattened value that the
//! query cache stores and hands to retry policies. Every client failure can be
//! turned into an `ErrorInfo` without losing its HTTP status.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app::mutation::MutationKind;
use crate::constants::status;

/// Failure value stored in the query cache
///
/// `cause` carries the HTTP status when the failure came from a response.
/// Retry and fallback decisions dispatch on it, never on `message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub message: String,
    pub cause: Option<u16>,
}

/// Coarse classification of an [`ErrorInfo`] for display decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 401: route to a sign-in affordance, never retried
    Unauthenticated,
    /// 404 on a resource that was expected to exist
    NotFound,
    /// Any other 4xx
    Rejected,
    /// 5xx or a failure that never produced a response
    Transient,
}

impl ErrorInfo {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(message: impl Into<String>, cause: u16) -> Self {
        Self {
            message: message.into(),
            cause: Some(cause),
        }
    }

    pub fn is_unauthenticated(&self) -> bool {
        self.cause == Some(status::UNAUTHORIZED)
    }

    pub fn is_not_found(&self) -> bool {
        self.cause == Some(status::NOT_FOUND)
    }

    pub fn kind(&self) -> ErrorKind {
        match self.cause {
            Some(status::UNAUTHORIZED) => ErrorKind::Unauthenticated,
            Some(status::NOT_FOUND) => ErrorKind::NotFound,
            Some(code) if (400..500).contains(&code) => ErrorKind::Rejected,
            _ => ErrorKind::Transient,
        }
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cause {
            Some(code) => write!(f, "{} (HTTP {})", self.message, code),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ErrorInfo {}

/// Resource client errors
#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport failure before a response arrived
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("{message}")]
    Status { status: u16, message: String },

    /// Response body was not valid JSON for the declared type
    #[error("Failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Body decoded but violated a record invariant
    #[error("Response failed schema validation: {reason}")]
    Schema { reason: String },

    /// URL could not be built from the configured base
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// Client construction failed
    #[error("Invalid client configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl ClientError {
    /// HTTP status attached to this failure, if any
    pub fn cause(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<ClientError> for ErrorInfo {
    fn from(error: ClientError) -> Self {
        ErrorInfo {
            cause: error.cause(),
            message: error.to_string(),
        }
    }
}

impl From<ValidationError> for ErrorInfo {
    fn from(error: ValidationError) -> Self {
        ErrorInfo::new(error.to_string())
    }
}

/// Review draft validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Title required")]
    TitleRequired,

    #[error("Title must be at most {max} characters")]
    TitleTooLong { max: usize },

    #[error("Review must be at most {max} characters")]
    ReviewTooLong { max: usize },

    #[error("Rating must be between {min} and {max}, got {value}")]
    RatingOutOfRange { value: i32, min: i32, max: i32 },
}

/// Write operation errors
///
/// A failed mutation leaves the query cache untouched.
#[derive(Error, Debug, Clone)]
pub enum MutationError {
    /// Draft rejected before any request was sent
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// The request itself failed
    #[error("{kind} failed: {error}")]
    Failed { kind: MutationKind, error: ErrorInfo },
}

impl MutationError {
    /// The underlying request failure, if one was sent
    pub fn error_info(&self) -> Option<&ErrorInfo> {
        match self {
            MutationError::Failed { error, .. } => Some(error),
            MutationError::Invalid(_) => None,
        }
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Configuration file could not be read
    #[error("Failed to read configuration file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration format
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// Could not locate the user configuration directory
    #[error("Could not determine user config directory")]
    NoConfigDir,
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource client error
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Query or mutation failure surfaced from the cache layer
    #[error(transparent)]
    Query(#[from] ErrorInfo),

    /// Review draft rejected before submission
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Write operation failed
    #[error(transparent)]
    Mutation(#[from] MutationError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Check if the error is recoverable (transient)
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Client(e) => match e.cause() {
                Some(code) => code >= 500,
                None => matches!(e, ClientError::Http(_)),
            },
            AppError::Query(info) => info.kind() == ErrorKind::Transient,
            AppError::Mutation(e) => e
                .error_info()
                .is_some_and(|info| info.kind() == ErrorKind::Transient),
            AppError::Validation(_) | AppError::Config(_) => false,
            _ => false,
        }
    }

    /// Whether the failure means nobody is signed in
    pub fn is_unauthenticated(&self) -> bool {
        match self {
            AppError::Client(e) => e.cause() == Some(status::UNAUTHORIZED),
            AppError::Query(info) => info.is_unauthenticated(),
            AppError::Mutation(e) => e.error_info().is_some_and(ErrorInfo::is_unauthenticated),
            _ => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        if self.is_unauthenticated() {
            return "authentication";
        }
        match self {
            AppError::Client(_) => "client",
            AppError::Query(_) => "query",
            AppError::Validation(_) | AppError::Mutation(MutationError::Invalid(_)) => {
                "validation"
            }
            AppError::Mutation(_) => "mutation",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Resource client result type alias
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Mutation result type alias
pub type MutationResult<T> = std::result::Result<T, MutationError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
