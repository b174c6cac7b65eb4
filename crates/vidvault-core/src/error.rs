//! Error types shared by every Vidvault crate.
//!
//! `AppError` is the single failure type of the upload, counter and lifecycle paths.
//! Each variant carries a fixed `Presentation` (status, code, retry hint, sensitivity,
//! log level) that the HTTP layer reads through `ErrorMetadata`.
//!
//! The `Database` variant wraps `sqlx::Error` only with the `sqlx` feature.

use std::io;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Client mistakes and expected rejections
    Debug,
    /// Aborted uploads and degraded dependencies
    Warn,
    /// Server-side faults
    Error,
}

/// How an error is rendered to clients and logged
pub trait ErrorMetadata {
    fn http_status_code(&self) -> u16;

    /// Stable upper-case code, e.g. `MALFORMED_COMPLETION`
    fn error_code(&self) -> &'static str;

    /// The same request may succeed later
    fn is_recoverable(&self) -> bool;

    fn suggested_action(&self) -> Option<&'static str>;

    /// Message safe to show the client
    fn client_message(&self) -> String;

    /// Internal details must not leave the server
    fn is_sensitive(&self) -> bool;

    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// The completion request could not be routed; every staged artifact of the video was discarded.
    #[error("Malformed completion: {0}")]
    MalformedCompletion(String),

    /// The staged blob could not be moved into place. The blob is kept so the client may retry.
    #[error("Relocation failed: {0}")]
    RelocationFailed(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("I/O failure: {}", err))
    }
}

/// Fixed rendering of one error class
#[derive(Debug, Clone, Copy)]
struct Presentation {
    status: u16,
    code: &'static str,
    retry: bool,
    action: Option<&'static str>,
    sensitive: bool,
    level: LogLevel,
}

const RETRY_LATER: Option<&str> = Some("Retry after a short delay");

const SERVER_FAULT: Presentation = Presentation {
    status: 500,
    code: "INTERNAL_ERROR",
    retry: true,
    action: RETRY_LATER,
    sensitive: true,
    level: LogLevel::Error,
};

const CLIENT_FAULT: Presentation = Presentation {
    status: 400,
    code: "INVALID_INPUT",
    retry: false,
    action: Some("Fix the request and send it again"),
    sensitive: false,
    level: LogLevel::Debug,
};

impl AppError {
    fn presentation(&self) -> Presentation {
        match self {
            AppError::Database(_) => Presentation {
                code: "DATABASE_ERROR",
                ..SERVER_FAULT
            },
            AppError::Storage(_) => Presentation {
                code: "STORAGE_ERROR",
                ..SERVER_FAULT
            },
            AppError::Internal(_) | AppError::InternalWithSource { .. } => SERVER_FAULT,
            AppError::InvalidInput(_) => CLIENT_FAULT,
            AppError::BadRequest(_) => Presentation {
                code: "BAD_REQUEST",
                ..CLIENT_FAULT
            },
            AppError::NotFound(_) => Presentation {
                status: 404,
                code: "NOT_FOUND",
                action: Some("Check the video id"),
                ..CLIENT_FAULT
            },
            AppError::Unauthorized(_) => Presentation {
                status: 401,
                code: "UNAUTHORIZED",
                action: Some("Sign in with the account that owns this video"),
                ..CLIENT_FAULT
            },
            AppError::Conflict(_) => Presentation {
                status: 409,
                code: "CONFLICT",
                action: Some("Resume from the offset reported by the server"),
                ..CLIENT_FAULT
            },
            AppError::PayloadTooLarge(_) => Presentation {
                status: 413,
                code: "PAYLOAD_TOO_LARGE",
                action: Some("Send smaller chunks"),
                ..CLIENT_FAULT
            },
            AppError::MalformedCompletion(_) => Presentation {
                code: "MALFORMED_COMPLETION",
                action: Some("Restart the upload with a valid file name and kind"),
                level: LogLevel::Warn,
                ..CLIENT_FAULT
            },
            AppError::RelocationFailed(_) => Presentation {
                status: 503,
                code: "RELOCATION_FAILED",
                action: Some("Retry the completion request"),
                ..SERVER_FAULT
            },
            AppError::ServiceUnavailable(_) => Presentation {
                status: 503,
                code: "SERVICE_UNAVAILABLE",
                sensitive: false,
                level: LogLevel::Warn,
                ..SERVER_FAULT
            },
        }
    }

    /// Variant name, shown with error details outside production
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Database(_) => "Database",
            AppError::Storage(_) => "Storage",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::BadRequest(_) => "BadRequest",
            AppError::NotFound(_) => "NotFound",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::Conflict(_) => "Conflict",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::MalformedCompletion(_) => "MalformedCompletion",
            AppError::RelocationFailed(_) => "RelocationFailed",
            AppError::ServiceUnavailable(_) => "ServiceUnavailable",
            AppError::Internal(_) | AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// The error followed by up to five causes, one per line
    pub fn detailed_message(&self) -> String {
        const MAX_CAUSES: usize = 5;

        let mut causes =
            std::iter::successors(std::error::Error::source(self), |err| err.source());
        let mut details = self.to_string();
        for cause in causes.by_ref().take(MAX_CAUSES) {
            details.push_str(&format!("\n  Caused by: {}", cause));
        }
        if causes.next().is_some() {
            details.push_str("\n  ... (truncated)");
        }
        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        self.presentation().status
    }

    fn error_code(&self) -> &'static str {
        self.presentation().code
    }

    fn is_recoverable(&self) -> bool {
        self.presentation().retry
    }

    fn suggested_action(&self) -> Option<&'static str> {
        self.presentation().action
    }

    fn is_sensitive(&self) -> bool {
        self.presentation().sensitive
    }

    fn log_level(&self) -> LogLevel {
        self.presentation().level
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Database(_) => "Failed to access database".to_string(),
            AppError::Storage(_) => "Failed to access storage".to_string(),
            AppError::RelocationFailed(_) => "Failed to place uploaded file".to_string(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
            AppError::InvalidInput(msg)
            | AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::Unauthorized(msg)
            | AppError::Conflict(msg)
            | AppError::PayloadTooLarge(msg)
            | AppError::MalformedCompletion(msg)
            | AppError::ServiceUnavailable(msg) => msg.clone(),
        }
    }
}
