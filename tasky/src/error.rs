//! Error types and HTTP response conversion

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Structured Store Errors
// ============================================================================

/// Store operation being performed when the error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    /// Establishing the client connection
    Connect,
    /// Round-trip health check
    Ping,
    /// Inserting a document
    Insert,
    /// Reading one or more documents
    Find,
    /// Counting documents
    Count,
    /// Updating a document
    Update,
    /// Deleting a document
    Delete,
    /// Declaring tables, fields and indexes
    DefineSchema,
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => write!(f, "connect"),
            Self::Ping => write!(f, "ping"),
            Self::Insert => write!(f, "insert"),
            Self::Find => write!(f, "find"),
            Self::Count => write!(f, "count"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
            Self::DefineSchema => write!(f, "define schema"),
        }
    }
}

/// Category of store error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreErrorKind {
    /// Failed to establish or keep the connection
    ConnectionFailed,
    /// Credentials were rejected
    Authentication,
    /// Query execution failed
    QueryFailed,
    /// A document could not be encoded or decoded
    Serialization,
    /// Operation exceeded its deadline
    Timeout,
    /// Other/unknown error
    Other,
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionFailed => write!(f, "connection_failed"),
            Self::Authentication => write!(f, "authentication"),
            Self::QueryFailed => write!(f, "query_failed"),
            Self::Serialization => write!(f, "serialization"),
            Self::Timeout => write!(f, "timeout"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Structured store error with operation context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    /// The operation being performed when the error occurred
    pub operation: StoreOperation,
    /// The category of error
    pub kind: StoreErrorKind,
    /// Human-readable error message
    pub message: String,
    /// Collection the operation targeted, when there is one
    pub collection: Option<String>,
}

impl StoreError {
    /// Create a new store error
    pub fn new(operation: StoreOperation, kind: StoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            collection: None,
        }
    }

    /// Connection-level failure
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::new(
            StoreOperation::Connect,
            StoreErrorKind::ConnectionFailed,
            message,
        )
    }

    /// Deadline exceeded
    pub fn timeout(operation: StoreOperation, deadline: Duration) -> Self {
        Self::new(
            operation,
            StoreErrorKind::Timeout,
            format!("operation exceeded {}ms deadline", deadline.as_millis()),
        )
    }

    /// Document encode/decode failure
    pub fn serialization(operation: StoreOperation, message: impl Into<String>) -> Self {
        Self::new(operation, StoreErrorKind::Serialization, message)
    }

    /// Attach the target collection
    pub fn in_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    /// Whether retrying the same call could succeed
    pub fn is_retriable(&self) -> bool {
        matches!(
            self.kind,
            StoreErrorKind::ConnectionFailed | StoreErrorKind::Timeout
        )
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Store {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        if let Some(ref collection) = self.collection {
            write!(f, " [collection: {}]", collection)?;
        }
        Ok(())
    }
}

impl std::error::Error for StoreError {}

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Remove credentials from a connection URL before logging it
pub fn sanitize_url(url: &str) -> String {
    if let Some(at_pos) = url.rfind('@') {
        if let Some(scheme_end) = url.find("://") {
            if at_pos > scheme_end {
                let scheme = &url[..scheme_end + 3];
                let after_at = &url[at_pos + 1..];
                return format!("{}<redacted>@{}", scheme, after_at);
            }
        }
    }
    url.to_string()
}

// ============================================================================
// Service Errors
// ============================================================================

/// Result type alias using the service error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the service
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// Store failure, reported to the client with a fixed message
    #[error("{context}: {source}")]
    Store {
        /// Message returned to the client
        context: String,
        /// Underlying driver failure, logged only
        #[source]
        source: StoreError,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl Error {
    /// Wrap a store failure with the message the client should see
    pub fn store(context: impl Into<String>, source: StoreError) -> Self {
        Error::Store {
            context: context.into(),
            source,
        }
    }

    /// HTTP status this error maps to
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::Config(_) | Error::Store { .. } | Error::Io(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub message: String,

    /// HTTP status code
    pub status: u16,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: status.as_u16(),
        }
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match self {
            Error::Store { context, source } => {
                tracing::error!(
                    operation = %source.operation,
                    kind = %source.kind,
                    collection = source.collection.as_deref().unwrap_or("-"),
                    error = %source.message,
                    "{}",
                    context
                );
                context
            }
            Error::Config(e) => {
                tracing::error!(error = %e, "Configuration error while serving request");
                "Internal server error".to_string()
            }
            Error::Io(e) => {
                tracing::error!(error = %e, "I/O error while serving request");
                "Internal server error".to_string()
            }
            Error::Internal(message) | Error::NotFound(message) | Error::BadRequest(message) => {
                message
            }
        };

        (status, Json(ErrorResponse::new(status, message))).into_response()
    }
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}
