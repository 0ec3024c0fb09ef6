//! # Sync Error Types
//!
//! Error types for connectivity, remote API and coordinator operations.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Remote API          │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Connection     │  │  RemoteRejected         │ │
//! │  │  InvalidUrl     │  │  Timeout        │  │  HttpStatus             │ │
//! │  │  ConfigLoad/Save│  │                 │  │  InvalidResponse        │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │    Database     │  │   Validation    │  │     Internal            │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  DatabaseError  │  │  Validation     │  │  ShuttingDown           │ │
//! │  │                 │  │                 │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The coordinator never lets these escape from a submission: a failed
//! create becomes `SubmissionOutcome::Failed` and a failed fetch becomes an
//! empty list. Callers only see `Validation` and `ShuttingDown` from the
//! handle.

use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Sync error type covering all possible sync failures.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid client configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid API URL.
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// Could not reach the API.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Request did not finish in time.
    #[error("Request timed out: {0}")]
    Timeout(String),

    // =========================================================================
    // Remote API Errors
    // =========================================================================
    /// The API answered with a non-success HTTP status.
    #[error("API returned HTTP {0}")]
    HttpStatus(u16),

    /// The API answered `{"success": false}`.
    #[error("API rejected the product")]
    RemoteRejected,

    /// The response body was not what the API contract promises.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Failed to serialize a request body.
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    // =========================================================================
    // Local Errors
    // =========================================================================
    /// Offline store operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Product input rejected before any I/O.
    #[error(transparent)]
    Validation(#[from] catalog_core::ValidationError),

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Coordinator is shutting down.
    #[error("Submission coordinator is shutting down")]
    ShuttingDown,
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<catalog_db::DbError> for SyncError {
    fn from(err: catalog_db::DbError) -> Self {
        SyncError::DatabaseError(err.to_string())
    }
}

/// Convert reqwest errors to SyncError.
///
/// ## Error Mapping
/// ```text
/// timeout          → SyncError::Timeout
/// connect failure  → SyncError::ConnectionFailed
/// bad status       → SyncError::HttpStatus
/// body decode      → SyncError::InvalidResponse
/// other            → SyncError::ConnectionFailed
/// ```
impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SyncError::Timeout(err.to_string())
        } else if err.is_connect() {
            SyncError::ConnectionFailed(err.to_string())
        } else if let Some(status) = err.status() {
            SyncError::HttpStatus(status.as_u16())
        } else if err.is_decode() {
            SyncError::InvalidResponse(err.to_string())
        } else {
            SyncError::ConnectionFailed(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::InvalidResponse(err.to_string())
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl SyncError {
    /// Returns true if a later attempt could succeed without any change on
    /// the client side.
    ///
    /// ## Retryable Errors
    /// - Connection failures and timeouts
    /// - 5xx responses
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::ConnectionFailed(_) | SyncError::Timeout(_) => true,
            SyncError::HttpStatus(code) => *code >= 500,
            _ => false,
        }
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidConfig(_)
                | SyncError::InvalidUrl(_)
                | SyncError::ConfigLoadFailed(_)
                | SyncError::ConfigSaveFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(SyncError::ConnectionFailed("refused".into()).is_retryable());
        assert!(SyncError::Timeout("30s".into()).is_retryable());
        assert!(SyncError::HttpStatus(503).is_retryable());

        assert!(!SyncError::HttpStatus(400).is_retryable());
        assert!(!SyncError::RemoteRejected.is_retryable());
        assert!(!SyncError::InvalidConfig("bad".into()).is_retryable());
    }

    #[test]
    fn test_config_errors() {
        assert!(SyncError::InvalidUrl("x".into()).is_config_error());
        assert!(!SyncError::ShuttingDown.is_config_error());
    }

    #[test]
    fn test_validation_error_is_transparent() {
        let err = SyncError::from(catalog_core::ValidationError::Required {
            field: "product_name".into(),
        });
        assert!(err.to_string().contains("product_name"));
    }
}
