//! # Client Error Types
//!
//! Error types for SDK calls.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Client Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  RPC Status     │  │   Transport     │  │     Configuration       │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │ InvalidArgument │  │ InvalidEndpoint │  │  InvalidConfig          │ │
//! │  │ Rpc {code, msg} │  │ Connection      │  │  ConfigLoadFailed       │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐                              │
//! │  │    Decoding     │  │   Callbacks     │                              │
//! │  │                 │  │                 │                              │
//! │  │ MissingField    │  │ StreamNotRunning│                              │
//! │  │ Core(CoreError) │  │                 │                              │
//! │  └─────────────────┘  └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Status Mapping
//! A non-OK gRPC status becomes [`ClientError::InvalidArgument`] when its
//! code is `INVALID_ARGUMENT` and [`ClientError::Rpc`] for every other code.
//! Calls are never retried.

use octane_core::CoreError;
use thiserror::Error;
use tonic::{Code, Status};

/// Result type alias for SDK calls.
pub type ClientResult<T> = Result<T, ClientError>;

/// Every failure an SDK call can report.
#[derive(Debug, Error)]
pub enum ClientError {
    // =========================================================================
    // RPC Status Errors
    // =========================================================================
    /// The engine rejected an argument (unknown handle, wrong object type,
    /// unknown pin, mismatched value kind).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Any other non-OK status.
    #[error("RPC failed with {code:?}: {message}")]
    Rpc { code: Code, message: String },

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// Endpoint URL could not be parsed or used.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Could not reach the engine.
    #[error("Connection failed: {0}")]
    Connection(String),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Decoding Errors
    // =========================================================================
    /// A required message field was absent from a response.
    #[error("Response is missing field `{0}`")]
    MissingField(&'static str),

    /// A response carried a value the core types reject.
    #[error(transparent)]
    Core(#[from] CoreError),

    // =========================================================================
    // Callback Errors
    // =========================================================================
    /// A callback was set while no callback stream is running, so it could
    /// never fire.
    #[error("Callback stream is not running; call start_callback_stream() first")]
    StreamNotRunning,
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<Status> for ClientError {
    fn from(status: Status) -> Self {
        match status.code() {
            Code::InvalidArgument => ClientError::InvalidArgument(status.message().to_string()),
            code => ClientError::Rpc {
                code,
                message: status.message().to_string(),
            },
        }
    }
}

impl From<tonic::transport::Error> for ClientError {
    fn from(err: tonic::transport::Error) -> Self {
        ClientError::Connection(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidEndpoint(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ClientError {
    fn from(err: toml::ser::Error) -> Self {
        ClientError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl ClientError {
    /// True for errors raised from an `INVALID_ARGUMENT` status.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, ClientError::InvalidArgument(_))
    }

    /// True for every other RPC failure.
    pub fn is_runtime(&self) -> bool {
        matches!(self, ClientError::Rpc { .. })
    }

    /// The gRPC status code behind this error, if it came from one.
    pub fn code(&self) -> Option<Code> {
        match self {
            ClientError::InvalidArgument(_) => Some(Code::InvalidArgument),
            ClientError::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// True if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ClientError::InvalidConfig(_)
                | ClientError::InvalidEndpoint(_)
                | ClientError::ConfigLoadFailed(_)
                | ClientError::ConfigSaveFailed(_)
        )
    }
}
