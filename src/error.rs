//! Error types for the Halberd library.
//!
//! Two layers of failure are distinguished: [`Error`] is what callers of the
//! catalog client see, and [`EngineError`] is what search-engine
//! implementations produce. Engine failures encountered during a query
//! round-trip are wrapped into [`Error::QueryExecution`] so the caller keeps
//! the transport cause without losing the query context.
//!
//! # Examples
//!
//! ```
//! use halberd::error::{Error, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(Error::invalid_query("Start index must be greater than 0"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for catalog client operations.
///
/// Malformed requests are rejected with [`Error::InvalidQuery`] before any
/// engine call is made. Engine failures during a query are wrapped in
/// [`Error::QueryExecution`]; engine failures on write paths pass through as
/// [`Error::Engine`].
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed request (missing query, non-positive start index, conflicting options).
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// An engine round-trip failed while executing a query.
    #[error("Query execution failed: {message}")]
    QueryExecution {
        message: String,
        #[source]
        source: EngineError,
    },

    /// A returned document could not be converted into a domain record.
    #[error("Record creation failed: {0}")]
    RecordCreation(String),

    /// Engine failure outside a query round-trip (add, delete, commit).
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Errors produced by search-engine implementations.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The engine could not be reached or the connection failed mid-request.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The engine answered with something this client cannot interpret.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// I/O errors (sockets, local spooling).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Wire payload could not be serialized or deserialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other engine failures.
    #[error("Error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Result type alias for engine-level operations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;

impl Error {
    /// Create a new invalid-query error.
    pub fn invalid_query<S: Into<String>>(msg: S) -> Self {
        Error::InvalidQuery(msg.into())
    }

    /// Create a new query-execution error wrapping an engine failure.
    pub fn query_execution<S: Into<String>>(msg: S, source: EngineError) -> Self {
        Error::QueryExecution {
            message: msg.into(),
            source,
        }
    }

    /// Create a new record-creation error.
    pub fn record_creation<S: Into<String>>(msg: S) -> Self {
        Error::RecordCreation(msg.into())
    }
}

impl EngineError {
    /// Create a new transport error.
    pub fn transport<S: Into<String>>(msg: S) -> Self {
        EngineError::Transport(msg.into())
    }

    /// Create a new protocol error.
    pub fn protocol<S: Into<String>>(msg: S) -> Self {
        EngineError::Protocol(msg.into())
    }
}
