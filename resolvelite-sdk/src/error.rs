//! Error types for the ResolveLite SDK
//!
//! Engine failures are translated per operation: the same engine error can be
//! a [`Error::Record`] during ingest and a [`Error::Search`] during search.

use resolvelite::EngineError;
use thiserror::Error;

/// Errors returned by SDK operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid or unreachable engine configuration; fatal
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed record, unknown data source or missing record in why-analysis
    #[error("Record error: {0}")]
    Record(String),

    /// Malformed search attributes
    #[error("Search error: {0}")]
    Search(String),

    /// The requested record or entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other engine-reported failure
    #[error("Engine error {code}: {message}")]
    Engine { code: u32, message: String },

    /// Response or request document could not be (de)serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for SDK operations
pub type Result<T> = std::result::Result<T, Error>;

/// SDK operation an engine error occurred in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operation {
    Initialize,
    Ingest,
    Lookup,
    Search,
    Path,
    Why,
    Admin,
}

impl Error {
    /// Fatal errors end the session; everything else is per-call
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Configuration(_))
    }

    /// Engine error code, when the engine reported one
    pub fn engine_code(&self) -> Option<u32> {
        match self {
            Error::Engine { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub(crate) fn from_engine(error: EngineError, operation: Operation) -> Self {
        let message = error.to_string();
        match (error, operation) {
            (EngineError::Configuration(_), _) => Error::Configuration(message),
            (EngineError::UnknownDataSource(_), Operation::Lookup) => Error::NotFound(message),
            (e, Operation::Search) if e.is_bad_input() => Error::Search(message),
            (e, Operation::Ingest | Operation::Lookup | Operation::Why) if e.is_bad_input() => {
                Error::Record(message)
            }
            (EngineError::NotFound(_), Operation::Why) => Error::Record(message),
            (EngineError::NotFound(_), _) => Error::NotFound(message),
            (e, _) => Error::Engine {
                code: e.code(),
                message,
            },
        }
    }
}
