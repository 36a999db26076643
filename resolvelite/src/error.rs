// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Engine error types
//!
//! Every backend reports failures through [`EngineError`]. The variants mirror
//! the error families an entity-resolution engine distinguishes, so that the
//! client can map them onto its own per-operation taxonomy.

use crate::storage::StorageError;
use thiserror::Error;

/// Errors reported by an engine backend
#[derive(Error, Debug)]
pub enum EngineError {
    /// Invalid or unreachable configuration; fatal, never retried
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed request input (record definition, attributes, identifiers)
    #[error("Bad input: {0}")]
    BadInput(String),

    /// The referenced record or entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The data source code has not been registered
    #[error("Unknown data source: {0}")]
    UnknownDataSource(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The backend has been destroyed or was never initialized
    #[error("Engine not initialized: {0}")]
    NotInitialized(String),

    #[error("Unrecoverable engine error: {0}")]
    Unrecoverable(String),
}

impl EngineError {
    /// Stable numeric code for the error family
    pub fn code(&self) -> u32 {
        match self {
            EngineError::Configuration(_) => 14,
            EngineError::BadInput(_) => 7,
            EngineError::NotFound(_) => 33,
            EngineError::UnknownDataSource(_) => 27,
            EngineError::Storage(_) => 1007,
            EngineError::Serialization(_) => 9,
            EngineError::NotInitialized(_) => 48,
            EngineError::Unrecoverable(_) => 999,
        }
    }

    /// True when the error was caused by the request rather than the engine
    pub fn is_bad_input(&self) -> bool {
        matches!(
            self,
            EngineError::BadInput(_) | EngineError::UnknownDataSource(_)
        )
    }
}

impl From<StorageError> for EngineError {
    fn from(error: StorageError) -> Self {
        EngineError::Storage(error.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(error: serde_json::Error) -> Self {
        EngineError::Serialization(error.to_string())
    }
}

impl From<bincode::Error> for EngineError {
    fn from(error: bincode::Error) -> Self {
        EngineError::Serialization(error.to_string())
    }
}

/// Result type for backend operations
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_input_family() {
        assert!(EngineError::BadInput("x".into()).is_bad_input());
        assert!(EngineError::UnknownDataSource("X".into()).is_bad_input());
        assert!(!EngineError::NotFound("x".into()).is_bad_input());
    }

    #[test]
    fn test_codes_are_distinct() {
        let codes = [
            EngineError::Configuration(String::new()).code(),
            EngineError::BadInput(String::new()).code(),
            EngineError::NotFound(String::new()).code(),
            EngineError::UnknownDataSource(String::new()).code(),
            EngineError::Storage(String::new()).code(),
            EngineError::Serialization(String::new()).code(),
            EngineError::NotInitialized(String::new()).code(),
            EngineError::Unrecoverable(String::new()).code(),
        ];
        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), codes.len());
    }
}
