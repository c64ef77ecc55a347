//! Ingestion error types

use contracts::ContractError;
use thiserror::Error;

/// Ingestion errors
#[derive(Debug, Error)]
pub enum IngestionError {
    /// The external stream could not be opened
    #[error("failed to start source {source_id}")]
    SourceFailed {
        source_id: String,
        #[source]
        cause: ContractError,
    },

    /// Source already registered under this id
    #[error("source {source_id} is already registered")]
    DuplicateSource { source_id: String },

    /// Adapter is already listening
    #[error("source {source_id} is already listening")]
    AlreadyListening { source_id: String },

    /// No adapter registered under this id
    #[error("unknown source {source_id}")]
    UnknownSource { source_id: String },
}

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, IngestionError>;
