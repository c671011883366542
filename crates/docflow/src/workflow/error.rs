use thiserror::Error;

use crate::db::DatabaseError;
use crate::error::{CapabilityError, StorageError};

/// Why a single step failed. Never aborts a run by itself: the executor
/// reports it as a failed step and keeps going.
#[derive(Error, Debug)]
pub enum StepError {
    #[error(transparent)]
    Capability(#[from] CapabilityError),

    #[error("Failed to store artifact: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to persist result: {0}")]
    Database(#[from] DatabaseError),

    #[error("Source file not found: {0}")]
    SourceMissing(String),

    #[error("Store refused to record {0}")]
    Rejected(&'static str),

    /// The record disappeared between planning and execution.
    #[error("Document no longer exists")]
    Vanished,
}
