//! Crate error type
//!
//! Source and record failures are absorbed by the pipeline; only
//! `AllSourcesUnavailable` and rejected commands reach the user.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// One remote source failed; it contributes zero records
    #[error("source '{source_name}' unavailable: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    /// Every remote source failed
    #[error("all {attempted} sources unavailable")]
    AllSourcesUnavailable { attempted: usize },

    /// A record was dropped during normalization
    #[error("malformed record {id:?}: {reason}")]
    MalformedRecord {
        id: Option<String>,
        reason: MalformedReason,
    },

    /// 1-based index outside the active offer
    #[error("pathway {index} out of range (1-{available})")]
    PathwayIndexOutOfRange { index: usize, available: usize },

    #[error("not configured: {0}")]
    NotConfigured(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Storage(e.to_string())
    }
}

/// Why a raw record could not become a canonical check-in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum MalformedReason {
    /// Record has no id
    R101_MISSING_ID,
    /// No timestamp candidate field is present
    R102_MISSING_TIMESTAMP,
    /// Timestamp candidates present but none parse
    R103_INVALID_TIMESTAMP,
}

impl MalformedReason {
    /// Get the code string (for logging)
    pub fn code(&self) -> &'static str {
        match self {
            Self::R101_MISSING_ID => "R101_MISSING_ID",
            Self::R102_MISSING_TIMESTAMP => "R102_MISSING_TIMESTAMP",
            Self::R103_INVALID_TIMESTAMP => "R103_INVALID_TIMESTAMP",
        }
    }

    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::R101_MISSING_ID => "Record has no id",
            Self::R102_MISSING_TIMESTAMP => "Record has no timestamp",
            Self::R103_INVALID_TIMESTAMP => "Record timestamp could not be parsed",
        }
    }
}

impl std::fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}
