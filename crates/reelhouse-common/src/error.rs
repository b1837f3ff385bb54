//! Common error types used throughout reelhouse.
//!
//! This module provides a unified error type covering the failure cases of
//! the ingestion pipeline and streaming server: client errors (invalid names,
//! unsupported types, oversized payloads), storage failures, and internal
//! invariant violations.

use crate::ids::AssetId;
use crate::types::AssetStatus;

/// Common error type for reelhouse.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested asset was not found.
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// The declared upload name is empty or contains forbidden characters.
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// The upload's container extension is not on the allow-list.
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// The upload exceeds the configured size limit.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// An asset id already exists in the catalog. Internal invariant
    /// violation: ids come from storage allocation and must be unique.
    #[error("Duplicate asset id: {0}")]
    DuplicateId(AssetId),

    /// A status update attempted to move backward or skip a state.
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: AssetStatus, to: AssetStatus },

    /// The storage layout could not persist or remove bytes.
    #[error("Storage error: {0}")]
    Storage(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new NotFound error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new InvalidName error.
    pub fn invalid_name<S: Into<String>>(msg: S) -> Self {
        Self::InvalidName(msg.into())
    }

    /// Create a new UnsupportedType error.
    pub fn unsupported_type<S: Into<String>>(msg: S) -> Self {
        Self::UnsupportedType(msg.into())
    }

    /// Create a new PayloadTooLarge error.
    pub fn payload_too_large<S: Into<String>>(msg: S) -> Self {
        Self::PayloadTooLarge(msg.into())
    }

    /// Create a new Storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a new Internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// HTTP status code this error maps to at the API boundary.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::InvalidName(_) | Self::UnsupportedType(_) => 400,
            Self::PayloadTooLarge(_) => 413,
            Self::DuplicateId(_)
            | Self::InvalidTransition { .. }
            | Self::Storage(_)
            | Self::Io(_)
            | Self::Internal(_) => 500,
        }
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
