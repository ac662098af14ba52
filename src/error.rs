//! Error types for the schoolbus-desk library.
//!
//! This module provides custom error types using `thiserror`. Controllers turn
//! the recoverable kinds (validation, not-found, network) into notices and
//! leave the store untouched; storage and configuration errors propagate.

use thiserror::Error;

use crate::view::Region;

/// Errors that can occur in the schoolbus-desk application.
#[derive(Error, Debug)]
pub enum DeskError {
    /// Embedded key-value store errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// A required view region was not provided by the page
    #[error("Missing view binding: {0:?} is required by the {1} dashboard")]
    MissingBinding(Region, &'static str),

    /// A form field failed validation
    #[error("Invalid {field}: {message}")]
    Validation {
        /// Form field name
        field: &'static str,
        /// Human readable reason
        message: String,
    },

    /// Edit, delete or status-update target no longer exists
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind ("Student", "Bus", ...)
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// Access denied by the session guard
    #[error("Access denied for role {0}; redirect to {1}")]
    AccessDenied(String, String),

    /// A submission is already in flight for this form
    #[error("A request is already in progress")]
    SubmitInFlight,

    /// Backend API failure (connection or non-success response)
    #[error("Network error: {0}")]
    Network(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV export errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// General error with context
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Result with `DeskError`
pub type Result<T> = std::result::Result<T, DeskError>;

impl DeskError {
    /// Shorthand for a validation failure on one field.
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Shorthand for a vanished edit/delete target.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Short label used as the `type` of the error counter
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Storage(_) => "storage",
            Self::MissingBinding(..) => "missing_binding",
            Self::Validation { .. } => "validation",
            Self::NotFound { .. } => "not_found",
            Self::AccessDenied(..) => "access_denied",
            Self::SubmitInFlight => "submit_in_flight",
            Self::Network(_) => "network",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
            Self::Csv(_) => "csv",
            Self::InvalidConfig(_) => "config",
            Self::Other(_) => "other",
        }
    }

    /// Whether the failure leaves the store unchanged and should only be shown
    /// to the user.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::NotFound { .. }
                | Self::Network(_)
                | Self::SubmitInFlight
                | Self::AccessDenied(..)
        )
    }
}

impl From<anyhow::Error> for DeskError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<sled::Error> for DeskError {
    fn from(err: sled::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<reqwest::Error> for DeskError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<config::ConfigError> for DeskError {
    fn from(err: config::ConfigError) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}
