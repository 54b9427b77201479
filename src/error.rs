//! Error types for the Storage Cluster Operator
//!
//! Provides structured error types for reconciliation, resource synthesis,
//! and convergence against the Kubernetes API.

use std::time::Duration;
use thiserror::Error;

/// Unified error type for the operator
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // =========================================================================
    // Kubernetes Errors
    // =========================================================================
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("Resource not found: {kind}/{name}")]
    ResourceNotFound { kind: String, name: String },

    #[error("Resource already exists: {kind}/{name}")]
    ResourceExists { kind: String, name: String },

    // =========================================================================
    // Synthesis Errors
    // =========================================================================
    /// The parent StorageCluster is missing a field a synthesizer needs.
    /// Fatal for the current reconciliation attempt; nothing is applied.
    #[error("Synthesis failed for {kind}: {reason}")]
    Synthesis { kind: String, reason: String },

    // =========================================================================
    // Convergence Errors
    // =========================================================================
    /// One or more child resources failed to converge. The successfully
    /// applied subset remains in the cluster; a retry fixes the rest.
    #[error("Convergence failed for {} of the requested resources", .0.len())]
    Converge(Vec<Error>),

    // =========================================================================
    // Parse Errors
    // =========================================================================
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

/// Action to take on error during reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
    /// Requeue with exponential backoff
    RequeueWithBackoff,
    /// Requeue after specific duration
    RequeueAfter(Duration),
    /// Don't requeue, wait for changes
    NoRequeue,
}

impl Error {
    /// Determine what action to take for this error
    pub fn action(&self) -> ErrorAction {
        match self {
            // Transient store errors - retry with backoff
            Error::Kube(_) | Error::ResourceExists { .. } | Error::Converge(_) => {
                ErrorAction::RequeueWithBackoff
            }

            // Incomplete parent state - the status writer fills it in
            // eventually, so retry on a fixed cadence rather than hot-looping
            Error::Synthesis { .. } => ErrorAction::RequeueAfter(Duration::from_secs(30)),

            // Configuration errors - don't retry automatically
            Error::Configuration(_) => ErrorAction::NoRequeue,

            // All other errors - retry with backoff
            _ => ErrorAction::RequeueWithBackoff,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        !matches!(self.action(), ErrorAction::NoRequeue)
    }

    /// Check if this error is a conflict with a concurrent writer
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::ResourceExists { .. })
    }
}

/// Result type alias for the operator
pub type Result<T> = std::result::Result<T, Error>;
