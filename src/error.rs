//! Error types for serena-hooks
//!
//! Centralized error handling using thiserror. None of these reach the host
//! directly: the hook runtime resolves every error to an allow or block decision.

use std::path::PathBuf;

use thiserror::Error;

/// All error types that can occur while handling a hook event
#[derive(Debug, Error)]
pub enum HookError {
    /// Marker file exists but could not be read or parsed
    #[error("Marker unreadable at {}: {reason}", .path.display())]
    MarkerUnreadable { path: PathBuf, reason: String },

    /// Another process held the marker lock through the retry
    #[error("Marker lock contended: {}", .0.display())]
    MarkerLockContention(PathBuf),

    /// Hook payload on stdin was not a valid event
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for serena-hooks operations
pub type Result<T> = std::result::Result<T, HookError>;
