//! Error types for rendering and directory lookups.

use std::time::Duration;

/// Error reported by a [`Directory`](crate::Directory) lookup.
#[derive(Clone, Debug, thiserror::Error)]
pub enum DirectoryError {
    /// A single lookup failed; other lookups may still succeed.
    #[error("Directory lookup failed: {0}")]
    Lookup(String),
    /// The lookup did not complete within the job's timeout.
    #[error("Directory lookup timed out after {0:?}")]
    Timeout(Duration),
    /// The directory cannot be reached at all.
    #[error("Directory unavailable: {0}")]
    Unavailable(String),
}

/// Job-level rendering error.
///
/// Per-token failures never surface here; they degrade to fallback text.
#[derive(Clone, Debug, thiserror::Error)]
pub enum RenderError {
    /// The directory reported itself unreachable during the job.
    #[error("Directory unavailable during render: {0}")]
    DirectoryUnavailable(String),
}
