//! Error types for the staging pipeline

use thiserror::Error;

/// Errors surfaced by the staging controller and wrap tasks.
///
/// Every variant except [`StagingError::TaskPanicked`] is recoverable and
/// leaves the shared mesh state exactly as it was before the failed call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StagingError {
    #[error("Invalid parameter: {name} = {value} (must be finite and positive)")]
    InvalidParameter { name: &'static str, value: f32 },

    #[error("Empty or degenerate input: {0}")]
    EmptyOrDegenerateInput(String),

    #[error("Geometry failure: {0}")]
    GeometryFailure(String),

    #[error("A wrap task is already running")]
    TaskAlreadyRunning,

    #[error("The wrap computation has started and cannot be cancelled")]
    CannotCancel,

    #[error("The wrap was cancelled before it started")]
    Cancelled,

    #[error("No preview mesh has been published yet")]
    NoPreview,

    #[error("Wrap task panicked: {0}")]
    TaskPanicked(String),
}

/// Result type alias for staging operations
pub type Result<T> = std::result::Result<T, StagingError>;

impl From<wrapview_core::Error> for StagingError {
    fn from(e: wrapview_core::Error) -> Self {
        StagingError::GeometryFailure(e.to_string())
    }
}
