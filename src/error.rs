use thiserror::Error;

/// Structured failures from a positioning backend. Only `PermissionDenied`
/// ends a live session; the other two are transient and the subscription
/// keeps running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FeedError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable")]
    Unavailable,
    #[error("location fix timed out")]
    Timeout,
}

/// Failures of the stop-time spatial analysis. Per-layer query failures are
/// not represented here; those degrade to zero results for the layer.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("a route needs at least two points")]
    InsufficientRoute,
    #[error("geometry construction failed: {0}")]
    Geometry(String),
}

/// Failures talking to the host application.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("host bridge unavailable")]
    Unavailable,
    #[error("host bridge call failed: {0}")]
    Call(String),
}

/// Session-level failure taxonomy. Every variant reaches the caller both as
/// a typed error and as a `Message` event, and none of them leaves the
/// tracking flag or the rendered route inconsistent with the reported state.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a tracking session is already active")]
    AlreadyTracking,
    #[error("no tracking session is active")]
    NotTracking,
    #[error("not enough trajectory points (have {have}, need at least 2)")]
    InsufficientPoints { have: usize },
    #[error("artifact has no screenshot")]
    MissingScreenshot,
    #[error("no stored artifact to resend")]
    NoStoredArtifact,
    #[error("stored artifact is incomplete: {0}")]
    IncompleteArtifact(&'static str),
    #[error("submission bridge unavailable")]
    SubmissionUnavailable,
    #[error("submission failed: {0}")]
    Submission(String),
    #[error("artifact encoding failed: {0}")]
    Encoding(String),
    #[error("view operation failed: {0}")]
    Render(String),
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}
