/// Error types for the thumbnail service
///
/// Pre-flight problems are [`ValidationError`]s and never reach the pipeline.
/// Everything that goes wrong inside a run is a [`PipelineFailure`] tagged
/// with the stage that failed.
use s3_utils::{ObjectRef, StorageError};
use std::fmt;
use thiserror::Error;

/// Flat tag for any failure the service can report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    AccessDenied,
    Rejected,
    TransientIo,
    DecodeError,
    EncodeError,
    Aborted,
    InvalidDimensions,
    InvalidRequest,
}

/// Image decode/resize/encode failures
#[derive(Debug, Error)]
pub enum TransformError {
    /// Source bytes are not a supported raster; retrying will not help
    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("failed to encode image: {0}")]
    Encode(String),

    /// The blocking worker running the transform panicked or was cancelled
    #[error("transform task aborted: {0}")]
    Aborted(String),
}

impl TransformError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Decode(_) => ErrorKind::DecodeError,
            Self::Encode(_) => ErrorKind::EncodeError,
            Self::Aborted(_) => ErrorKind::Aborted,
        }
    }
}

/// Caller errors rejected before any fetch
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid dimensions {width}x{height}: each side must be between 1 and {max}")]
    InvalidDimensions { width: u32, height: u32, max: u32 },

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ValidationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidDimensions { .. } => ErrorKind::InvalidDimensions,
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
        }
    }
}

/// Pipeline stage a failure is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Fetch,
    Transform,
    Upload,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fetch => "fetch",
            Self::Transform => "transform",
            Self::Upload => "upload",
        })
    }
}

#[derive(Debug, Error)]
pub enum FailureCause {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Transform(#[from] TransformError),
}

impl FailureCause {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Storage(StorageError::NotFound { .. }) => ErrorKind::NotFound,
            Self::Storage(StorageError::AccessDenied { .. }) => ErrorKind::AccessDenied,
            Self::Storage(StorageError::Rejected { .. }) => ErrorKind::Rejected,
            Self::Storage(StorageError::TransientIo(_)) => ErrorKind::TransientIo,
            Self::Transform(err) => err.kind(),
        }
    }
}

/// A run that stopped at `stage` because of `cause`
#[derive(Debug, Error)]
#[error("{stage} stage failed: {cause}")]
pub struct PipelineFailure {
    pub stage: PipelineStage,
    #[source]
    pub cause: FailureCause,
}

impl PipelineFailure {
    pub fn new(stage: PipelineStage, cause: impl Into<FailureCause>) -> Self {
        Self {
            stage,
            cause: cause.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.cause.kind()
    }

    /// Only transient storage errors may be retried by re-invoking the run
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::TransientIo
    }
}

/// Result of one pipeline run: the written destination, or where it stopped
pub type PipelineOutcome = std::result::Result<ObjectRef, PipelineFailure>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kind_and_retry() {
        let object = ObjectRef::new("bucket", "k");

        let failure = PipelineFailure::new(PipelineStage::Fetch, StorageError::not_found(&object));
        assert_eq!(failure.kind(), ErrorKind::NotFound);
        assert!(!failure.is_retryable());

        let failure = PipelineFailure::new(
            PipelineStage::Upload,
            StorageError::TransientIo("connection reset".into()),
        );
        assert_eq!(failure.kind(), ErrorKind::TransientIo);
        assert!(failure.is_retryable());

        let failure = PipelineFailure::new(
            PipelineStage::Upload,
            StorageError::rejected(&object, "InvalidBucketName"),
        );
        assert_eq!(failure.kind(), ErrorKind::Rejected);
        assert!(!failure.is_retryable());

        let failure =
            PipelineFailure::new(PipelineStage::Transform, TransformError::Decode("bad".into()));
        assert_eq!(failure.kind(), ErrorKind::DecodeError);
        assert!(!failure.is_retryable());
    }

    #[test]
    fn test_failure_display_names_stage() {
        let failure =
            PipelineFailure::new(PipelineStage::Transform, TransformError::Encode("depth".into()));
        assert_eq!(
            failure.to_string(),
            "transform stage failed: failed to encode image: depth"
        );
    }
}
