//! Thumbnail Service
//!
//! Generates a fixed-size thumbnail from an original stored in object
//! storage and writes it back under a destination key. One run fetches the
//! original, transforms it, and uploads the result; failures are reported
//! with the stage that produced them.

pub mod config;
pub mod error;
pub mod models;
pub mod services;

// Public re-exports
pub use config::{Config, ConfigError, JobConfig};
pub use error::{
    ErrorKind, FailureCause, PipelineFailure, PipelineOutcome, PipelineStage, TransformError,
    ValidationError,
};
pub use models::{derive_destination_key, Dimensions, ThumbnailJob, ThumbnailRequest};
pub use services::thumbnail::{
    OutputFormat, ThumbnailConfig, ThumbnailPipeline, ThumbnailProcessor, ThumbnailResult,
};
