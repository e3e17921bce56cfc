//! Thumbnail generation service
//!
//! - Image processor for decoding, resizing and re-encoding
//! - Pipeline coordinating fetch, transform and upload against an object store

pub mod pipeline;
pub mod processor;

pub use pipeline::{RunState, ThumbnailPipeline};
pub use processor::{
    InputFormat, OutputFormat, RawImage, ThumbnailConfig, ThumbnailProcessor, ThumbnailResult,
};
