//! Thumbnail Job - generates one thumbnail and exits
//!
//! Reads the source object from S3, resizes it to the requested size, and
//! writes the result back. Exits non-zero when the run fails.
//!
//! Environment variables:
//! - THUMB_SOURCE_BUCKET: bucket holding the original
//! - THUMB_SOURCE_KEY: key of the original (e.g. "avatar/original/data.jpg")
//! - THUMB_DESTINATION_BUCKET: target bucket (default: source bucket)
//! - THUMB_DESTINATION_KEY: target key (default: derived, e.g. "avatar/processed/data.png")
//! - THUMB_WIDTH / THUMB_HEIGHT: exact thumbnail size in pixels
//! - THUMB_OUTPUT_FORMAT: png | jpeg (default: png)
//! - THUMB_QUALITY: JPEG quality 1-100 (default: 85)
//! - THUMB_INPUT_FORMAT: declared format of originals (default: detected)
//! - AWS_REGION, S3_ENDPOINT, S3_PATH_STYLE, S3_OPERATION_TIMEOUT_SECS: S3 access
//! - LOG_FORMAT: "json" for JSON logs

use anyhow::Context;
use s3_utils::S3ObjectStore;
use std::sync::Arc;
use thumbnail_service::{Config, JobConfig, ThumbnailJob, ThumbnailPipeline};
use tracing::{error, info};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("thumb_job=info".parse().expect("valid directive"))
        .add_directive("thumbnail_service=info".parse().expect("valid directive"))
        .add_directive("s3_utils=info".parse().expect("valid directive"));

    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    info!("Starting Thumbnail Job");

    let config = Config::from_env().context("failed to load service configuration")?;
    let job: ThumbnailJob = JobConfig::from_env()
        .context("failed to load job parameters")?
        .into_request(&config.thumbnail)
        .validate()
        .context("invalid job parameters")?;

    info!(
        source = %job.source,
        destination = %job.destination,
        width = job.target.width(),
        height = job.target.height(),
        format = ?config.thumbnail.output_format,
        "Configuration loaded"
    );

    let store = S3ObjectStore::from_config(&config.s3).await;
    let pipeline = ThumbnailPipeline::new(Arc::new(store), config.thumbnail);

    match pipeline.run_job(&job).await {
        Ok(destination) => {
            info!(destination = %destination, "Thumbnail Job finished");
            Ok(())
        }
        Err(failure) => {
            error!(
                stage = %failure.stage,
                kind = ?failure.kind(),
                retryable = failure.is_retryable(),
                error = %failure,
                "Thumbnail Job failed"
            );
            Err(failure.into())
        }
    }
}
