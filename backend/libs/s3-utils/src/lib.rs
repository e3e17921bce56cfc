/// Object storage access for the thumbnail pipeline
///
/// Provides the [`ObjectStore`] capability (get/put by bucket + key), an
/// S3-backed implementation, an in-memory implementation for tests and local
/// runs, and the storage error taxonomy shared by both.
use aws_config::timeout::TimeoutConfig;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::Client;

pub mod config;
pub mod error;
pub mod memory;
pub mod operations;
pub mod store;

pub use config::S3Config;
pub use error::StorageError;
pub use memory::MemoryObjectStore;
pub use operations::S3ObjectStore;
pub use store::{ObjectData, ObjectRef, ObjectStore, DEFAULT_CONTENT_TYPE};

/// Build an AWS S3 client from the provided configuration.
///
/// Credentials come from the default provider chain. The operation timeout is
/// enforced by the SDK and reported as a transient error.
pub async fn build_client(config: &S3Config) -> Client {
    let timeouts = TimeoutConfig::builder()
        .operation_timeout(config.operation_timeout())
        .build();

    let shared_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.region.clone()))
        .timeout_config(timeouts)
        .load()
        .await;

    let mut builder =
        aws_sdk_s3::config::Builder::from(&shared_config).force_path_style(config.path_style);
    if let Some(endpoint) = &config.endpoint {
        builder = builder.endpoint_url(endpoint);
    }

    tracing::info!(
        region = %config.region,
        endpoint = ?config.endpoint,
        path_style = config.path_style,
        "S3 client initialized"
    );

    Client::from_conf(builder.build())
}
