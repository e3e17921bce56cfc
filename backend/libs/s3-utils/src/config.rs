/// S3 connection settings shared by every store built from this crate
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    /// AWS region
    pub region: String,
    /// Custom endpoint for S3-compatible stores (MinIO, LocalStack)
    pub endpoint: Option<String>,
    /// Whether to use path-style URLs (false = virtual-hosted-style)
    pub path_style: bool,
    /// Upper bound for a single get/put including retries, in seconds
    pub operation_timeout_secs: u64,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            endpoint: None,
            path_style: false,
            operation_timeout_secs: DEFAULT_OPERATION_TIMEOUT_SECS,
        }
    }
}

impl S3Config {
    /// Load S3 configuration from environment variables.
    ///
    /// Credentials are not read here; the AWS default provider chain resolves them.
    pub fn from_env() -> Self {
        Self {
            region: std::env::var("AWS_REGION").unwrap_or_else(|_| DEFAULT_REGION.to_string()),
            endpoint: std::env::var("S3_ENDPOINT")
                .ok()
                .filter(|e| !e.trim().is_empty()),
            path_style: std::env::var("S3_PATH_STYLE")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            operation_timeout_secs: std::env::var("S3_OPERATION_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_OPERATION_TIMEOUT_SECS),
        }
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }
}
