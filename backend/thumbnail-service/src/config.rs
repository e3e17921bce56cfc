/// Configuration management for the thumbnail service
///
/// Transformer settings and job parameters are read from `THUMB_`-prefixed
/// environment variables; S3 settings come from [`S3Config::from_env`].
use crate::error::ValidationError;
use crate::models::{derive_destination_key, ThumbnailRequest};
use crate::services::thumbnail::ThumbnailConfig;
use s3_utils::S3Config;
use serde::Deserialize;
use thiserror::Error;

pub const ENV_PREFIX: &str = "THUMB_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid environment configuration: {0}")]
    Env(#[from] envy::Error),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

#[derive(Clone, Debug)]
pub struct Config {
    pub s3: S3Config,
    pub thumbnail: ThumbnailConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let thumbnail = thumbnail_config_from(std::env::vars())?;
        Ok(Self {
            s3: S3Config::from_env(),
            thumbnail,
        })
    }
}

fn thumbnail_config_from<I>(vars: I) -> Result<ThumbnailConfig, ConfigError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let thumbnail: ThumbnailConfig = envy::prefixed(ENV_PREFIX).from_iter(vars)?;
    thumbnail.validate()?;
    Ok(thumbnail)
}

/// Parameters of a single run as supplied through the environment.
///
/// Destination bucket and key are optional: the bucket defaults to the source
/// bucket and the key is derived from the source key.
#[derive(Clone, Debug, Deserialize)]
pub struct JobConfig {
    pub source_bucket: String,
    pub source_key: String,
    #[serde(default)]
    pub destination_bucket: Option<String>,
    #[serde(default)]
    pub destination_key: Option<String>,
    pub width: u32,
    pub height: u32,
}

impl JobConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::prefixed(ENV_PREFIX).from_iter(vars)?)
    }

    /// Fill in defaults and produce the request handed to validation
    pub fn into_request(self, thumbnail: &ThumbnailConfig) -> ThumbnailRequest {
        let destination_key = self
            .destination_key
            .unwrap_or_else(|| derive_destination_key(&self.source_key, thumbnail.output_format));
        let destination_bucket = self
            .destination_bucket
            .unwrap_or_else(|| self.source_bucket.clone());

        ThumbnailRequest {
            source_bucket: self.source_bucket,
            source_key: self.source_key,
            destination_bucket,
            destination_key,
            target_width: self.width,
            target_height: self.height,
        }
    }
}
