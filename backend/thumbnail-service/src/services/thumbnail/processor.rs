//! Thumbnail processor - turns original image bytes into a fixed-size thumbnail
//!
//! Decodes the source, scales it to exactly the requested width and height
//! (stretching when the aspect ratios differ), and re-encodes it in the
//! configured output format. No I/O: identical input and configuration always
//! produce identical bytes.
//!
//! Uses `spawn_blocking` for CPU-intensive operations to avoid blocking the async runtime.

use crate::error::{TransformError, ValidationError};
use crate::models::Dimensions;
use bytes::Bytes;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageOutputFormat};
use s3_utils::ObjectData;
use serde::Deserialize;
use std::io::Cursor;
use std::sync::Arc;
use tracing::debug;

/// Encoded original as fetched from storage
pub type RawImage = ObjectData;

const DEFAULT_JPEG_QUALITY: u8 = 85;

/// Resampling filter used for every thumbnail
const RESIZE_FILTER: FilterType = FilterType::Triangle;

/// Encoding of the written thumbnail
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    #[serde(alias = "jpg")]
    Jpeg,
}

impl OutputFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }
}

/// Supported encodings of originals.
///
/// When none is declared the codec is picked from magic bytes, but only among
/// these variants; anything else the `image` crate could decode is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    Png,
    #[serde(alias = "jpg")]
    Jpeg,
    Gif,
    Webp,
    Bmp,
}

impl InputFormat {
    fn image_format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Gif => ImageFormat::Gif,
            Self::Webp => ImageFormat::WebP,
            Self::Bmp => ImageFormat::Bmp,
        }
    }

    fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Png => Some(Self::Png),
            ImageFormat::Jpeg => Some(Self::Jpeg),
            ImageFormat::Gif => Some(Self::Gif),
            ImageFormat::WebP => Some(Self::Webp),
            ImageFormat::Bmp => Some(Self::Bmp),
            _ => None,
        }
    }
}

/// Configuration for thumbnail generation
#[derive(Clone, Debug, Deserialize)]
pub struct ThumbnailConfig {
    #[serde(default)]
    pub output_format: OutputFormat,
    /// JPEG quality (1-100), ignored for PNG
    #[serde(default = "default_quality")]
    pub quality: u8,
    #[serde(default)]
    pub input_format: Option<InputFormat>,
}

fn default_quality() -> u8 {
    DEFAULT_JPEG_QUALITY
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::default(),
            quality: DEFAULT_JPEG_QUALITY,
            input_format: None,
        }
    }
}

impl ThumbnailConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=100).contains(&self.quality) {
            return Err(ValidationError::InvalidRequest(format!(
                "quality must be 1-100, got {}",
                self.quality
            )));
        }
        Ok(())
    }
}

/// Result of thumbnail generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailResult {
    /// Encoded thumbnail
    pub data: Bytes,
    pub content_type: &'static str,
    pub width: u32,
    pub height: u32,
}

impl From<ThumbnailResult> for ObjectData {
    fn from(result: ThumbnailResult) -> Self {
        ObjectData::new(result.data, result.content_type)
    }
}

/// Thumbnail processor
#[derive(Debug, Clone)]
pub struct ThumbnailProcessor {
    config: ThumbnailConfig,
}

impl ThumbnailProcessor {
    /// Create a new processor with the given configuration
    pub fn new(config: ThumbnailConfig) -> Self {
        Self { config }
    }

    /// Create a processor with default configuration
    pub fn with_defaults() -> Self {
        Self::new(ThumbnailConfig::default())
    }

    pub fn config(&self) -> &ThumbnailConfig {
        &self.config
    }

    /// Generate a thumbnail from the given image data (blocking version)
    ///
    /// **Note:** This method performs CPU-intensive operations and should not be called
    /// directly from async code. Use `generate_async` instead.
    pub fn generate(
        &self,
        input: &RawImage,
        target: Dimensions,
    ) -> Result<ThumbnailResult, TransformError> {
        let img = self.decode(&input.bytes)?;

        let (orig_w, orig_h) = img.dimensions();
        debug!(
            original_width = orig_w,
            original_height = orig_h,
            declared_content_type = %input.content_type,
            "Processing image for thumbnail"
        );

        let (width, height) = (target.width(), target.height());
        let resized = if (orig_w, orig_h) == (width, height) {
            debug!("Image already at target size, re-encoding only");
            img
        } else {
            img.resize_exact(width, height, RESIZE_FILTER)
        };

        let data = self.encode(&resized)?;

        debug!(
            width,
            height,
            size = data.len(),
            format = ?self.config.output_format,
            "Thumbnail generated"
        );

        Ok(ThumbnailResult {
            data,
            content_type: self.config.output_format.content_type(),
            width,
            height,
        })
    }

    /// Generate a thumbnail asynchronously using a blocking thread pool
    ///
    /// The input is moved onto the worker; nothing is retained by the caller.
    pub async fn generate_async(
        self: Arc<Self>,
        input: RawImage,
        target: Dimensions,
    ) -> Result<ThumbnailResult, TransformError> {
        tokio::task::spawn_blocking(move || self.generate(&input, target))
            .await
            .map_err(|e| TransformError::Aborted(e.to_string()))?
    }

    fn decode(&self, data: &[u8]) -> Result<DynamicImage, TransformError> {
        let format = match self.config.input_format {
            Some(format) => format,
            None => {
                let guessed = image::guess_format(data)
                    .map_err(|e| TransformError::Decode(e.to_string()))?;
                InputFormat::from_image_format(guessed).ok_or_else(|| {
                    TransformError::Decode(format!("unsupported image format: {guessed:?}"))
                })?
            }
        };

        image::load_from_memory_with_format(data, format.image_format())
            .map_err(|e| TransformError::Decode(e.to_string()))
    }

    fn encode(&self, img: &DynamicImage) -> Result<Bytes, TransformError> {
        let mut buf = Vec::new();
        let mut cursor = Cursor::new(&mut buf);

        let result = match self.config.output_format {
            OutputFormat::Png => img.write_to(&mut cursor, ImageOutputFormat::Png),
            // JPEG has no alpha channel
            OutputFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8())
                .write_to(&mut cursor, ImageOutputFormat::Jpeg(self.config.quality)),
        };
        result.map_err(|e| TransformError::Encode(e.to_string()))?;

        Ok(Bytes::from(buf))
    }
}
