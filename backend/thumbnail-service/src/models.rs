/// Job parameters for a thumbnail run and their validation
use crate::error::ValidationError;
use crate::services::thumbnail::OutputFormat;
use s3_utils::ObjectRef;
use serde::Deserialize;

/// Largest accepted thumbnail side in pixels
pub const MAX_DIMENSION: u32 = 4096;

/// S3 limit on key length in bytes
pub const MAX_KEY_LENGTH: usize = 1024;

const ORIGINAL_SEGMENT: &str = "original";
const PROCESSED_SEGMENT: &str = "processed";

/// Target raster size; both sides are within `1..=MAX_DIMENSION`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    width: u32,
    height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Result<Self, ValidationError> {
        let valid = |side: u32| (1..=MAX_DIMENSION).contains(&side);
        if !valid(width) || !valid(height) {
            return Err(ValidationError::InvalidDimensions {
                width,
                height,
                max: MAX_DIMENSION,
            });
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Raw invocation parameters as supplied by the harness
#[derive(Debug, Clone, Deserialize)]
pub struct ThumbnailRequest {
    pub source_bucket: String,
    pub source_key: String,
    pub destination_bucket: String,
    pub destination_key: String,
    pub target_width: u32,
    pub target_height: u32,
}

/// A validated request, ready to hand to the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailJob {
    pub source: ObjectRef,
    pub destination: ObjectRef,
    pub target: Dimensions,
}

impl ThumbnailRequest {
    pub fn validate(self) -> Result<ThumbnailJob, ValidationError> {
        let target = Dimensions::new(self.target_width, self.target_height)?;

        validate_bucket("source bucket", &self.source_bucket)?;
        validate_key("source key", &self.source_key)?;
        validate_bucket("destination bucket", &self.destination_bucket)?;
        validate_key("destination key", &self.destination_key)?;

        let source = ObjectRef::new(self.source_bucket, self.source_key);
        let destination = ObjectRef::new(self.destination_bucket, self.destination_key);

        // writing over the original would break reruns
        if source == destination {
            return Err(ValidationError::InvalidRequest(format!(
                "destination must differ from source ({source})"
            )));
        }

        Ok(ThumbnailJob {
            source,
            destination,
            target,
        })
    }
}

impl TryFrom<ThumbnailRequest> for ThumbnailJob {
    type Error = ValidationError;

    fn try_from(request: ThumbnailRequest) -> Result<Self, Self::Error> {
        request.validate()
    }
}

fn validate_bucket(field: &str, bucket: &str) -> Result<(), ValidationError> {
    if bucket.trim().is_empty() {
        return Err(ValidationError::InvalidRequest(format!("{field} is empty")));
    }
    Ok(())
}

fn validate_key(field: &str, key: &str) -> Result<(), ValidationError> {
    if key.is_empty() {
        return Err(ValidationError::InvalidRequest(format!("{field} is empty")));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(ValidationError::InvalidRequest(format!(
            "{field} is too long (max {MAX_KEY_LENGTH} bytes)"
        )));
    }
    Ok(())
}

/// Derive where the thumbnail of `source_key` is written.
///
/// The last `original` directory segment becomes `processed` (one is inserted
/// before the file name when absent) and the extension is replaced with the
/// output format's, e.g. `avatar/original/data.jpg` -> `avatar/processed/data.png`.
pub fn derive_destination_key(source_key: &str, format: OutputFormat) -> String {
    let (dir, file_name) = match source_key.rsplit_once('/') {
        Some((dir, name)) => (Some(dir), name),
        None => (None, source_key),
    };

    let mut segments: Vec<&str> = dir.map(|d| d.split('/').collect()).unwrap_or_default();
    match segments.iter().rposition(|s| *s == ORIGINAL_SEGMENT) {
        Some(idx) => segments[idx] = PROCESSED_SEGMENT,
        None => segments.push(PROCESSED_SEGMENT),
    }

    let stem = match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file_name,
    };
    segments.push(stem);

    format!("{}.{}", segments.join("/"), format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ThumbnailRequest {
        ThumbnailRequest {
            source_bucket: "assets".to_string(),
            source_key: "avatar/original/data.jpg".to_string(),
            destination_bucket: "assets".to_string(),
            destination_key: "avatar/processed/data.png".to_string(),
            target_width: 256,
            target_height: 256,
        }
    }

    #[test]
    fn test_dimensions_bounds() {
        assert!(Dimensions::new(1, 1).is_ok());
        assert!(Dimensions::new(MAX_DIMENSION, MAX_DIMENSION).is_ok());
        assert_eq!(
            Dimensions::new(0, 256),
            Err(ValidationError::InvalidDimensions {
                width: 0,
                height: 256,
                max: MAX_DIMENSION
            })
        );
        assert!(Dimensions::new(256, 0).is_err());
        assert!(Dimensions::new(MAX_DIMENSION + 1, 10).is_err());
    }

    #[test]
    fn test_validate_request() {
        let job = request().validate().unwrap();
        assert_eq!(job.source, ObjectRef::new("assets", "avatar/original/data.jpg"));
        assert_eq!(job.destination, ObjectRef::new("assets", "avatar/processed/data.png"));
        assert_eq!(job.target.width(), 256);
        assert_eq!(job.target.height(), 256);
    }

    #[test]
    fn test_validate_rejects_zero_dimension() {
        let mut req = request();
        req.target_height = 0;
        let err = ThumbnailJob::try_from(req).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidDimensions);
    }

    #[test]
    fn test_validate_rejects_bad_keys() {
        let mut req = request();
        req.source_key = String::new();
        assert!(req.validate().is_err());

        let mut req = request();
        req.destination_key = "k".repeat(MAX_KEY_LENGTH + 1);
        assert!(req.validate().is_err());

        let mut req = request();
        req.destination_bucket = "  ".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_overwriting_source() {
        let mut req = request();
        req.destination_key = req.source_key.clone();
        let err = req.validate().unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidRequest);
    }

    #[test]
    fn test_derive_destination_key() {
        assert_eq!(
            derive_destination_key("avatar/original/data.jpg", OutputFormat::Png),
            "avatar/processed/data.png"
        );
        assert_eq!(
            derive_destination_key("photo.jpeg", OutputFormat::Jpeg),
            "processed/photo.jpg"
        );
        assert_eq!(
            derive_destination_key("users/42/original/me", OutputFormat::Png),
            "users/42/processed/me.png"
        );
        assert_eq!(
            derive_destination_key("uploads/.hidden", OutputFormat::Png),
            "uploads/processed/.hidden.png"
        );
    }
}
