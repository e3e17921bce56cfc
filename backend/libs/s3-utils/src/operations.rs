/// S3-backed object store
use crate::config::S3Config;
use crate::error::StorageError;
use crate::store::{ObjectData, ObjectRef, ObjectStore, DEFAULT_CONTENT_TYPE};
use async_trait::async_trait;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::sync::Arc;
use tracing::{debug, warn};

const NOT_FOUND_CODES: &[&str] = &["NoSuchKey", "NotFound", "NoSuchBucket"];
const ACCESS_DENIED_CODES: &[&str] = &[
    "AccessDenied",
    "AllAccessDisabled",
    "InvalidAccessKeyId",
    "SignatureDoesNotMatch",
];
/// Codes S3 may return with a 4xx status that still clear up on their own.
const TRANSIENT_CODES: &[&str] = &[
    "RequestTimeout",
    "SlowDown",
    "Throttling",
    "ThrottlingException",
    "InternalError",
    "ServiceUnavailable",
];

#[derive(Clone)]
pub struct S3ObjectStore {
    client: Arc<Client>,
}

impl S3ObjectStore {
    pub fn new(client: Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Build the SDK client from `config` and wrap it
    pub async fn from_config(config: &S3Config) -> Self {
        Self::new(crate::build_client(config).await)
    }

    /// Get reference to underlying AWS S3 client
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get(&self, object: &ObjectRef) -> Result<ObjectData, StorageError> {
        let response = self
            .client
            .get_object()
            .bucket(&object.bucket)
            .key(&object.key)
            .send()
            .await
            .map_err(|e| classify_sdk_error(e, object))?;

        let content_type = response
            .content_type()
            .map(str::to_owned)
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        let body = response.body.collect().await.map_err(|e| {
            StorageError::TransientIo(format!("failed to read body of {object}: {e}"))
        })?;
        let bytes = body.into_bytes();

        debug!(
            bucket = %object.bucket,
            key = %object.key,
            size = bytes.len(),
            content_type = %content_type,
            "Downloaded object"
        );

        Ok(ObjectData::new(bytes, content_type))
    }

    async fn put(&self, object: &ObjectRef, data: ObjectData) -> Result<(), StorageError> {
        let size = data.len();

        self.client
            .put_object()
            .bucket(&object.bucket)
            .key(&object.key)
            .content_type(data.content_type)
            .body(ByteStream::from(data.bytes))
            .send()
            .await
            .map_err(|e| classify_sdk_error(e, object))?;

        debug!(
            bucket = %object.bucket,
            key = %object.key,
            size,
            "Uploaded object"
        );

        Ok(())
    }
}

fn classify_sdk_error<E>(err: SdkError<E, HttpResponse>, object: &ObjectRef) -> StorageError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let status = err.raw_response().map(|r| r.status().as_u16());
    let code = err.as_service_error().and_then(|e| e.code()).map(str::to_owned);
    let detail = DisplayErrorContext(&err).to_string();

    let classified = classify(status, code.as_deref(), detail, object);
    if !classified.is_retryable() {
        return classified;
    }

    warn!(
        bucket = %object.bucket,
        key = %object.key,
        status = ?status,
        code = ?code,
        error = %classified,
        "S3 request failed"
    );
    classified
}

/// Map an HTTP status and S3 error code onto the storage taxonomy.
///
/// Missing and forbidden objects are recognised first. Responseless failures
/// (timeouts, dispatch errors), 5xx, 429 and throttling codes are transient.
/// Any other 3xx/4xx answer is a permanent rejection of the request.
pub(crate) fn classify(
    status: Option<u16>,
    code: Option<&str>,
    detail: String,
    object: &ObjectRef,
) -> StorageError {
    let code_in = |codes: &[&str]| code.is_some_and(|c| codes.contains(&c));

    if status == Some(404) || code_in(NOT_FOUND_CODES) {
        return StorageError::not_found(object);
    }
    if status == Some(403) || code_in(ACCESS_DENIED_CODES) {
        return StorageError::access_denied(object);
    }
    if code_in(TRANSIENT_CODES) {
        return StorageError::TransientIo(detail);
    }

    match status {
        Some(429) => StorageError::TransientIo(detail),
        Some(300..=499) => StorageError::rejected(object, code.unwrap_or(detail.as_str())),
        _ => StorageError::TransientIo(detail),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object() -> ObjectRef {
        ObjectRef::new("thumbs", "avatar/original/data.jpg")
    }

    #[test]
    fn test_classify_not_found() {
        assert_eq!(
            classify(Some(404), None, String::new(), &object()),
            StorageError::not_found(&object())
        );
        assert_eq!(
            classify(None, Some("NoSuchKey"), String::new(), &object()),
            StorageError::not_found(&object())
        );
        assert_eq!(
            classify(Some(400), Some("NoSuchBucket"), String::new(), &object()),
            StorageError::not_found(&object())
        );
    }

    #[test]
    fn test_classify_access_denied() {
        assert_eq!(
            classify(Some(403), None, String::new(), &object()),
            StorageError::access_denied(&object())
        );
        assert_eq!(
            classify(Some(400), Some("InvalidAccessKeyId"), String::new(), &object()),
            StorageError::access_denied(&object())
        );
    }

    #[test]
    fn test_classify_transient() {
        let err = classify(Some(503), Some("SlowDown"), "throttled".into(), &object());
        assert_eq!(err, StorageError::TransientIo("throttled".into()));
        assert!(err.is_retryable());

        // timeouts and dispatch failures have no response
        let err = classify(None, None, "timed out".into(), &object());
        assert!(err.is_retryable());
    }

    #[test]
    fn test_classify_throttling_is_transient() {
        assert!(classify(Some(429), None, "too many".into(), &object()).is_retryable());
        assert!(classify(Some(400), Some("RequestTimeout"), "idle".into(), &object()).is_retryable());
        assert!(classify(Some(500), Some("InternalError"), "oops".into(), &object()).is_retryable());
    }

    #[test]
    fn test_classify_other_client_errors_are_rejected() {
        let err = classify(Some(400), Some("InvalidBucketName"), "bad".into(), &object());
        assert_eq!(err, StorageError::rejected(&object(), "InvalidBucketName"));
        assert!(!err.is_retryable());

        let err = classify(Some(301), Some("PermanentRedirect"), "moved".into(), &object());
        assert_eq!(err, StorageError::rejected(&object(), "PermanentRedirect"));

        // no service code: the detail is the reason
        let err = classify(Some(400), None, "bad request".into(), &object());
        assert_eq!(err, StorageError::rejected(&object(), "bad request"));
        assert!(!err.is_retryable());
    }
}
