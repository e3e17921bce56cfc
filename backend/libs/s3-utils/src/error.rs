use crate::store::ObjectRef;
use thiserror::Error;

/// Failures surfaced by an [`ObjectStore`](crate::ObjectStore).
///
/// Only [`StorageError::TransientIo`] is worth retrying; the other variants
/// describe a condition that will not change on a second attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("access denied: {bucket}/{key}")]
    AccessDenied { bucket: String, key: String },

    /// The store refused the request itself (bad bucket name, wrong region,
    /// invalid argument); resending it unchanged fails the same way
    #[error("request rejected for {bucket}/{key}: {reason}")]
    Rejected {
        bucket: String,
        key: String,
        reason: String,
    },

    #[error("transient storage error: {0}")]
    TransientIo(String),
}

impl StorageError {
    pub fn not_found(object: &ObjectRef) -> Self {
        Self::NotFound {
            bucket: object.bucket.clone(),
            key: object.key.clone(),
        }
    }

    pub fn access_denied(object: &ObjectRef) -> Self {
        Self::AccessDenied {
            bucket: object.bucket.clone(),
            key: object.key.clone(),
        }
    }

    pub fn rejected(object: &ObjectRef, reason: impl Into<String>) -> Self {
        Self::Rejected {
            bucket: object.bucket.clone(),
            key: object.key.clone(),
            reason: reason.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientIo(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transient_is_retryable() {
        let object = ObjectRef::new("bucket", "a/b.jpg");
        assert!(!StorageError::not_found(&object).is_retryable());
        assert!(!StorageError::access_denied(&object).is_retryable());
        assert!(!StorageError::rejected(&object, "InvalidBucketName").is_retryable());
        assert!(StorageError::TransientIo("connection reset".into()).is_retryable());
    }

    #[test]
    fn test_display_names_object() {
        let err = StorageError::not_found(&ObjectRef::new("bucket", "a/b.jpg"));
        assert_eq!(err.to_string(), "object not found: bucket/a/b.jpg");
    }
}
