//! Object store abstraction: get and put by bucket + key.

use crate::error::StorageError;
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;

/// Content type assumed when the store does not report one
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Address of a stored object
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
}

impl ObjectRef {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// Object payload together with its content type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectData {
    pub bytes: Bytes,
    pub content_type: String,
}

impl ObjectData {
    pub fn new(bytes: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Minimal capability set the thumbnail pipeline needs from a blob store.
///
/// Implementations hold no per-call state and must be safe to share across
/// concurrent pipeline runs.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch the full object body.
    async fn get(&self, object: &ObjectRef) -> Result<ObjectData, StorageError>;

    /// Write `data`, replacing whatever is stored at `object`.
    async fn put(&self, object: &ObjectRef, data: ObjectData) -> Result<(), StorageError>;
}
