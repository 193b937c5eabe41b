//! Object store seam and the payload types that cross it.

use std::future::Future;

use bytes::Bytes;

use super::config::{BucketOptions, UploadOptions};
use super::error::StoreError;

/// A bucket as reported by the backend's listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketInfo {
    /// Bucket name (also its identifier).
    pub name: String,
}

impl BucketInfo {
    /// Bucket known only by name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A file handed to the storage layer.
#[derive(Debug, Clone)]
pub struct FileUpload {
    bytes: Bytes,
    content_type: String,
}

impl FileUpload {
    /// Create a file from its bytes and MIME type.
    #[must_use]
    pub fn new(bytes: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.into(),
        }
    }

    /// File contents. Cloning is cheap.
    #[must_use]
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// MIME type, passed through to the backend verbatim.
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Size in bytes.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Whether the file has no contents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Low-level object store operations.
///
/// Implemented by the backend client crate; the orchestration layer only
/// talks to the backend through this trait.
pub trait ObjectStore: Send + Sync {
    /// List every bucket visible to the caller.
    fn list_buckets(&self) -> impl Future<Output = Result<Vec<BucketInfo>, StoreError>> + Send;

    /// Create a bucket.
    fn create_bucket(
        &self,
        name: &str,
        options: &BucketOptions,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Update visibility and size limit of an existing bucket.
    fn update_bucket(
        &self,
        name: &str,
        options: &BucketOptions,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Write an object.
    fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
        options: &UploadOptions,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Run the backend's access-policy provisioning procedure for a bucket.
    fn provision_policy(&self, bucket: &str)
    -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Public URL of an object. Derived locally, never fails.
    fn public_url(&self, bucket: &str, path: &str) -> String;
}
