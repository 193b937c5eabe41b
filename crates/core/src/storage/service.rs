//! Storage facade used by the rest of the application.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{error, info, warn};

use super::bucket::BucketService;
use super::config::StorageConfig;
use super::error::{StorageError, StoreError};
use super::store::{FileUpload, ObjectStore};
use super::upload::UploadService;
use super::utils::format_storage_path;

/// Storage service for file uploads.
///
/// Construct once at startup, share by `Arc`, and call
/// [`initialize_buckets`](Self::initialize_buckets) before serving uploads.
/// [`upload_file`](Self::upload_file) initializes lazily if that was skipped.
pub struct StorageService<S: ObjectStore> {
    buckets: Arc<BucketService<S>>,
    uploads: UploadService<S>,
    initialized: AtomicBool,
}

impl<S: ObjectStore> StorageService<S> {
    /// Create a new storage service over `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration names no default bucket.
    pub fn new(store: Arc<S>, config: StorageConfig) -> Result<Self, StorageError> {
        let buckets = Arc::new(BucketService::new(Arc::clone(&store), Arc::new(config))?);
        let uploads = UploadService::new(store, Arc::clone(&buckets));

        Ok(Self {
            buckets,
            uploads,
            initialized: AtomicBool::new(false),
        })
    }

    /// Pick the bucket uploads start from.
    ///
    /// Adopts the first existing bucket (default buckets first), making it
    /// public and provisioning its policy. With no existing bucket, creates
    /// the default buckets in order until one succeeds. If nothing can be
    /// discovered or created, falls back to the primary default bucket and
    /// provisions policies for every default bucket. Never fails.
    pub async fn initialize_buckets(&self) -> String {
        let bucket = match self.discover_or_create().await {
            Ok(bucket) => bucket,
            Err(e) => {
                error!(error = %e, "Bucket initialization failed, falling back to primary bucket");
                self.buckets.create_policies_for_all_buckets().await;
                self.buckets.primary_bucket().to_string()
            }
        };

        self.uploads.set_current_bucket(&bucket);
        self.initialized.store(true, Ordering::Release);
        info!(bucket = %bucket, "Storage initialized");
        bucket
    }

    async fn discover_or_create(&self) -> Result<String, StoreError> {
        let existing = self.buckets.get_existing_buckets().await?;

        if let Some(bucket) = existing.into_iter().next() {
            self.buckets.update_bucket_to_public(&bucket).await;
            self.buckets.create_bucket_policies(&bucket).await?;
            return Ok(bucket);
        }

        for name in self.buckets.get_default_buckets() {
            if let Some(bucket) = self.buckets.create_bucket(name).await {
                return Ok(bucket);
            }
        }

        warn!("No default bucket could be created, assuming the primary bucket exists");
        self.buckets.create_policies_for_all_buckets().await;
        Ok(self.buckets.primary_bucket().to_string())
    }

    /// Whether [`initialize_buckets`](Self::initialize_buckets) has run.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Validate a file against the bucket size limit.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is larger than the limit.
    pub fn validate_upload(&self, file: &FileUpload) -> Result<(), StorageError> {
        let max = self.config().bucket_size_limit;
        if file.len() > max {
            return Err(StorageError::file_too_large(file.len(), max));
        }
        Ok(())
    }

    /// Upload `file` under a timestamped path derived from `desired_name` and
    /// return its public URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is too large or every storage target
    /// failed.
    pub async fn upload_file(
        &self,
        file: &FileUpload,
        desired_name: &str,
    ) -> Result<String, StorageError> {
        self.validate_upload(file)?;

        if !self.is_initialized() {
            self.initialize_buckets().await;
        }

        let path = format_storage_path(desired_name);
        self.buckets.create_policies_for_all_buckets().await;

        let url = self
            .uploads
            .upload_file_with_retry(file, &path, self.config().max_attempts)
            .await?;
        info!(path = %path, size = file.len(), "File uploaded");
        Ok(url)
    }

    /// Provision policies for every default bucket, logging failures.
    pub async fn create_bucket_policies_for_all(&self) {
        self.buckets.create_policies_for_all_buckets().await;
    }

    /// Provision policies for one bucket.
    ///
    /// # Errors
    ///
    /// Returns the store error if provisioning fails.
    pub async fn create_bucket_policies(&self, name: &str) -> Result<(), StoreError> {
        self.buckets.create_bucket_policies(name).await
    }

    /// Public URL for `path` in the current bucket.
    #[must_use]
    pub fn get_public_url(&self, path: &str) -> String {
        self.uploads.get_public_url(path, None)
    }

    /// Bucket lifecycle service.
    #[must_use]
    pub fn buckets(&self) -> &BucketService<S> {
        &self.buckets
    }

    /// Upload orchestration service.
    #[must_use]
    pub fn uploads(&self) -> &UploadService<S> {
        &self.uploads
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        self.buckets.config()
    }
}
