//! Upload retry and fallback orchestration.
//!
//! A single upload walks through four phases until one produces a URL:
//!
//! 1. retry the current bucket with exponential backoff,
//! 2. try every other existing bucket once,
//! 3. create each missing default bucket and try it once,
//! 4. try the last bucket that ever accepted an upload.
//!
//! Only when all of them fail does the caller get an error.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::bucket::BucketService;
use super::config::UploadOptions;
use super::error::{StorageError, StoreError};
use super::pointer::BucketPointer;
use super::store::{FileUpload, ObjectStore};
use super::utils::{calculate_backoff_delay, sleep};

/// Bookkeeping for one run of the cascade.
#[derive(Debug, Default)]
struct Cascade {
    attempts: u32,
    last_error: Option<StoreError>,
}

impl Cascade {
    fn record(&mut self, err: StoreError) {
        self.last_error = Some(err);
    }
}

/// Uploads files, falling back across buckets until one accepts the write.
pub struct UploadService<S: ObjectStore> {
    store: Arc<S>,
    buckets: Arc<BucketService<S>>,
    current: BucketPointer,
}

impl<S: ObjectStore> UploadService<S> {
    /// Create a new upload service.
    #[must_use]
    pub fn new(store: Arc<S>, buckets: Arc<BucketService<S>>) -> Self {
        Self {
            store,
            buckets,
            current: BucketPointer::new(),
        }
    }

    /// Single-shot upload to `bucket`.
    ///
    /// Provisions the bucket's policy, upserts the object and returns its
    /// public URL, recording `bucket` as current and last successful. Never
    /// fails: every error is logged and mapped to `None`.
    pub async fn upload_file_to_bucket(
        &self,
        file: &FileUpload,
        path: &str,
        bucket: &str,
    ) -> Option<String> {
        match self.try_upload(file, path, bucket).await {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(bucket = %bucket, path = %path, error = %e, "Upload attempt failed");
                None
            }
        }
    }

    async fn try_upload(
        &self,
        file: &FileUpload,
        path: &str,
        bucket: &str,
    ) -> Result<String, StoreError> {
        self.buckets.create_bucket_policies(bucket).await?;

        let options = UploadOptions {
            cache_control_secs: self.buckets.config().cache_control_secs,
            upsert: true,
            content_type: file.content_type().to_string(),
        };
        self.store
            .upload(bucket, path, file.bytes().clone(), &options)
            .await?;

        let url = self.store.public_url(bucket, path);
        self.buckets.set_last_successful_bucket(bucket);
        self.current.set(bucket);
        Ok(url)
    }

    /// Upload `file` to `path`, retrying and falling back across buckets.
    ///
    /// The current bucket gets `max_attempts` tries (at least one) separated by
    /// exponential backoff. After that every other existing bucket, every
    /// missing default bucket and finally the last successful bucket get one
    /// try each.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::UploadFailed`] with the last observed error when
    /// every target failed, or [`StorageError::Exhausted`] if none was captured.
    pub async fn upload_file_with_retry(
        &self,
        file: &FileUpload,
        path: &str,
        max_attempts: u32,
    ) -> Result<String, StorageError> {
        let mut cascade = Cascade::default();
        let current = self.resolve_current_bucket(&mut cascade).await;

        if let Some(url) = self
            .retry_current(file, path, &current, max_attempts.max(1), &mut cascade)
            .await
        {
            return Ok(url);
        }

        let existing = self.list_for_fallback(&mut cascade).await;

        if let Some(url) = self
            .try_siblings(file, path, &current, &existing, &mut cascade)
            .await
        {
            return Ok(url);
        }

        if let Some(url) = self
            .try_new_buckets(file, path, &current, &existing, &mut cascade)
            .await
        {
            return Ok(url);
        }

        if let Some(url) = self
            .try_last_successful(file, path, &current, &mut cascade)
            .await
        {
            return Ok(url);
        }

        error!(
            path = %path,
            attempts = cascade.attempts,
            "Exhausted all storage targets"
        );
        Err(StorageError::exhausted(cascade.attempts, cascade.last_error))
    }

    /// Current bucket, discovering one if none is set yet.
    async fn resolve_current_bucket(&self, cascade: &mut Cascade) -> String {
        if let Some(bucket) = self.current.get() {
            return bucket;
        }

        let discovered = match self.buckets.get_existing_buckets().await {
            Ok(buckets) => buckets.into_iter().next(),
            Err(e) => {
                warn!(error = %e, "Bucket discovery failed, using primary bucket");
                cascade.record(e);
                None
            }
        };
        let bucket = discovered.unwrap_or_else(|| self.buckets.primary_bucket().to_string());
        debug!(bucket = %bucket, "Adopted upload bucket");
        self.current.set(&bucket);
        bucket
    }

    /// One single-shot attempt, counted and with its error retained.
    async fn attempt(
        &self,
        file: &FileUpload,
        path: &str,
        bucket: &str,
        cascade: &mut Cascade,
    ) -> Option<String> {
        cascade.attempts += 1;
        match self.try_upload(file, path, bucket).await {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(
                    bucket = %bucket,
                    attempt = cascade.attempts,
                    error = %e,
                    "Upload attempt failed"
                );
                cascade.record(e);
                None
            }
        }
    }

    async fn retry_current(
        &self,
        file: &FileUpload,
        path: &str,
        bucket: &str,
        max_attempts: u32,
        cascade: &mut Cascade,
    ) -> Option<String> {
        let base = self.buckets.config().retry_base_delay;

        for attempt in 0..max_attempts {
            match self.buckets.create_bucket_policies(bucket).await {
                Ok(()) => {
                    if let Some(url) = self.attempt(file, path, bucket, cascade).await {
                        return Some(url);
                    }
                }
                Err(e) => {
                    warn!(bucket = %bucket, error = %e, "Policy provisioning failed before upload");
                    cascade.record(e);
                }
            }

            if attempt + 1 < max_attempts {
                let delay = calculate_backoff_delay(attempt, base);
                debug!(bucket = %bucket, attempt, delay = ?delay, "Backing off");
                sleep(delay).await;
            }
        }

        None
    }

    async fn list_for_fallback(&self, cascade: &mut Cascade) -> Vec<String> {
        match self.buckets.get_existing_buckets().await {
            Ok(buckets) => buckets,
            Err(e) => {
                warn!(error = %e, "Bucket listing failed during fallback");
                cascade.record(e);
                Vec::new()
            }
        }
    }

    async fn try_siblings(
        &self,
        file: &FileUpload,
        path: &str,
        current: &str,
        existing: &[String],
        cascade: &mut Cascade,
    ) -> Option<String> {
        for bucket in existing.iter().filter(|b| *b != current) {
            if let Err(e) = self.buckets.create_bucket_policies(bucket).await {
                warn!(bucket = %bucket, error = %e, "Skipping bucket, policy provisioning failed");
                cascade.record(e);
                continue;
            }
            if let Some(url) = self.attempt(file, path, bucket, cascade).await {
                info!(from = %current, to = %bucket, "Fell back to existing bucket");
                return Some(url);
            }
        }
        None
    }

    /// A default bucket whose creation yields `None` is skipped without an
    /// upload attempt; permission and already-exists rejections count as
    /// created.
    async fn try_new_buckets(
        &self,
        file: &FileUpload,
        path: &str,
        current: &str,
        existing: &[String],
        cascade: &mut Cascade,
    ) -> Option<String> {
        let candidates: Vec<String> = self
            .buckets
            .get_default_buckets()
            .iter()
            .filter(|name| *name != current && !existing.contains(*name))
            .cloned()
            .collect();

        for name in candidates {
            let Some(bucket) = self.buckets.create_bucket(&name).await else {
                continue;
            };
            if let Some(url) = self.attempt(file, path, &bucket, cascade).await {
                info!(from = %current, to = %bucket, "Fell back to new bucket");
                return Some(url);
            }
        }
        None
    }

    async fn try_last_successful(
        &self,
        file: &FileUpload,
        path: &str,
        current: &str,
        cascade: &mut Cascade,
    ) -> Option<String> {
        let bucket = self
            .buckets
            .get_last_successful_bucket()
            .filter(|b| b != current)?;

        let url = self.attempt(file, path, &bucket, cascade).await?;
        info!(from = %current, to = %bucket, "Fell back to last successful bucket");
        Some(url)
    }

    /// Public URL for `path` in `bucket`, or in the current bucket, or in the
    /// primary bucket.
    #[must_use]
    pub fn get_public_url(&self, path: &str, bucket: Option<&str>) -> String {
        let bucket = bucket
            .map(str::to_string)
            .or_else(|| self.current.get())
            .unwrap_or_else(|| self.buckets.primary_bucket().to_string());
        self.store.public_url(&bucket, path)
    }

    /// Point subsequent uploads at `name`.
    pub fn set_current_bucket(&self, name: &str) {
        self.current.set(name);
    }

    /// Bucket the next upload targets, if one has been chosen.
    #[must_use]
    pub fn get_current_bucket(&self) -> Option<String> {
        self.current.get()
    }
}
