//! Storage configuration types.

use std::time::Duration;

/// Options applied when creating or updating a bucket.
///
/// A public bucket always carries a size limit; the only way to build one is
/// [`BucketOptions::public`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketOptions {
    public: bool,
    file_size_limit: Option<u64>,
}

impl BucketOptions {
    /// Publicly readable bucket with the given object size limit.
    #[must_use]
    pub const fn public(file_size_limit: u64) -> Self {
        Self {
            public: true,
            file_size_limit: Some(file_size_limit),
        }
    }

    /// Private bucket without a size limit.
    #[must_use]
    pub const fn private() -> Self {
        Self {
            public: false,
            file_size_limit: None,
        }
    }

    /// Whether objects are publicly readable.
    #[must_use]
    pub const fn is_public(&self) -> bool {
        self.public
    }

    /// Maximum object size in bytes, if any.
    #[must_use]
    pub const fn file_size_limit(&self) -> Option<u64> {
        self.file_size_limit
    }
}

/// Options sent with every object write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    /// `Cache-Control` max-age in seconds.
    pub cache_control_secs: u64,
    /// Overwrite an existing object at the same path.
    pub upsert: bool,
    /// MIME type of the payload.
    pub content_type: String,
}

/// Storage orchestration configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Candidate bucket names, in priority order.
    pub default_buckets: Vec<String>,
    /// Maximum object size in bytes, applied to every public bucket.
    pub bucket_size_limit: u64,
    /// Same-bucket attempts before falling back to other buckets.
    pub max_attempts: u32,
    /// Base delay of the exponential backoff between same-bucket attempts.
    pub retry_base_delay: Duration,
    /// `Cache-Control` max-age for uploaded objects, in seconds.
    pub cache_control_secs: u64,
}

impl StorageConfig {
    /// Default bucket size limit: 10 MiB.
    pub const DEFAULT_BUCKET_SIZE_LIMIT: u64 = 10 * 1024 * 1024;
    /// Default same-bucket attempts.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
    /// Default backoff base: 1 second.
    pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(1000);
    /// Default cache max-age: 1 hour.
    pub const DEFAULT_CACHE_CONTROL_SECS: u64 = 3600;
    /// Default candidate bucket names, in priority order.
    pub const DEFAULT_BUCKETS: [&'static str; 6] =
        ["recursos", "resources", "uploads", "files", "images", "avatars"];

    /// Create a new storage config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            default_buckets: Self::DEFAULT_BUCKETS.iter().map(ToString::to_string).collect(),
            bucket_size_limit: Self::DEFAULT_BUCKET_SIZE_LIMIT,
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            retry_base_delay: Self::DEFAULT_RETRY_BASE_DELAY,
            cache_control_secs: Self::DEFAULT_CACHE_CONTROL_SECS,
        }
    }

    /// Set the candidate bucket names.
    #[must_use]
    pub fn with_default_buckets<I, S>(mut self, buckets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_buckets = buckets.into_iter().map(Into::into).collect();
        self
    }

    /// Set the bucket size limit.
    #[must_use]
    pub fn with_bucket_size_limit(mut self, bytes: u64) -> Self {
        self.bucket_size_limit = bytes;
        self
    }

    /// Set the same-bucket attempt count.
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set the backoff base delay.
    #[must_use]
    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    /// Set the cache max-age for uploaded objects.
    #[must_use]
    pub fn with_cache_control_secs(mut self, secs: u64) -> Self {
        self.cache_control_secs = secs;
        self
    }

    /// Options used whenever a bucket is created or made public.
    #[must_use]
    pub fn public_bucket_options(&self) -> BucketOptions {
        BucketOptions::public(self.bucket_size_limit)
    }

    /// First candidate bucket name, used as the optimistic fallback.
    #[must_use]
    pub fn primary_bucket(&self) -> Option<&str> {
        self.default_buckets.first().map(String::as_str)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new()
    }
}
