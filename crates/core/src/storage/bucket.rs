//! Bucket lifecycle: discovery, creation, visibility and access policies.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::config::StorageConfig;
use super::error::{StorageError, StoreError};
use super::pointer::BucketPointer;
use super::store::ObjectStore;

/// Owns bucket discovery, creation and policy provisioning, and remembers the
/// last bucket an upload succeeded against.
pub struct BucketService<S: ObjectStore> {
    store: Arc<S>,
    config: Arc<StorageConfig>,
    primary: String,
    last_successful: BucketPointer,
}

impl<S: ObjectStore> BucketService<S> {
    /// Create a new bucket service.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration names no default bucket.
    pub fn new(store: Arc<S>, config: Arc<StorageConfig>) -> Result<Self, StorageError> {
        let primary = config
            .primary_bucket()
            .ok_or_else(|| StorageError::configuration("at least one default bucket is required"))?
            .to_string();

        Ok(Self {
            store,
            config,
            primary,
            last_successful: BucketPointer::new(),
        })
    }

    /// Create a bucket, provisioning its access policy first.
    ///
    /// A permission rejection is treated as a soft success: the bucket most
    /// likely exists already and only the caller lacks the right to create
    /// it, so the policy is provisioned again and the name is returned. An
    /// `AlreadyExists` rejection is handled the same way. Returns `None` on
    /// any other failure.
    pub async fn create_bucket(&self, name: &str) -> Option<String> {
        if let Err(e) = self.create_bucket_policies(name).await {
            warn!(bucket = %name, error = %e, "Policy pre-provisioning failed, creating anyway");
        }

        match self
            .store
            .create_bucket(name, &self.config.public_bucket_options())
            .await
        {
            Ok(()) => {
                info!(bucket = %name, "Bucket created");
                self.set_last_successful_bucket(name);
                Some(name.to_string())
            }
            Err(e) if e.is_permission_denied() || e.is_already_exists() => {
                warn!(
                    bucket = %name,
                    error = %e,
                    "Bucket creation rejected, assuming it already exists"
                );
                if let Err(e) = self.create_bucket_policies(name).await {
                    warn!(bucket = %name, error = %e, "Policy provisioning failed after soft success");
                }
                self.set_last_successful_bucket(name);
                Some(name.to_string())
            }
            Err(e) => {
                warn!(bucket = %name, error = %e, "Bucket creation failed");
                None
            }
        }
    }

    /// Make a bucket public with the configured size limit. Failures are
    /// logged, never returned.
    pub async fn update_bucket_to_public(&self, name: &str) {
        match self
            .store
            .update_bucket(name, &self.config.public_bucket_options())
            .await
        {
            Ok(()) => debug!(bucket = %name, "Bucket visibility set to public"),
            Err(e) => warn!(bucket = %name, error = %e, "Failed to make bucket public"),
        }
    }

    /// List bucket names, default buckets first.
    ///
    /// # Errors
    ///
    /// Returns the store error if listing fails.
    pub async fn get_existing_buckets(&self) -> Result<Vec<String>, StoreError> {
        let names = self
            .store
            .list_buckets()
            .await?
            .into_iter()
            .map(|bucket| bucket.name)
            .collect();

        Ok(prioritize_default_buckets(names, &self.config.default_buckets))
    }

    /// Run the backend's policy provisioning procedure for `name`.
    ///
    /// # Errors
    ///
    /// Returns the store error unchanged; callers decide whether to swallow it.
    pub async fn create_bucket_policies(&self, name: &str) -> Result<(), StoreError> {
        self.store.provision_policy(name).await?;
        debug!(bucket = %name, "Bucket policies provisioned");
        Ok(())
    }

    /// Provision policies for every default bucket, logging failures.
    pub async fn create_policies_for_all_buckets(&self) {
        for name in &self.config.default_buckets {
            if let Err(e) = self.create_bucket_policies(name).await {
                warn!(bucket = %name, error = %e, "Failed to provision bucket policies");
            }
        }
    }

    /// Candidate bucket names, in priority order.
    #[must_use]
    pub fn get_default_buckets(&self) -> &[String] {
        &self.config.default_buckets
    }

    /// First candidate bucket name.
    #[must_use]
    pub fn primary_bucket(&self) -> &str {
        &self.primary
    }

    /// Most recent bucket that accepted an upload or was created.
    #[must_use]
    pub fn get_last_successful_bucket(&self) -> Option<String> {
        self.last_successful.get()
    }

    /// Record `name` as the most recent successful bucket.
    pub fn set_last_successful_bucket(&self, name: &str) {
        self.last_successful.set(name);
    }

    /// Storage configuration.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }
}

/// Stable partition: names present in `defaults` first, everything else after,
/// relative order preserved within both groups.
#[must_use]
pub fn prioritize_default_buckets(names: Vec<String>, defaults: &[String]) -> Vec<String> {
    let (mut preferred, others): (Vec<_>, Vec<_>) =
        names.into_iter().partition(|name| defaults.contains(name));
    preferred.extend(others);
    preferred
}
