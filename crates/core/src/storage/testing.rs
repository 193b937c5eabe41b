//! In-memory object store with scripted failures, for tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use bytes::Bytes;

use super::config::{BucketOptions, UploadOptions};
use super::error::StoreError;
use super::store::{BucketInfo, ObjectStore};

/// A recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    ListBuckets,
    CreateBucket(String),
    UpdateBucket(String),
    ProvisionPolicy(String),
    Upload { bucket: String, path: String },
}

#[derive(Default)]
struct State {
    buckets: Vec<String>,
    options: HashMap<String, BucketOptions>,
    objects: HashMap<(String, String), (Bytes, UploadOptions)>,
    failing_uploads: HashSet<String>,
    transient_upload_failures: HashMap<String, u32>,
    create_errors: HashMap<String, StoreError>,
    failing_policies: HashSet<String>,
    list_error: Option<StoreError>,
    calls: Vec<Call>,
}

/// Object store double backed by a `Mutex`.
#[derive(Default)]
pub(crate) struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_buckets(buckets: &[&str]) -> Self {
        let store = Self::new();
        store.state.lock().unwrap().buckets = buckets.iter().map(ToString::to_string).collect();
        store
    }

    /// Every upload to `bucket` fails.
    pub(crate) fn fail_uploads_to(self, bucket: &str) -> Self {
        self.state.lock().unwrap().failing_uploads.insert(bucket.to_string());
        self
    }

    /// The next `times` uploads to `bucket` fail.
    pub(crate) fn fail_uploads_times(self, bucket: &str, times: u32) -> Self {
        self.state
            .lock()
            .unwrap()
            .transient_upload_failures
            .insert(bucket.to_string(), times);
        self
    }

    /// Creating `bucket` fails with `error`.
    pub(crate) fn fail_create(self, bucket: &str, error: StoreError) -> Self {
        self.state
            .lock()
            .unwrap()
            .create_errors
            .insert(bucket.to_string(), error);
        self
    }

    /// Policy provisioning for `bucket` fails.
    pub(crate) fn fail_policy(self, bucket: &str) -> Self {
        self.state.lock().unwrap().failing_policies.insert(bucket.to_string());
        self
    }

    /// Listing buckets fails.
    pub(crate) fn fail_listing(self, error: StoreError) -> Self {
        self.state.lock().unwrap().list_error = Some(error);
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Buckets targeted by uploads, in call order.
    pub(crate) fn upload_targets(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Upload { bucket, .. } => Some(bucket),
                _ => None,
            })
            .collect()
    }

    /// Buckets passed to create, in call order.
    pub(crate) fn create_attempts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::CreateBucket(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn bucket_names(&self) -> Vec<String> {
        self.state.lock().unwrap().buckets.clone()
    }

    pub(crate) fn bucket_options(&self, bucket: &str) -> Option<BucketOptions> {
        self.state.lock().unwrap().options.get(bucket).copied()
    }

    pub(crate) fn object(&self, bucket: &str, path: &str) -> Option<(Bytes, UploadOptions)> {
        self.state
            .lock()
            .unwrap()
            .objects
            .get(&(bucket.to_string(), path.to_string()))
            .cloned()
    }
}

impl ObjectStore for MemoryStore {
    async fn list_buckets(&self) -> Result<Vec<BucketInfo>, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::ListBuckets);
        if let Some(err) = state.list_error.clone() {
            return Err(err);
        }
        Ok(state.buckets.iter().map(BucketInfo::named).collect())
    }

    async fn create_bucket(&self, name: &str, options: &BucketOptions) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::CreateBucket(name.to_string()));
        if let Some(err) = state.create_errors.get(name).cloned() {
            return Err(err);
        }
        if state.buckets.iter().any(|b| b == name) {
            return Err(StoreError::already_exists(format!("bucket {name}")));
        }
        state.buckets.push(name.to_string());
        state.options.insert(name.to_string(), *options);
        Ok(())
    }

    async fn update_bucket(&self, name: &str, options: &BucketOptions) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::UpdateBucket(name.to_string()));
        if !state.buckets.iter().any(|b| b == name) {
            return Err(StoreError::not_found(format!("bucket {name}")));
        }
        state.options.insert(name.to_string(), *options);
        Ok(())
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
        options: &UploadOptions,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Upload {
            bucket: bucket.to_string(),
            path: path.to_string(),
        });
        if state.failing_uploads.contains(bucket) {
            return Err(StoreError::rejected(500, format!("upload to {bucket} failed")));
        }
        if let Some(remaining) = state.transient_upload_failures.get_mut(bucket) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(StoreError::transport("connection reset"));
            }
        }
        state
            .objects
            .insert((bucket.to_string(), path.to_string()), (data, options.clone()));
        Ok(())
    }

    async fn provision_policy(&self, bucket: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::ProvisionPolicy(bucket.to_string()));
        if state.failing_policies.contains(bucket) {
            return Err(StoreError::rejected(400, format!("policy rpc failed for {bucket}")));
        }
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("https://cdn.test/{bucket}/{path}")
    }
}
