//! HTTP client for Supabase Storage.

use bucketwise_core::storage::{BucketInfo, BucketOptions, ObjectStore, StoreError, UploadOptions};
use bytes::Bytes;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response, Url};
use tracing::debug;

use crate::config::SupabaseConfig;
use crate::types::{BucketRequest, BucketResponse, PolicyRequest, classify};

const UPSERT_HEADER: &str = "x-upsert";
const API_KEY_HEADER: &str = "apikey";

/// [`ObjectStore`] backed by the Supabase Storage REST API.
#[derive(Debug, Clone)]
pub struct SupabaseStorageClient {
    http: reqwest::Client,
    base: Url,
    service_key: String,
    policy_function: String,
}

impl SupabaseStorageClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Configuration`] if the project URL is invalid or
    /// the HTTP client cannot be built.
    pub fn new(config: SupabaseConfig) -> Result<Self, StoreError> {
        let base = Url::parse(&config.url).map_err(|e| {
            StoreError::configuration(format!("invalid Supabase URL {:?}: {e}", config.url))
        })?;
        if base.cannot_be_a_base() {
            return Err(StoreError::configuration(format!(
                "Supabase URL {:?} cannot be used as a base",
                config.url
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("bucketwise/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StoreError::configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base,
            service_key: config.service_key,
            policy_function: config.policy_function,
        })
    }

    /// Base URL with `segments` appended, each one percent-encoded.
    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.base.clone();
        // `new` rejects cannot-be-a-base URLs, so this always succeeds.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn object_endpoint<'a>(&self, prefix: &[&'a str], bucket: &'a str, path: &'a str) -> Url {
        self.endpoint(
            prefix
                .iter()
                .copied()
                .chain(std::iter::once(bucket))
                .chain(path.split('/').filter(|s| !s.is_empty())),
        )
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .header(API_KEY_HEADER, &self.service_key)
            .bearer_auth(&self.service_key)
    }

    /// Send and classify any non-success response.
    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let response = request
            .send()
            .await
            .map_err(|e| StoreError::transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().clone();
        let body = response.text().await.unwrap_or_default();
        let err = classify(status.as_u16(), &body);
        debug!(url = %url, status = status.as_u16(), error = %err, "Supabase request failed");
        Err(err)
    }
}

impl ObjectStore for SupabaseStorageClient {
    async fn list_buckets(&self) -> Result<Vec<BucketInfo>, StoreError> {
        let url = self.endpoint(["storage", "v1", "bucket"]);
        let buckets: Vec<BucketResponse> = self
            .send(self.request(Method::GET, url))
            .await?
            .json()
            .await
            .map_err(|e| StoreError::transport(format!("invalid bucket listing: {e}")))?;

        Ok(buckets.into_iter().map(Into::into).collect())
    }

    async fn create_bucket(&self, name: &str, options: &BucketOptions) -> Result<(), StoreError> {
        let url = self.endpoint(["storage", "v1", "bucket"]);
        let body = BucketRequest::new(name, options);
        self.send(self.request(Method::POST, url).json(&body)).await?;
        Ok(())
    }

    async fn update_bucket(&self, name: &str, options: &BucketOptions) -> Result<(), StoreError> {
        let url = self.endpoint(["storage", "v1", "bucket", name]);
        let body = BucketRequest::new(name, options);
        self.send(self.request(Method::PUT, url).json(&body)).await?;
        Ok(())
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
        options: &UploadOptions,
    ) -> Result<(), StoreError> {
        let url = self.object_endpoint(&["storage", "v1", "object"], bucket, path);
        let request = self
            .request(Method::POST, url)
            .header(UPSERT_HEADER, if options.upsert { "true" } else { "false" })
            .header(CACHE_CONTROL, format!("max-age={}", options.cache_control_secs))
            .header(CONTENT_TYPE, options.content_type.as_str())
            .body(data);

        self.send(request).await?;
        Ok(())
    }

    async fn provision_policy(&self, bucket: &str) -> Result<(), StoreError> {
        let url = self.endpoint(["rest", "v1", "rpc", self.policy_function.as_str()]);
        let body = PolicyRequest {
            bucket_name: bucket,
        };
        self.send(self.request(Method::POST, url).json(&body)).await?;
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        self.object_endpoint(&["storage", "v1", "object", "public"], bucket, path)
            .to_string()
    }
}
