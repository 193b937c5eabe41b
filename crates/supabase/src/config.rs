//! Supabase client configuration.

use std::time::Duration;

/// Connection settings for [`SupabaseStorageClient`](crate::SupabaseStorageClient).
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    pub url: String,
    /// Key sent as `apikey` and as the bearer token.
    pub service_key: String,
    /// SQL function invoked to provision a bucket's access policies.
    pub policy_function: String,
    /// Timeout applied to every request.
    pub request_timeout: Duration,
}

impl SupabaseConfig {
    /// Default policy provisioning function.
    pub const DEFAULT_POLICY_FUNCTION: &'static str = "create_bucket_policies";
    /// Default per-request timeout.
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

    /// Create a configuration with default policy function and timeout.
    #[must_use]
    pub fn new(url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            service_key: service_key.into(),
            policy_function: Self::DEFAULT_POLICY_FUNCTION.to_string(),
            request_timeout: Self::DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Set the policy provisioning function.
    #[must_use]
    pub fn with_policy_function(mut self, name: impl Into<String>) -> Self {
        self.policy_function = name.into();
        self
    }

    /// Set the per-request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
