//! Application configuration management.

use serde::Deserialize;

/// Environment variable prefix for every setting.
const ENV_PREFIX: &str = "BUCKETWISE";

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Supabase connection configuration.
    pub supabase: SupabaseSettings,
    /// Storage orchestration configuration.
    #[serde(default)]
    pub storage: StorageSettings,
}

/// Supabase connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SupabaseSettings {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    pub url: String,
    /// Service role (or anon) key sent as `apikey` and bearer token.
    pub service_key: String,
    /// Name of the SQL function that provisions bucket access policies.
    #[serde(default = "default_policy_function")]
    pub policy_function: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_policy_function() -> String {
    "create_bucket_policies".to_string()
}

fn default_request_timeout() -> u64 {
    60
}

/// Storage orchestration configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Candidate bucket names, in priority order.
    #[serde(default = "default_buckets")]
    pub default_buckets: Vec<String>,
    /// Maximum object size configured on public buckets, in bytes.
    #[serde(default = "default_bucket_size_limit")]
    pub bucket_size_limit: u64,
    /// Same-bucket attempts before falling back to other buckets.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base delay of the exponential backoff, in milliseconds.
    #[serde(default = "default_retry_base_delay")]
    pub retry_base_delay_ms: u64,
    /// `Cache-Control` max-age applied to uploaded objects, in seconds.
    #[serde(default = "default_cache_control")]
    pub cache_control_secs: u64,
    /// Optional deadline applied around each upload by the caller.
    #[serde(default)]
    pub upload_timeout_secs: Option<u64>,
}

fn default_buckets() -> Vec<String> {
    ["recursos", "resources", "uploads", "files", "images", "avatars"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_bucket_size_limit() -> u64 {
    10 * 1024 * 1024 // 10 MiB
}

fn default_max_attempts() -> u32 {
    5
}

fn default_retry_base_delay() -> u64 {
    1000
}

fn default_cache_control() -> u64 {
    3600
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            default_buckets: default_buckets(),
            bucket_size_limit: default_bucket_size_limit(),
            max_attempts: default_max_attempts(),
            retry_base_delay_ms: default_retry_base_delay(),
            cache_control_secs: default_cache_control(),
            upload_timeout_secs: None,
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, later ones overriding earlier ones:
    /// `config/default`, `config/{RUN_MODE}`, then `BUCKETWISE__SECTION__KEY`
    /// environment variables. `BUCKETWISE__STORAGE__DEFAULT_BUCKETS` is a
    /// comma-separated list.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("storage.default_buckets")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
