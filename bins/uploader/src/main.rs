//! Bucketwise CLI
//!
//! Prepares storage buckets and uploads files to Supabase Storage.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bucketwise_core::storage::{FileUpload, StorageConfig, StorageService, content_type_for_path};
use bucketwise_shared::{AppConfig, StorageSettings, SupabaseSettings};
use bucketwise_supabase::{SupabaseConfig, SupabaseStorageClient};

type Service = StorageService<SupabaseStorageClient>;

#[derive(Parser, Debug)]
#[command(name = "bucketwise", version)]
#[command(about = "Upload files to Supabase Storage with bucket fallback")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Discover or create the upload bucket and print its name
    Init,

    /// Upload files and print one public URL per line
    Upload {
        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Object name to use instead of the file name (single file only)
        #[arg(short, long)]
        name: Option<String>,

        /// MIME type to send instead of the one derived from the extension
        #[arg(short = 't', long)]
        content_type: Option<String>,
    },

    /// Provision access policies for one bucket, or every default bucket
    Policies {
        /// Bucket name
        bucket: Option<String>,
    },

    /// Print the public URL of an object
    Url {
        /// Object path inside the bucket
        path: String,

        /// Bucket name (defaults to the primary bucket)
        #[arg(short, long)]
        bucket: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Logs go to stderr, stdout carries command output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bucketwise=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load().context("Failed to load configuration")?;
    let service = build_service(&config)?;

    match cli.command {
        Command::Init => {
            let bucket = service.initialize_buckets().await;
            println!("{bucket}");
        }
        Command::Upload {
            files,
            name,
            content_type,
        } => {
            anyhow::ensure!(
                name.is_none() || files.len() == 1,
                "--name can only be used with a single file"
            );

            service.initialize_buckets().await;
            let timeout = config.storage.upload_timeout_secs.map(Duration::from_secs);

            let mut failed = 0usize;
            for path in &files {
                match upload(&service, path, name.as_deref(), content_type.as_deref(), timeout)
                    .await
                {
                    Ok(url) => println!("{url}"),
                    Err(e) => {
                        error!(file = %path.display(), error = ?e, "Upload failed");
                        failed += 1;
                    }
                }
            }
            anyhow::ensure!(failed == 0, "{failed} of {} uploads failed", files.len());
        }
        Command::Policies {
            bucket: Some(bucket),
        } => {
            service
                .create_bucket_policies(&bucket)
                .await
                .with_context(|| format!("Failed to provision policies for {bucket}"))?;
            info!(bucket = %bucket, "Policies provisioned");
        }
        Command::Policies { bucket: None } => {
            service.create_bucket_policies_for_all().await;
        }
        Command::Url { path, bucket } => {
            println!("{}", service.uploads().get_public_url(&path, bucket.as_deref()));
        }
    }

    Ok(())
}

fn build_service(config: &AppConfig) -> anyhow::Result<Service> {
    let client = SupabaseStorageClient::new(supabase_config(&config.supabase))
        .context("Failed to create Supabase client")?;
    let service = StorageService::new(Arc::new(client), storage_config(&config.storage))?;

    info!(
        url = %config.supabase.url,
        buckets = ?config.storage.default_buckets,
        "Storage service configured"
    );
    Ok(service)
}

fn supabase_config(settings: &SupabaseSettings) -> SupabaseConfig {
    SupabaseConfig::new(&settings.url, &settings.service_key)
        .with_policy_function(&settings.policy_function)
        .with_request_timeout(Duration::from_secs(settings.request_timeout_secs))
}

fn storage_config(settings: &StorageSettings) -> StorageConfig {
    StorageConfig::new()
        .with_default_buckets(settings.default_buckets.iter().cloned())
        .with_bucket_size_limit(settings.bucket_size_limit)
        .with_max_attempts(settings.max_attempts)
        .with_retry_base_delay(Duration::from_millis(settings.retry_base_delay_ms))
        .with_cache_control_secs(settings.cache_control_secs)
}

/// Read one file and upload it, honoring the optional deadline.
async fn upload(
    service: &Service,
    path: &Path,
    name: Option<&str>,
    content_type: Option<&str>,
    timeout: Option<Duration>,
) -> anyhow::Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let name = match name {
        Some(name) => name.to_string(),
        None => path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("{} has no usable file name", path.display()))?
            .to_string(),
    };
    let content_type = content_type.unwrap_or_else(|| content_type_for_path(&name));
    let file = FileUpload::new(bytes, content_type);

    let upload = service.upload_file(&file, &name);
    let url = match timeout {
        Some(limit) => tokio::time::timeout(limit, upload)
            .await
            .with_context(|| format!("Upload of {} timed out after {limit:?}", path.display()))??,
        None => upload.await?,
    };
    Ok(url)
}
