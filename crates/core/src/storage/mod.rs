//! Resilient file storage over a bucket-based object store.
//!
//! The backend is abstracted behind [`ObjectStore`]; everything here is
//! orchestration on top of it:
//!
//! - [`BucketService`] discovers, creates and opens up buckets, and
//!   provisions their access policies.
//! - [`UploadService`] retries the current bucket with exponential backoff,
//!   then falls back across every other bucket it knows about.
//! - [`StorageService`] is the facade the application talks to.
//!
//! # Example
//!
//! ```ignore
//! let service = StorageService::new(Arc::new(client), StorageConfig::new())?;
//! service.initialize_buckets().await;
//!
//! let file = FileUpload::new(bytes, "image/png");
//! let url = service.upload_file(&file, "logo.png").await?;
//! ```

mod bucket;
mod config;
mod error;
mod pointer;
mod service;
mod store;
mod upload;
mod utils;

#[cfg(test)]
mod testing;
#[cfg(test)]
mod upload_props;

pub use bucket::{BucketService, prioritize_default_buckets};
pub use config::{BucketOptions, StorageConfig, UploadOptions};
pub use error::{StorageError, StoreError};
pub use pointer::BucketPointer;
pub use service::StorageService;
pub use store::{BucketInfo, FileUpload, ObjectStore};
pub use upload::UploadService;
pub use utils::{
    calculate_backoff_delay, content_type_for_path, format_storage_path, format_storage_path_at,
    get_file_extension, is_image_type, sleep,
};
