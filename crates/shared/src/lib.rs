//! Shared configuration for Bucketwise.
//!
//! This crate provides the application-wide configuration consumed by the
//! uploader binary and translated into the core and client settings:
//! - Supabase connection settings
//! - Storage orchestration settings (buckets, limits, retry policy)

pub mod config;

pub use config::{AppConfig, StorageSettings, SupabaseSettings};
