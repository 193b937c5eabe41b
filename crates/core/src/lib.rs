//! Core storage logic for Bucketwise.
//!
//! This crate holds bucket lifecycle management and the upload retry and
//! fallback cascade. It has no HTTP dependencies: the storage backend is
//! reached through the [`storage::ObjectStore`] trait, implemented in
//! `bucketwise-supabase`.
//!
//! # Modules
//!
//! - `storage` - Bucket discovery, policy provisioning and resilient uploads

pub mod storage;
