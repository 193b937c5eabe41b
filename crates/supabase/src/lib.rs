//! Supabase Storage backend for Bucketwise.
//!
//! [`SupabaseStorageClient`] implements
//! [`ObjectStore`](bucketwise_core::storage::ObjectStore) over the Storage REST
//! API, with bucket policies provisioned through a PostgREST RPC function.
//! Raw HTTP failures are classified into
//! [`StoreError`](bucketwise_core::storage::StoreError) here so the core never
//! looks at response bodies.

mod client;
mod config;
mod types;

pub use client::SupabaseStorageClient;
pub use config::SupabaseConfig;
