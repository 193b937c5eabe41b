//! Property-based tests for bucket ordering, backoff and the upload cascade.

use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;

use super::bucket::{BucketService, prioritize_default_buckets};
use super::config::StorageConfig;
use super::error::{StorageError, StoreError};
use super::store::FileUpload;
use super::testing::MemoryStore;
use super::upload::UploadService;
use super::utils::calculate_backoff_delay;

/// Bucket names drawn from a small alphabet so defaults and listings overlap.
fn bucket_name() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["a", "b", "c", "d", "e", "f"]).prop_map(str::to_string)
}

fn run_paused<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .expect("runtime")
        .block_on(future)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Default buckets come first and both groups keep their listing order.
    #[test]
    fn prop_prioritize_is_stable_partition(
        names in prop::collection::vec(bucket_name(), 0..10),
        defaults in prop::collection::vec(bucket_name(), 0..4),
    ) {
        let result = prioritize_default_buckets(names.clone(), &defaults);

        prop_assert_eq!(result.len(), names.len());

        let split = result.iter().take_while(|n| defaults.contains(n)).count();
        prop_assert!(result[split..].iter().all(|n| !defaults.contains(n)));

        let preferred: Vec<_> = names.iter().filter(|n| defaults.contains(n)).collect();
        let others: Vec<_> = names.iter().filter(|n| !defaults.contains(n)).collect();
        prop_assert_eq!(result[..split].iter().collect::<Vec<_>>(), preferred);
        prop_assert_eq!(result[split..].iter().collect::<Vec<_>>(), others);
    }

    /// Delay doubles with every attempt.
    #[test]
    fn prop_backoff_doubles(attempt in 0u32..16, base_ms in 1u64..5_000) {
        let base = Duration::from_millis(base_ms);
        prop_assert_eq!(
            calculate_backoff_delay(attempt, base),
            Duration::from_millis(base_ms * (1u64 << attempt))
        );
    }

    /// A cascade where every target fails makes `max_attempts` tries on the
    /// current bucket, one per other existing bucket, one per default bucket
    /// whose creation yields a name, and one last-resort try when any did.
    /// That never exceeds `max_attempts + (E - 1) + U + 1`.
    #[test]
    fn prop_failed_cascade_is_bounded(
        max_attempts in 1u32..6,
        defaults in prop::collection::btree_set(bucket_name(), 1..4),
        existing in prop::collection::btree_set(bucket_name(), 0..4),
        create_failures in prop::collection::btree_map(bucket_name(), any::<bool>(), 0..4),
    ) {
        let defaults: Vec<String> = defaults.into_iter().collect();
        let existing: Vec<&str> = existing.iter().map(String::as_str).collect();

        let mut store = MemoryStore::with_buckets(&existing);
        for name in ["a", "b", "c", "d", "e", "f"] {
            store = store.fail_uploads_to(name);
        }
        // `true` is a soft rejection the service treats as created.
        for (name, soft) in &create_failures {
            let error = if *soft {
                StoreError::permission_denied("row-level security policy")
            } else {
                StoreError::rejected(500, "internal")
            };
            store = store.fail_create(name, error);
        }
        let store = Arc::new(store);

        let config = Arc::new(
            StorageConfig::new()
                .with_default_buckets(defaults.iter().cloned())
                .with_max_attempts(max_attempts),
        );
        let buckets = Arc::new(BucketService::new(Arc::clone(&store), config).expect("valid config"));
        let uploads = UploadService::new(Arc::clone(&store), buckets);

        let file = FileUpload::new(b"x".to_vec(), "text/plain");
        let result = run_paused(uploads.upload_file_with_retry(&file, "p", max_attempts));

        let targets = store.upload_targets();
        let unseen = defaults
            .iter()
            .filter(|d| !existing.contains(&d.as_str()))
            .count();
        let bound = max_attempts as usize + existing.len() + unseen;

        let created = store
            .create_attempts()
            .iter()
            .filter(|name| create_failures.get(*name) != Some(&false))
            .count();
        let expected = max_attempts as usize
            + existing.len().saturating_sub(1)
            + created
            + usize::from(created > 0);

        prop_assert!(targets.len() >= max_attempts as usize);
        prop_assert!(targets.len() <= bound, "{} targets, bound {}", targets.len(), bound);
        prop_assert_eq!(targets.len(), expected);
        match result {
            Err(StorageError::UploadFailed { attempts, .. }) => {
                prop_assert_eq!(attempts as usize, targets.len());
            }
            other => prop_assert!(false, "unexpected result: {:?}", other),
        }
    }
}
