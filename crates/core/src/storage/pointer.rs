//! Shared mutable bucket references.

use std::sync::{PoisonError, RwLock};

/// Holds at most one bucket name, readable and replaceable from any task.
#[derive(Debug, Default)]
pub struct BucketPointer {
    inner: RwLock<Option<String>>,
}

impl BucketPointer {
    /// Empty pointer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value.
    #[must_use]
    pub fn get(&self) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the value.
    pub fn set(&self, name: impl Into<String>) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(name.into());
    }
}
