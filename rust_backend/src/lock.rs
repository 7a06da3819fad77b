//! Write exclusion for the shared travel-time store.
//!
//! Every mutating sequence (delete-range + commit, bulk insert + commit,
//! updates + commit) runs while holding a [`WriteGuard`]. Workers that share
//! a store share clones of one [`WriteLock`]; a single worker simply creates
//! its own, which is never contended.

use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Default)]
pub struct WriteLock {
    inner: Arc<Mutex<()>>,
}

/// Held write access; released on drop.
#[derive(Debug)]
pub struct WriteGuard<'a> {
    _guard: MutexGuard<'a, ()>,
}

impl WriteLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive write access.
    pub async fn acquire(&self) -> WriteGuard<'_> {
        WriteGuard {
            _guard: self.inner.lock().await,
        }
    }

    /// Take write access if nobody holds it.
    pub fn try_acquire(&self) -> Option<WriteGuard<'_>> {
        self.inner
            .try_lock()
            .ok()
            .map(|g| WriteGuard { _guard: g })
    }
}
