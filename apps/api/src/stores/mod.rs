//! Opportunity stores: per-session state machines orchestrating
//! fetch, filter, sort, paginate and page hydration.
//!
//! Each store is a plain struct owned by a `StoreHandle`. A handle serializes
//! access through an async mutex and carries the current cancellation token
//! for the store's single superseding request stream: starting a new
//! orchestration call cancels the previous one and installs a fresh token.

pub mod engine;
pub mod handlers;
pub mod phases;
pub mod plan;
pub mod search;
pub mod tool;

#[cfg(test)]
pub(crate) mod fake;

use std::sync::Mutex as StdMutex;

use tokio::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

/// Default page size when a request does not specify one.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Owns one store plus the cancellation token of its in-flight request.
///
/// The token lives outside the async mutex on purpose: superseding must be
/// possible while a previous call still holds the store lock, otherwise the
/// old request could never be interrupted.
pub struct StoreHandle<S> {
    cancel: StdMutex<CancellationToken>,
    inner: Mutex<S>,
}

impl<S> StoreHandle<S> {
    pub fn new(store: S) -> Self {
        Self {
            cancel: StdMutex::new(CancellationToken::new()),
            inner: Mutex::new(store),
        }
    }

    /// Cancels the previous request stream and installs a fresh token for
    /// the caller. The old token is replaced, never reused.
    pub fn supersede(&self) -> CancellationToken {
        let mut guard = self.cancel.lock().expect("cancel token lock poisoned");
        guard.cancel();
        *guard = CancellationToken::new();
        guard.clone()
    }

    pub async fn lock(&self) -> MutexGuard<'_, S> {
        self.inner.lock().await
    }
}
