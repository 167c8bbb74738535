use std::{
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use shared::domain::{OAuthCallProvider, RequestId, SessionKey};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub mod call_providers;
pub mod config;
mod pending_ops;
pub use pending_ops::{PendingOperationRegistry, ProviderCallback};

/// Cloneable handle to one [`PendingOperationRegistry`] shared across tasks.
///
/// Every operation takes the same lock, so an `abandon` is observed by
/// response handlers either entirely or not at all.
#[derive(Clone)]
pub struct CallSetupTracker {
    registry: Arc<Mutex<PendingOperationRegistry>>,
    next_request_id: Arc<AtomicU64>,
    evict_ignored_on_discard: bool,
}

impl Default for CallSetupTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl CallSetupTracker {
    pub fn new() -> Self {
        Self::with_registry(PendingOperationRegistry::new())
    }

    /// Wraps an existing registry. Allocated ids continue past every id it
    /// already holds.
    pub fn with_registry(registry: PendingOperationRegistry) -> Self {
        let first_id = registry
            .highest_request_id()
            .map_or(1, |highest| highest.0.saturating_add(1));
        Self {
            registry: Arc::new(Mutex::new(registry)),
            next_request_id: Arc::new(AtomicU64::new(first_id)),
            evict_ignored_on_discard: true,
        }
    }

    pub fn from_settings(settings: &config::Settings) -> Self {
        let mut tracker = Self::new();
        tracker.evict_ignored_on_discard = settings.evict_ignored_on_discard;
        tracker
    }

    pub fn next_request_id(&self) -> RequestId {
        RequestId(self.next_request_id.fetch_add(1, Ordering::Relaxed))
    }

    pub async fn track_request(&self, key: &SessionKey, request: RequestId) {
        self.registry.lock().await.track_request(key, request);
    }

    pub async fn register_provider_callback(
        &self,
        provider: OAuthCallProvider,
        key: &SessionKey,
        callback: ProviderCallback,
    ) {
        self.registry
            .lock()
            .await
            .register_provider_callback(provider, key, callback);
    }

    pub async fn take_provider_callback(
        &self,
        provider: OAuthCallProvider,
        key: &SessionKey,
    ) -> Option<ProviderCallback> {
        self.registry
            .lock()
            .await
            .take_provider_callback(provider, key)
    }

    /// Runs the pending OAuth completion for `(provider, key)` outside the
    /// lock. Returns whether a callback was pending.
    pub async fn complete_provider_callback(
        &self,
        provider: OAuthCallProvider,
        key: &SessionKey,
    ) -> bool {
        match self.take_provider_callback(provider, key).await {
            Some(callback) => {
                callback();
                true
            }
            None => {
                debug!(
                    key = %key,
                    provider = %provider,
                    "call setup: no pending provider callback"
                );
                false
            }
        }
    }

    pub async fn has_provider_callback(
        &self,
        provider: OAuthCallProvider,
        key: &SessionKey,
    ) -> bool {
        self.registry
            .lock()
            .await
            .has_provider_callback(provider, key)
    }

    pub async fn abandon(&self, key: &SessionKey) {
        info!(key = %key, "call setup: abandoning session");
        self.registry.lock().await.abandon(key);
    }

    pub async fn is_ignored(&self, request: RequestId) -> bool {
        self.registry.lock().await.is_ignored(request)
    }

    pub async fn tracked_requests(&self, key: &SessionKey) -> Vec<RequestId> {
        self.registry.lock().await.tracked_requests(key).to_vec()
    }

    pub async fn ignored_len(&self) -> usize {
        self.registry.lock().await.ignored_len()
    }

    pub async fn reset(&self) {
        self.registry.lock().await.reset();
    }

    /// Tracks `request` under `key` for the lifetime of `operation`. Yields
    /// `None` when the session was abandoned before the response arrived.
    ///
    /// Dropping the returned future before it resolves untracks the request,
    /// so a cancelled call leaves nothing behind in the registry.
    pub async fn run_tracked<F, T>(&self, key: &SessionKey, operation: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        let request = self.next_request_id();
        let mut guard = TrackedRequestGuard {
            registry: Arc::clone(&self.registry),
            key: key.clone(),
            request,
            armed: false,
        };
        self.track_request(key, request).await;
        guard.armed = true;

        let response = operation.await;

        let mut registry = self.registry.lock().await;
        guard.armed = false;
        let discarded = if self.evict_ignored_on_discard {
            registry.take_ignored(request)
        } else {
            registry.is_ignored(request)
        };
        if discarded {
            info!(
                key = %key,
                request_id = request.0,
                "call setup: discarding response for abandoned session"
            );
            return None;
        }

        registry.finish_request(key, request);
        Some(response)
    }
}

/// Clears a [`CallSetupTracker::run_tracked`] request whose future was dropped
/// before its response was handled.
struct TrackedRequestGuard {
    registry: Arc<Mutex<PendingOperationRegistry>>,
    key: SessionKey,
    request: RequestId,
    armed: bool,
}

impl TrackedRequestGuard {
    fn release(registry: &mut PendingOperationRegistry, key: &SessionKey, request: RequestId) {
        registry.finish_request(key, request);
        registry.take_ignored(request);
    }
}

impl Drop for TrackedRequestGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        debug!(
            key = %self.key,
            request_id = self.request.0,
            "call setup: tracked request cancelled"
        );

        if let Ok(mut registry) = self.registry.try_lock() {
            Self::release(&mut registry, &self.key, self.request);
            return;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(
                key = %self.key,
                request_id = self.request.0,
                "call setup: no runtime to release cancelled request"
            );
            return;
        };
        let registry = Arc::clone(&self.registry);
        let key = self.key.clone();
        let request = self.request;
        runtime.spawn(async move {
            Self::release(&mut *registry.lock().await, &key, request);
        });
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
