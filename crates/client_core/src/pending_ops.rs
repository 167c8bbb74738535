use std::{
    collections::{HashMap, HashSet},
    fmt,
};

use shared::domain::{OAuthCallProvider, RequestId, SessionKey};
use tracing::debug;

pub type ProviderCallback = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
struct ProviderCallbacks {
    zoom: HashMap<SessionKey, ProviderCallback>,
}

impl ProviderCallbacks {
    fn table(&self, provider: OAuthCallProvider) -> &HashMap<SessionKey, ProviderCallback> {
        match provider {
            OAuthCallProvider::Zoom => &self.zoom,
        }
    }

    fn table_mut(
        &mut self,
        provider: OAuthCallProvider,
    ) -> &mut HashMap<SessionKey, ProviderCallback> {
        match provider {
            OAuthCallProvider::Zoom => &mut self.zoom,
        }
    }
}

/// Per-session bookkeeping of in-flight call-setup requests and pending
/// OAuth completion callbacks.
///
/// Abandoning a session never cancels the underlying transport; it only
/// records the session's request ids as ignored so response handlers can
/// drop whatever arrives later.
#[derive(Default)]
pub struct PendingOperationRegistry {
    requests: HashMap<SessionKey, Vec<RequestId>>,
    ignored: HashSet<RequestId>,
    callbacks: ProviderCallbacks,
}

impl PendingOperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn track_request(&mut self, key: &SessionKey, request: RequestId) {
        debug!(key = %key, request_id = request.0, "call setup: tracking request");
        self.requests.entry(key.clone()).or_default().push(request);
    }

    /// Drops a request that completed normally. Abandoned requests are not
    /// in the live map anymore, so this is a no-op for them.
    pub fn finish_request(&mut self, key: &SessionKey, request: RequestId) {
        let Some(requests) = self.requests.get_mut(key) else {
            return;
        };
        requests.retain(|tracked| *tracked != request);
        if requests.is_empty() {
            self.requests.remove(key);
        }
    }

    pub fn tracked_requests(&self, key: &SessionKey) -> &[RequestId] {
        self.requests.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn register_provider_callback(
        &mut self,
        provider: OAuthCallProvider,
        key: &SessionKey,
        callback: ProviderCallback,
    ) {
        let replaced = self
            .callbacks
            .table_mut(provider)
            .insert(key.clone(), callback)
            .is_some();
        debug!(
            key = %key,
            provider = %provider,
            replaced,
            "call setup: registered provider callback"
        );
    }

    pub fn has_provider_callback(&self, provider: OAuthCallProvider, key: &SessionKey) -> bool {
        self.callbacks.table(provider).contains_key(key)
    }

    pub fn take_provider_callback(
        &mut self,
        provider: OAuthCallProvider,
        key: &SessionKey,
    ) -> Option<ProviderCallback> {
        self.callbacks.table_mut(provider).remove(key)
    }

    /// Runs and clears the pending callback for `(provider, key)`. Returns
    /// whether one was pending.
    pub fn complete_provider_callback(
        &mut self,
        provider: OAuthCallProvider,
        key: &SessionKey,
    ) -> bool {
        match self.take_provider_callback(provider, key) {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }

    pub fn abandon(&mut self, key: &SessionKey) {
        for provider in OAuthCallProvider::ALL {
            self.callbacks.table_mut(provider).remove(key);
        }

        let Some(requests) = self.requests.remove(key) else {
            return;
        };
        debug!(
            key = %key,
            abandoned = requests.len(),
            "call setup: abandoning tracked requests"
        );
        self.ignored.extend(requests);
    }

    pub fn is_ignored(&self, request: RequestId) -> bool {
        self.ignored.contains(&request)
    }

    /// Like [`Self::is_ignored`], but forgets the id on a hit. Use once the
    /// response for `request` has arrived and is being discarded.
    pub fn take_ignored(&mut self, request: RequestId) -> bool {
        self.ignored.remove(&request)
    }

    pub fn ignored_len(&self) -> usize {
        self.ignored.len()
    }

    /// Largest request id currently tracked or ignored.
    pub fn highest_request_id(&self) -> Option<RequestId> {
        self.requests
            .values()
            .flatten()
            .chain(self.ignored.iter())
            .max_by_key(|request| request.0)
            .copied()
    }
}

impl fmt::Debug for PendingOperationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingOperationRegistry")
            .field("requests", &self.requests)
            .field("ignored", &self.ignored)
            .field(
                "zoom_callbacks",
                &self.callbacks.zoom.keys().collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/pending_ops_tests.rs"]
mod tests;
