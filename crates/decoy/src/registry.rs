//! Ordered, thread-safe mock storage and per-test isolation scopes.
//!
//! This module provides:
//! - `Registry` - the ordered collection of mocks for one scope
//! - `Scopes` - scope key (origin or generated id) to registry map
//! - `ScopeGuard` - a handle on an open scope; the last one for a key flushes and removes it on drop

use crate::error::MatchError;
use crate::mock::Mock;
use crate::spec::url::normalize_origin;
use bytes::Bytes;
use hyper::Request;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::ops::Deref;
use std::sync::Arc;
use tracing::{debug, warn};

/// Result of resolving a request against a registry.
#[derive(Debug, Default)]
pub struct MatchOutcome {
    /// First live mock that claimed the request.
    pub mock: Option<Arc<Mock>>,
    /// Predicate errors raised by candidates that were skipped.
    pub failures: Vec<MatchError>,
}

/// Ordered mock collection. Resolution order is registration order.
#[derive(Debug, Default)]
pub struct Registry {
    mocks: Mutex<Vec<Arc<Mock>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a mock unless this exact mock is already registered.
    pub fn register(&self, mock: Arc<Mock>) {
        let mut mocks = self.mocks.lock();
        if mocks.iter().any(|m| Arc::ptr_eq(m, &mock)) {
            return;
        }
        debug!(total = mocks.len() + 1, "mock registered");
        mocks.push(mock);
    }

    pub fn exists(&self, mock: &Arc<Mock>) -> bool {
        self.mocks.lock().iter().any(|m| Arc::ptr_eq(m, mock))
    }

    /// Remove this exact mock; no-op if absent.
    pub fn remove(&self, mock: &Arc<Mock>) {
        self.mocks.lock().retain(|m| !Arc::ptr_eq(m, mock));
    }

    pub fn flush(&self) {
        self.mocks.lock().clear();
    }

    /// Drop every mock that is done.
    pub fn clean(&self) {
        Self::clean_locked(&mut self.mocks.lock());
    }

    fn clean_locked(mocks: &mut Vec<Arc<Mock>>) {
        mocks.retain(|mock| !mock.done());
    }

    /// Live mocks in registration order.
    pub fn pending(&self) -> Vec<Arc<Mock>> {
        let mut mocks = self.mocks.lock();
        Self::clean_locked(&mut mocks);
        mocks.clone()
    }

    pub fn is_pending(&self) -> bool {
        let mut mocks = self.mocks.lock();
        Self::clean_locked(&mut mocks);
        !mocks.is_empty()
    }

    /// True when every registered mock has been consumed or disabled.
    pub fn is_done(&self) -> bool {
        !self.is_pending()
    }

    /// Number of registered mocks, done or not.
    pub fn len(&self) -> usize {
        self.mocks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.mocks.lock().is_empty()
    }

    /// Find the first live mock that matches `request`, consuming one of its matches.
    ///
    /// A candidate whose predicates fail to evaluate is skipped and its error
    /// is collected into the outcome.
    pub fn match_request(&self, request: &Request<Bytes>) -> MatchOutcome {
        let candidates = self.pending();
        let mut outcome = MatchOutcome::default();
        for mock in candidates {
            match mock.matches(request) {
                Ok(true) => {
                    debug!(method = %request.method(), uri = %request.uri(), "request matched mock");
                    outcome.mock = Some(mock);
                    return outcome;
                }
                Ok(false) => {}
                Err(err) => {
                    warn!(uri = %request.uri(), error = %err, "mock predicate failed, skipping");
                    outcome.failures.push(err);
                }
            }
        }
        debug!(method = %request.method(), uri = %request.uri(), "no mock matched request");
        outcome
    }
}

#[derive(Debug)]
struct ScopeEntry {
    registry: Arc<Registry>,
    guards: usize,
}

/// Registries keyed by scope: a normalized origin or a generated id.
///
/// A scope stays registered while at least one `ScopeGuard` for its key is alive.
#[derive(Debug, Clone, Default)]
pub struct Scopes {
    registries: Arc<RwLock<HashMap<String, ScopeEntry>>>,
}

fn scope_key(key: &str) -> String {
    if key.contains("://") {
        normalize_origin(key)
    } else {
        key.to_string()
    }
}

impl Scopes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open (or join) the scope for `key`. Origins are normalized to `scheme://host[:port]`.
    pub fn open(&self, key: &str) -> ScopeGuard {
        let key = scope_key(key);
        let registry = {
            let mut registries = self.registries.write();
            let entry = registries.entry(key.clone()).or_insert_with(|| ScopeEntry {
                registry: Arc::new(Registry::new()),
                guards: 0,
            });
            entry.guards += 1;
            debug!(scope = %key, guards = entry.guards, "scope opened");
            Arc::clone(&entry.registry)
        };
        ScopeGuard {
            key,
            registry,
            scopes: self.clone(),
        }
    }

    /// Open a scope under a fresh random key.
    pub fn isolated(&self) -> ScopeGuard {
        self.open(&uuid::Uuid::new_v4().to_string())
    }

    pub fn get(&self, key: &str) -> Option<Arc<Registry>> {
        self.registries
            .read()
            .get(&scope_key(key))
            .map(|entry| Arc::clone(&entry.registry))
    }

    pub fn len(&self) -> usize {
        self.registries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.registries.read().is_empty()
    }

    /// Release one guard; the last one flushes the registry and unregisters the key.
    fn close(&self, key: &str) {
        let mut registries = self.registries.write();
        let Some(entry) = registries.get_mut(key) else {
            return;
        };
        entry.guards = entry.guards.saturating_sub(1);
        if entry.guards > 0 {
            debug!(scope = %key, guards = entry.guards, "scope guard released");
            return;
        }
        if let Some(entry) = registries.remove(key) {
            entry.registry.flush();
        }
        debug!(scope = %key, "scope closed");
    }
}

/// An open scope. Dereferences to its registry; the last guard for a key
/// flushes and unregisters the scope on drop.
#[derive(Debug)]
pub struct ScopeGuard {
    key: String,
    registry: Arc<Registry>,
    scopes: Scopes,
}

impl ScopeGuard {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }
}

impl Deref for ScopeGuard {
    type Target = Registry;

    fn deref(&self) -> &Registry {
        &self.registry
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        self.scopes.close(&self.key);
    }
}
