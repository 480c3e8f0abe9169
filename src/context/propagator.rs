//! Task-local request context.
//!
//! Every inbound request runs inside its own [`ContextPropagator::scope`].
//! Reads and writes only ever touch the scope of the task currently being
//! polled, so two requests interleaved on the same worker thread (or even
//! joined inside the same task) keep separate entries.

use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use serde::Serialize;

use crate::context::HeaderSet;

/// Context key holding the correlation id of the current request.
pub const CORRELATION_ID_KEY: &str = "correlationId";

/// Context key holding the normalized client platform.
pub const PLATFORM_KEY: &str = "platform";

struct RequestScope {
    entries: RefCell<HashMap<String, String>>,
    inbound: Option<Arc<HeaderSet>>,
}

tokio::task_local! {
    static ACTIVE_SCOPE: RequestScope;
}

/// Snapshot of the well-known entries of the current request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    pub correlation_id: String,
    pub platform: String,
}

/// Accessor for the execution-scoped request context.
pub struct ContextPropagator;

impl ContextPropagator {
    /// Run `fut` inside a fresh, empty context.
    ///
    /// `inbound` is the header snapshot of the request being served, or
    /// `None` for work that does not originate from an inbound request.
    pub async fn scope<F>(inbound: Option<HeaderSet>, fut: F) -> F::Output
    where
        F: Future,
    {
        ACTIVE_SCOPE.scope(RequestScope::new(inbound), fut).await
    }

    /// Synchronous variant of [`ContextPropagator::scope`].
    pub fn sync_scope<R>(inbound: Option<HeaderSet>, f: impl FnOnce() -> R) -> R {
        ACTIVE_SCOPE.sync_scope(RequestScope::new(inbound), f)
    }

    /// True when the caller runs inside a request scope.
    pub fn is_active() -> bool {
        ACTIVE_SCOPE.try_with(|_| ()).is_ok()
    }

    /// Store `value` under `key`. Returns false (and stores nothing) outside a scope.
    pub fn set(key: impl Into<String>, value: impl Into<String>) -> bool {
        ACTIVE_SCOPE
            .try_with(|scope| {
                scope.entries.borrow_mut().insert(key.into(), value.into());
            })
            .is_ok()
    }

    pub fn get(key: &str) -> Option<String> {
        ACTIVE_SCOPE
            .try_with(|scope| scope.entries.borrow().get(key).cloned())
            .ok()
            .flatten()
    }

    pub fn remove(key: &str) -> Option<String> {
        ACTIVE_SCOPE
            .try_with(|scope| scope.entries.borrow_mut().remove(key))
            .ok()
            .flatten()
    }

    /// Drop every entry of the current scope. No-op outside a scope.
    pub fn clear() {
        let _ = ACTIVE_SCOPE.try_with(|scope| scope.entries.borrow_mut().clear());
    }

    /// Guard that clears the current scope when dropped.
    pub fn clear_on_drop() -> ContextGuard {
        ContextGuard { _private: () }
    }

    /// Header snapshot of the inbound request being served, if any.
    pub fn inbound_headers() -> Option<Arc<HeaderSet>> {
        ACTIVE_SCOPE
            .try_with(|scope| scope.inbound.clone())
            .ok()
            .flatten()
    }

    pub fn correlation_id() -> Option<String> {
        Self::get(CORRELATION_ID_KEY)
    }

    pub fn platform() -> Option<String> {
        Self::get(PLATFORM_KEY)
    }

    /// Well-known entries of the current request, if a correlation id is set.
    pub fn snapshot() -> Option<RequestContext> {
        let correlation_id = Self::correlation_id()?;
        Some(RequestContext {
            correlation_id,
            platform: Self::platform().unwrap_or_default(),
        })
    }
}

impl RequestScope {
    fn new(inbound: Option<HeaderSet>) -> Self {
        Self {
            entries: RefCell::new(HashMap::new()),
            inbound: inbound.map(Arc::new),
        }
    }
}

/// Clears the request context on drop, including during unwinding and
/// when the owning future is cancelled.
#[must_use = "the context is cleared as soon as the guard is dropped"]
pub struct ContextGuard {
    _private: (),
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        ContextPropagator::clear();
    }
}
