//! Binding of "the current collector" to one logical execution context.
//!
//! A root scope installs a fresh [`ErrorCollector`] that every nested call on
//! the same call tree shares. The binding lives in:
//! - a thread-local slot for synchronous code, owned by a [`ScopeGuard`];
//! - a tokio task-local slot for async code, entered with [`scope_root`],
//!   so it follows the task across worker threads.
//!
//! Lookups consult the task-local slot first, then the thread-local one.
//! Unrelated threads and tasks never see each other's collector.
//!
//! ```rust
//! use pwext::{scope, DomainError};
//!
//! assert!(scope::current().is_none());
//! {
//!     let _guard = scope::enter_root();
//!     scope::current().unwrap().add(DomainError::new("recorded"));
//!     assert_eq!(scope::current().unwrap().len(), 1);
//! }
//! assert!(scope::current().is_none());
//! ```

use crate::collector::ErrorCollector;
use crate::error::DomainError;
use crate::logging::log_debug;
use serde_json::Value;
use std::cell::RefCell;
use std::future::Future;
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::Instrument;
use uuid::Uuid;

thread_local! {
    static THREAD_COLLECTOR: RefCell<Option<CollectorHandle>> = const { RefCell::new(None) };
}

tokio::task_local! {
    static TASK_COLLECTOR: CollectorHandle;
}

/// Shared reference to the collector of a root scope.
///
/// Cloning is cheap; every clone appends to the same collector. Only one
/// execution context ever touches a given collector, so the lock is uncontended.
#[derive(Debug, Clone)]
pub struct CollectorHandle {
    collector: Arc<Mutex<ErrorCollector>>,
    scope_id: Uuid,
}

impl CollectorHandle {
    fn new() -> Self {
        Self {
            collector: Arc::new(Mutex::new(ErrorCollector::new())),
            scope_id: Uuid::new_v4(),
        }
    }

    /// A collector bound to no scope. Errors added to it go nowhere else.
    pub fn detached() -> Self {
        Self::new()
    }

    /// Correlation id of the root scope, as recorded in log spans.
    pub fn scope_id(&self) -> Uuid {
        self.scope_id
    }

    fn lock(&self) -> MutexGuard<'_, ErrorCollector> {
        self.collector.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with exclusive access to the collector.
    pub fn with<R>(&self, f: impl FnOnce(&mut ErrorCollector) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn add(&self, err: DomainError) {
        self.lock().add(err);
    }

    /// Record `err` unless it already passed through this scope.
    ///
    /// Returns whether the error was added.
    pub(crate) fn record(&self, err: &mut DomainError) -> bool {
        if err.is_recorded_in(self.scope_id) {
            return false;
        }
        err.mark_recorded(self.scope_id);
        self.add(err.clone());
        true
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn has_errors(&self) -> bool {
        self.lock().has_errors()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of the collected errors, in insertion order.
    pub fn errors(&self) -> Vec<DomainError> {
        self.lock().errors().to_vec()
    }

    /// Copy of the whole collector.
    pub fn snapshot(&self) -> ErrorCollector {
        self.lock().clone()
    }

    pub fn highest(&self) -> Option<DomainError> {
        self.lock().highest().cloned()
    }

    pub fn to_value(&self) -> Option<Value> {
        self.lock().to_value()
    }

    /// Whether both handles refer to the same collector.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.collector, &other.collector)
    }
}

/// The collector of the enclosing root scope, if any.
pub fn current() -> Option<CollectorHandle> {
    TASK_COLLECTOR
        .try_with(CollectorHandle::clone)
        .ok()
        .or_else(|| THREAD_COLLECTOR.with(|slot| slot.borrow().clone()))
}

/// Whether a root scope is active on this call tree.
pub fn is_active() -> bool {
    current().is_some()
}

/// Keeps a thread-bound root scope alive; removes the collector when dropped.
///
/// Dropping happens on every exit path, including unwinding panics. The guard
/// is tied to the thread it was created on.
#[must_use = "the root scope ends when the guard is dropped"]
pub struct ScopeGuard {
    handle: CollectorHandle,
    _span: tracing::span::EnteredSpan,
    _not_send: PhantomData<Rc<()>>,
}

impl ScopeGuard {
    /// The collector owned by this scope.
    pub fn collector(&self) -> &CollectorHandle {
        &self.handle
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        THREAD_COLLECTOR.with(|slot| slot.borrow_mut().take());
        log_debug!(
            scope_id = %self.handle.scope_id,
            collected = self.handle.len(),
            "Root error scope closed"
        );
    }
}

/// Install a fresh collector for the current thread unless one is already active.
///
/// Returns `None` when an enclosing scope exists; nested roots reuse it.
pub fn enter_root() -> Option<ScopeGuard> {
    if is_active() {
        return None;
    }

    let handle = CollectorHandle::new();
    let span = tracing::debug_span!("error_scope", scope_id = %handle.scope_id).entered();
    THREAD_COLLECTOR.with(|slot| *slot.borrow_mut() = Some(handle.clone()));
    log_debug!(scope_id = %handle.scope_id, "Root error scope opened");

    Some(ScopeGuard {
        handle,
        _span: span,
        _not_send: PhantomData,
    })
}

/// Run `fut` inside a root scope bound to the current task.
///
/// An already active collector (task- or thread-bound) is reused and carried
/// along with the task; otherwise a fresh one is installed for the duration of
/// `fut` and discarded when it completes or is dropped.
pub async fn scope_root<F: Future>(fut: F) -> F::Output {
    if TASK_COLLECTOR.try_with(|_| ()).is_ok() {
        return fut.await;
    }

    if let Some(handle) = current() {
        return TASK_COLLECTOR.scope(handle, fut).await;
    }

    let handle = CollectorHandle::new();
    let scope_id = handle.scope_id;
    let span = tracing::debug_span!("error_scope", scope_id = %scope_id);
    log_debug!(scope_id = %scope_id, "Root error scope opened for task");

    let output = TASK_COLLECTOR
        .scope(handle.clone(), fut)
        .instrument(span)
        .await;

    log_debug!(
        scope_id = %scope_id,
        collected = handle.len(),
        "Root error scope closed for task"
    );
    output
}
