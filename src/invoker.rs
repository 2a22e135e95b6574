//! Error collection around units of work.
//!
//! [`CollectingInvoker`] runs an operation and, when it fails with a
//! [`DomainError`], records the error in the active collector and resolves it
//! by its action:
//!
//! | Action | Collector active | Outcome |
//! |--------|------------------|---------|
//! | `Raise` | any | error propagates |
//! | `Indecisive` | any | error propagates |
//! | `Continue` | yes | absorbed, fallback returned |
//! | `Continue` | no | error propagates |
//!
//! Non-domain failures ([`Fault::Other`]) are never recorded; they are
//! reported to the configured [`ExceptionSink`] and propagate unchanged.
//!
//! # Example
//!
//! ```rust
//! use http::StatusCode;
//! use pwext::{CollectingInvoker, DomainError, Fault};
//!
//! fn send_offer(customer: &str) -> Result<String, Fault> {
//!     if customer != "nisse@example.com" {
//!         return Err(DomainError::with_return("Failed to find customer", "my bad")
//!             .with_code(StatusCode::NOT_FOUND)
//!             .into());
//!     }
//!     Ok(customer.to_string())
//! }
//!
//! let root = CollectingInvoker::root();
//! let leaf = CollectingInvoker::new();
//!
//! let sent = root.invoke(|| {
//!     let sent: Vec<Option<String>> = ["ivar@example.com", "nisse@example.com"]
//!         .iter()
//!         .map(|c| leaf.invoke(|| send_offer(c)).map(|r| r.into_value()))
//!         .collect::<Result<_, _>>()?;
//!     assert_eq!(CollectingInvoker::collector().map(|c| c.len()), Some(1));
//!     Ok(sent)
//! });
//!
//! let sent = sent.unwrap().value().unwrap();
//! assert_eq!(sent, vec![Some("my bad".to_string()), Some("nisse@example.com".to_string())]);
//! ```

use crate::error::{DomainError, Fault};
use crate::logging::{log_debug, ExceptionSink};
use crate::scope::{self, CollectorHandle};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Outcome of a collected invocation that did not propagate.
#[derive(Debug, Clone, PartialEq)]
pub enum Collected<T> {
    /// The operation completed normally.
    Value(T),
    /// A `Continue` error was recorded and swallowed. Carries the error's
    /// return value for the "with-return" flavour, `None` otherwise.
    Absorbed(Option<Value>),
}

impl<T> Collected<T> {
    pub fn is_absorbed(&self) -> bool {
        matches!(self, Self::Absorbed(_))
    }

    /// The operation's own result, discarding any absorbed fallback.
    pub fn value(self) -> Option<T> {
        match self {
            Self::Value(v) => Some(v),
            Self::Absorbed(_) => None,
        }
    }

    /// The operation's result, or the absorbed return value converted to `T`.
    ///
    /// Yields `None` when nothing was returned or the return value does not
    /// convert to `T`.
    pub fn into_value(self) -> Option<T>
    where
        T: DeserializeOwned,
    {
        match self {
            Self::Value(v) => Some(v),
            Self::Absorbed(None) => None,
            Self::Absorbed(Some(raw)) => match serde_json::from_value(raw) {
                Ok(v) => Some(v),
                Err(e) => {
                    log_debug!(
                        error = %e,
                        target_type = std::any::type_name::<T>(),
                        "Absorbed return value does not convert to the expected type"
                    );
                    None
                }
            },
        }
    }
}

/// Wraps units of work with error collection.
///
/// A root invoker installs a collector when none is active; any other
/// invoker shares whichever collector encloses it.
#[derive(Clone)]
pub struct CollectingInvoker {
    root: bool,
    label: Cow<'static, str>,
    sink: Option<Arc<dyn ExceptionSink>>,
}

impl fmt::Debug for CollectingInvoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectingInvoker")
            .field("root", &self.root)
            .field("label", &self.label)
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

impl Default for CollectingInvoker {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectingInvoker {
    /// Invoker that shares the enclosing collector, if any.
    pub fn new() -> Self {
        Self {
            root: false,
            label: Cow::Borrowed("operation"),
            sink: None,
        }
    }

    /// Invoker that installs a collector for its call tree when none is active.
    pub fn root() -> Self {
        Self {
            root: true,
            ..Self::new()
        }
    }

    /// Name of the wrapped unit of work, used in logs.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<Cow<'static, str>>) -> Self {
        self.label = label.into();
        self
    }

    /// Report non-domain failures to `sink` before propagating them.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn ExceptionSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn is_root(&self) -> bool {
        self.root
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// The active collector, if a root scope encloses the caller.
    pub fn collector() -> Option<CollectorHandle> {
        scope::current()
    }

    /// The active collector, or a detached one when no scope is active.
    pub fn collector_or_detached() -> CollectorHandle {
        scope::current().unwrap_or_else(CollectorHandle::detached)
    }

    /// Run `op` with error collection.
    ///
    /// # Errors
    ///
    /// Returns the operation's [`Fault`] when it must propagate: any
    /// non-domain failure, and domain errors whose action is `Raise` or
    /// `Indecisive`, or that have no active collector to be recorded in.
    pub fn invoke<T, F>(&self, op: F) -> Result<Collected<T>, Fault>
    where
        F: FnOnce() -> Result<T, Fault>,
    {
        let _guard = if self.root { scope::enter_root() } else { None };
        let result = op();
        self.resolve(result)
    }

    /// Async counterpart of [`invoke`](Self::invoke).
    ///
    /// A root invoker binds its collector to the running task.
    ///
    /// # Errors
    ///
    /// Same as [`invoke`](Self::invoke).
    pub async fn invoke_async<T, Fut>(&self, fut: Fut) -> Result<Collected<T>, Fault>
    where
        Fut: Future<Output = Result<T, Fault>>,
    {
        if self.root {
            scope::scope_root(async move {
                let result = fut.await;
                self.resolve(result)
            })
            .await
        } else {
            let result = fut.await;
            self.resolve(result)
        }
    }

    /// Apply the record/absorb/propagate rules to an operation's result.
    fn resolve<T>(&self, result: Result<T, Fault>) -> Result<Collected<T>, Fault> {
        match result {
            Ok(value) => Ok(Collected::Value(value)),
            Err(Fault::Domain(err)) => self.resolve_domain(err),
            Err(Fault::Other(err)) => {
                if let Some(sink) = &self.sink {
                    sink.log_exception(&self.label, &*err);
                }
                Err(Fault::Other(err))
            }
        }
    }

    fn resolve_domain<T>(&self, mut err: DomainError) -> Result<Collected<T>, Fault> {
        let Some(collector) = scope::current() else {
            log_debug!(
                label = %self.label,
                code = err.code().as_u16(),
                action = %err.action(),
                "No active collector, propagating domain error"
            );
            return Err(Fault::Domain(err));
        };

        collector.record(&mut err);

        if err.propagates() {
            log_debug!(
                label = %self.label,
                scope_id = %collector.scope_id(),
                code = err.code().as_u16(),
                action = %err.action(),
                "Domain error recorded and propagated"
            );
            return Err(Fault::Domain(err));
        }

        log_debug!(
            label = %self.label,
            scope_id = %collector.scope_id(),
            code = err.code().as_u16(),
            has_return = err.has_return(),
            "Domain error recorded and absorbed"
        );
        Ok(Collected::Absorbed(err.into_return_value()))
    }
}
