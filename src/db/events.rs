// Resolution Events
// Priority-ordered, cancellable observer gates fired before each resolution

use crate::db::traits::{DatabaseDriver, DatabaseForge, DatabaseUtility};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Outcome of firing a gate.
///
/// Cancellation is a valid result, not an error: the resolution yields no
/// handle and the caller is expected to treat that distinctly from failure.
pub enum ExtensionOutcome<E> {
    /// Resolution proceeds with the (possibly modified) event fields
    Continue(E),
    /// An observer vetoed the resolution
    Cancelled,
}

/// Implemented by event types carrying a cancellation flag.
pub trait CancellableEvent {
    fn is_cancelled(&self) -> bool;
}

/// Handle for removing a registered observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverId(u64);

struct ObserverEntry<E> {
    id: u64,
    priority: i32,
    callback: Box<dyn Fn(&mut E) + Send + Sync>,
}

/// A single named extension point.
///
/// Observers run synchronously in ascending priority order; ties run in
/// registration order. Each observer sees the cumulative mutations of the
/// ones before it. The cancellation flag is checked after every observer, so
/// a cancel short-circuits the rest of the chain.
pub struct EventGate<E> {
    observers: RwLock<Vec<ObserverEntry<E>>>,
    next_id: AtomicU64,
}

impl<E: CancellableEvent> EventGate<E> {
    pub fn new() -> Self {
        Self {
            observers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Register an observer. Lower priority values run first.
    pub fn observe<F>(&self, priority: i32, callback: F) -> ObserverId
    where
        F: Fn(&mut E) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut observers = self.observers.write();
        observers.push(ObserverEntry {
            id,
            priority,
            callback: Box::new(callback),
        });
        // Ids are monotonic, so the sort keeps ties in registration order
        observers.sort_by_key(|entry| (entry.priority, entry.id));
        ObserverId(id)
    }

    /// Remove a previously registered observer
    pub fn remove(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.write();
        let before = observers.len();
        observers.retain(|entry| entry.id != id.0);
        observers.len() < before
    }

    pub fn observer_count(&self) -> usize {
        self.observers.read().len()
    }

    /// Fire the event through every observer.
    pub fn fire(&self, mut event: E) -> ExtensionOutcome<E> {
        let observers = self.observers.read();
        for entry in observers.iter() {
            (entry.callback)(&mut event);
            if event.is_cancelled() {
                return ExtensionOutcome::Cancelled;
            }
        }
        ExtensionOutcome::Continue(event)
    }
}

impl<E: CancellableEvent> Default for EventGate<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Fired before a connection resolution.
///
/// Observers may rewrite the locator, toggle the flags, supply a ready-made
/// handle (installed under the default slot when the locator is empty, under
/// the locator key otherwise), or cancel the resolution.
pub struct ConnectionResolveEvent {
    /// Locator string or named group key
    pub locator: String,
    /// Whether the caller asked for a fresh instance
    pub force_new: bool,
    /// Query-builder override requested by the caller
    pub query_builder: Option<bool>,
    /// Ready-made handle substituting the whole resolution
    pub database: Option<Arc<dyn DatabaseDriver>>,
    cancelled: bool,
}

impl ConnectionResolveEvent {
    pub(crate) fn new(locator: &str, force_new: bool, query_builder: Option<bool>) -> Self {
        Self {
            locator: locator.to_string(),
            force_new,
            query_builder,
            database: None,
            cancelled: false,
        }
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }
}

impl CancellableEvent for ConnectionResolveEvent {
    fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

/// Fired before a forge resolution.
pub struct ForgeResolveEvent {
    /// Connection the forge should bind to; the default connection is
    /// resolved lazily when absent
    pub database: Option<Arc<dyn DatabaseDriver>>,
    /// Whether the caller asked for a fresh instance
    pub force_new: bool,
    /// Ready-made forge substituting the whole resolution
    pub forge: Option<Arc<dyn DatabaseForge>>,
    cancelled: bool,
}

impl ForgeResolveEvent {
    pub(crate) fn new(database: Option<Arc<dyn DatabaseDriver>>, force_new: bool) -> Self {
        Self {
            database,
            force_new,
            forge: None,
            cancelled: false,
        }
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }
}

impl CancellableEvent for ForgeResolveEvent {
    fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

/// Fired before a utility resolution.
pub struct UtilityResolveEvent {
    /// Connection the utility should bind to; the default connection is
    /// resolved lazily when absent
    pub database: Option<Arc<dyn DatabaseDriver>>,
    /// Whether the caller asked for a fresh instance
    pub force_new: bool,
    /// Ready-made utility substituting the whole resolution
    pub utility: Option<Arc<dyn DatabaseUtility>>,
    cancelled: bool,
}

impl UtilityResolveEvent {
    pub(crate) fn new(database: Option<Arc<dyn DatabaseDriver>>, force_new: bool) -> Self {
        Self {
            database,
            force_new,
            utility: None,
            cancelled: false,
        }
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }
}

impl CancellableEvent for UtilityResolveEvent {
    fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}
