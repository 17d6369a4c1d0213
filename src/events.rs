//! Lifecycle event bus.
//!
//! A small typed emitter plus the crate-wide lifecycle channel. The engine
//! publishes three notifications while rendering:
//!
//! - `Update` — once per component fiber, at the start of its render
//! - `Commit` — once per non-root fiber, after its child subtree and all of
//!   its later siblings have fully committed
//! - `Remove` — once per fiber being torn down
//!
//! Listeners run in registration order. Closures cannot be compared, so
//! deregistration uses the [`ListenerId`] returned at registration time
//! instead of the callback itself.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::engine::arena::FiberId;
use crate::types::{EffectTag, NodeType, Props};

// =============================================================================
// Generic Emitter
// =============================================================================

/// Identifies one registered listener for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Entry<K, P> {
    id: ListenerId,
    kind: K,
    once: bool,
    callback: Rc<dyn Fn(&P)>,
}

/// A typed event emitter: listeners keyed by an event kind, invoked in
/// registration order.
pub struct Emitter<K, P> {
    entries: RefCell<Vec<Entry<K, P>>>,
    next_id: Cell<u64>,
}

impl<K: Copy + PartialEq, P> Emitter<K, P> {
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    fn register(&self, kind: K, once: bool, callback: Rc<dyn Fn(&P)>) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.entries.borrow_mut().push(Entry {
            id,
            kind,
            once,
            callback,
        });
        id
    }

    /// Register a listener for every occurrence of `kind`.
    pub fn on(&self, kind: K, callback: impl Fn(&P) + 'static) -> ListenerId {
        self.register(kind, false, Rc::new(callback))
    }

    /// Register a listener for the next occurrence of `kind` only.
    pub fn once(&self, kind: K, callback: impl Fn(&P) + 'static) -> ListenerId {
        self.register(kind, true, Rc::new(callback))
    }

    /// Remove a listener. Unknown ids are ignored.
    pub fn off(&self, id: ListenerId) {
        self.entries.borrow_mut().retain(|e| e.id != id);
    }

    /// Invoke all listeners registered for `kind`, in registration order.
    ///
    /// One-shot listeners are consumed before their callback runs, so a
    /// re-entrant emit cannot fire them twice. Listeners registered during
    /// emission see only later occurrences.
    pub fn emit(&self, kind: K, payload: &P) {
        let fired: Vec<Rc<dyn Fn(&P)>> = {
            let mut entries = self.entries.borrow_mut();
            let fired = entries
                .iter()
                .filter(|e| e.kind == kind)
                .map(|e| Rc::clone(&e.callback))
                .collect();
            entries.retain(|e| !(e.kind == kind && e.once));
            fired
        };
        for callback in fired {
            callback(payload);
        }
    }

    pub fn listener_count(&self, kind: K) -> usize {
        self.entries.borrow().iter().filter(|e| e.kind == kind).count()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

impl<K: Copy + PartialEq, P> Default for Emitter<K, P> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Lifecycle Channel
// =============================================================================

/// The three lifecycle notifications published by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    Update,
    Commit,
    Remove,
}

/// Snapshot of the fiber a lifecycle notification is about.
#[derive(Debug, Clone)]
pub struct FiberEvent {
    /// Arena handle of the fiber within its generation.
    pub fiber: FiberId,
    pub ty: NodeType,
    pub tag: Option<EffectTag>,
    pub props: Rc<Props>,
}

impl FiberEvent {
    /// Display name of the fiber's node type.
    pub fn name(&self) -> &str {
        self.ty.name()
    }
}

thread_local! {
    static LIFECYCLE: Emitter<LifecycleEvent, FiberEvent> = Emitter::new();
}

/// Register a lifecycle listener.
pub fn add_listener(kind: LifecycleEvent, callback: impl Fn(&FiberEvent) + 'static) -> ListenerId {
    LIFECYCLE.with(|bus| bus.on(kind, callback))
}

/// Register a lifecycle listener for one occurrence only.
pub fn add_listener_once(
    kind: LifecycleEvent,
    callback: impl Fn(&FiberEvent) + 'static,
) -> ListenerId {
    LIFECYCLE.with(|bus| bus.once(kind, callback))
}

/// Remove a previously registered lifecycle listener.
pub fn remove_listener(id: ListenerId) {
    LIFECYCLE.with(|bus| bus.off(id));
}

pub(crate) fn emit(kind: LifecycleEvent, payload: &FiberEvent) {
    LIFECYCLE.with(|bus| bus.emit(kind, payload));
}

/// Drop all lifecycle listeners (for testing).
pub fn reset_listeners() {
    LIFECYCLE.with(|bus| bus.clear());
}

// =============================================================================
// Tests
// =============================================================================
