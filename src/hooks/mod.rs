//! Hooks: ordered, per-fiber local state.
//!
//! A component's hooks live in slots indexed by call order. The slots survive
//! re-renders because the whole container is carried forward by reference
//! from the fiber that occupied the same tree position in the previous pass;
//! closures that captured a slot (dispatchers, most importantly) therefore
//! always see the live value, never a stale snapshot.
//!
//! Hook calls resolve positionally through a [`HookCx`] threaded into every
//! component invocation, so the usual rules apply: call hooks in the same
//! order and count on every render of a component. Order violations are not
//! validated; the typed slot access panics if a slot's type changes between
//! renders.

pub mod context;

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use crate::error::RenderError;
use crate::hooks::context::{Context, CtxStamp};
use crate::types::RefHandle;

// =============================================================================
// Slots
// =============================================================================

/// A cleanup callback returned by an effect (or stored by any future hook
/// kind that wants teardown-on-removal).
pub type Cleanup = Box<dyn FnOnce()>;

type PendingEffect = Box<dyn FnOnce() -> Option<Cleanup>>;

/// One persistent, positionally-indexed unit of local state.
#[derive(Default)]
pub(crate) struct HookSlot {
    value: Option<Box<dyn Any>>,
    reducer: Option<Box<dyn Any>>,
    dispatch: Option<Box<dyn Any>>,
    deps: Option<Box<dyn Any>>,
    pending: Option<PendingEffect>,
    cleanup: Option<Cleanup>,
}

pub(crate) type SlotHandle = Rc<RefCell<HookSlot>>;

/// The hooks container of one component fiber: every slot in call order,
/// plus the subset of effect slots queued for the next commit.
#[derive(Default)]
pub(crate) struct Hooks {
    pub(crate) state: Vec<SlotHandle>,
    pub(crate) effects: Vec<SlotHandle>,
}

pub(crate) type HooksHandle = Rc<RefCell<Hooks>>;

pub(crate) fn new_hooks() -> HooksHandle {
    Rc::new(RefCell::new(Hooks::default()))
}

/// Empty the effect queue (done when a component fiber starts rendering).
pub(crate) fn clear_effect_queue(hooks: &HooksHandle) {
    hooks.borrow_mut().effects.clear();
}

/// Run the queued effects of a committed fiber: prior cleanup first, then the
/// callback, storing the returned cleanup. The queue is emptied up front.
pub(crate) fn flush_effects(hooks: &HooksHandle) {
    let queued: Vec<SlotHandle> = hooks.borrow_mut().effects.drain(..).collect();
    for slot in queued {
        let pending = slot.borrow_mut().pending.take();
        if let Some(effect) = pending {
            let prior = slot.borrow_mut().cleanup.take();
            if let Some(cleanup) = prior {
                cleanup();
            }
            let next = effect();
            slot.borrow_mut().cleanup = next;
        }
    }
}

/// Run the stored cleanup of every slot of a torn-down fiber, exactly once.
///
/// This walks all slots, not just effect slots, unlike the per-commit re-run
/// path which only ever touches the queued effects.
pub(crate) fn run_removal_cleanups(hooks: &HooksHandle) {
    let slots: Vec<SlotHandle> = hooks.borrow().state.to_vec();
    for slot in slots {
        let cleanup = slot.borrow_mut().cleanup.take();
        if let Some(cleanup) = cleanup {
            cleanup();
        }
    }
}

// =============================================================================
// Dependency Lists
// =============================================================================

/// Compare a new dependency value against the one stored on the previous
/// render. Changed when nothing was stored, when the stored type differs, or
/// when the values compare unequal.
fn deps_changed<D: PartialEq + 'static>(prev: Option<&dyn Any>, next: &D) -> bool {
    match prev.and_then(|p| p.downcast_ref::<D>()) {
        Some(prev) => prev != next,
        None => true,
    }
}

/// Sentinel dependency value that never compares equal to itself: an effect
/// or memo keyed on `Always` re-runs on every render.
#[derive(Debug, Clone, Copy, Default)]
pub struct Always;

impl PartialEq for Always {
    fn eq(&self, _: &Self) -> bool {
        false
    }
}

// =============================================================================
// Effect Cleanup Conversion
// =============================================================================

/// Return type of effect callbacks: nothing, or a cleanup to run before the
/// effect re-runs (and once on removal).
pub trait IntoCleanup {
    fn into_cleanup(self) -> Option<Cleanup>;
}

impl IntoCleanup for () {
    fn into_cleanup(self) -> Option<Cleanup> {
        None
    }
}

impl IntoCleanup for Cleanup {
    fn into_cleanup(self) -> Option<Cleanup> {
        Some(self)
    }
}

impl IntoCleanup for Option<Cleanup> {
    fn into_cleanup(self) -> Option<Cleanup> {
        self
    }
}

/// Box a closure as an effect cleanup.
pub fn cleanup(f: impl FnOnce() + 'static) -> Cleanup {
    Box::new(f)
}

// =============================================================================
// Dispatch
// =============================================================================

/// A stable action dispatcher bound to one state slot.
///
/// The same dispatcher is returned on every render of the owning component;
/// it mutates the live slot and, when the reduced value actually changed,
/// triggers a whole-tree re-render. Render failures surface through the
/// returned `Result`.
pub struct Dispatch<A> {
    inner: Rc<dyn Fn(A) -> Result<(), RenderError>>,
}

impl<A> Dispatch<A> {
    fn new(f: impl Fn(A) -> Result<(), RenderError> + 'static) -> Self {
        Self { inner: Rc::new(f) }
    }

    pub fn call(&self, action: A) -> Result<(), RenderError> {
        (self.inner)(action)
    }
}

impl<A> Clone for Dispatch<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

/// Action type of [`HookCx::use_state`]: replace the value, or derive the
/// next value from the current one.
pub enum StateAction<T> {
    Set(T),
    Update(Box<dyn FnOnce(&T) -> T>),
}

/// State setter returned by [`HookCx::use_state`].
pub struct Setter<T>(Dispatch<StateAction<T>>);

impl<T: 'static> Setter<T> {
    /// Replace the state value.
    pub fn set(&self, value: T) -> Result<(), RenderError> {
        self.0.call(StateAction::Set(value))
    }

    /// Derive the next state from the current one.
    pub fn update(&self, f: impl FnOnce(&T) -> T + 'static) -> Result<(), RenderError> {
        self.0.call(StateAction::Update(Box::new(f)))
    }
}

impl<T> Clone for Setter<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

// =============================================================================
// Hook Context
// =============================================================================

/// The per-invocation hook cursor, handed to every component render.
///
/// Holds the fiber's hooks container, the next free slot index, and the
/// context stamps visible from the fiber's position. Valid only for the
/// synchronous extent of one component invocation.
pub struct HookCx {
    hooks: HooksHandle,
    index: usize,
    ctx_chain: Vec<CtxStamp>,
}

impl HookCx {
    pub(crate) fn new(hooks: HooksHandle, ctx_chain: Vec<CtxStamp>) -> Self {
        Self {
            hooks,
            index: 0,
            ctx_chain,
        }
    }

    fn get_slot(&mut self) -> SlotHandle {
        let index = self.index;
        self.index += 1;
        let mut hooks = self.hooks.borrow_mut();
        while hooks.state.len() <= index {
            hooks.state.push(Rc::new(RefCell::new(HookSlot::default())));
        }
        Rc::clone(&hooks.state[index])
    }

    // -------------------------------------------------------------------------
    // State
    // -------------------------------------------------------------------------

    /// Reducer-driven state. The reducer supplied on the latest render is the
    /// one dispatch applies; the initial value is computed once.
    pub fn use_reducer<T, A>(
        &mut self,
        reducer: impl Fn(&T, A) -> T + 'static,
        initial: T,
    ) -> (T, Dispatch<A>)
    where
        T: Clone + PartialEq + 'static,
        A: 'static,
    {
        self.reducer_slot(Rc::new(reducer), move || initial)
    }

    /// Like [`use_reducer`](Self::use_reducer) with a lazily computed initial
    /// value, only invoked when the slot is first allocated.
    pub fn use_reducer_with<T, A>(
        &mut self,
        reducer: impl Fn(&T, A) -> T + 'static,
        init: impl FnOnce() -> T,
    ) -> (T, Dispatch<A>)
    where
        T: Clone + PartialEq + 'static,
        A: 'static,
    {
        self.reducer_slot(Rc::new(reducer), init)
    }

    fn reducer_slot<T, A>(
        &mut self,
        reducer: Rc<dyn Fn(&T, A) -> T>,
        init: impl FnOnce() -> T,
    ) -> (T, Dispatch<A>)
    where
        T: Clone + PartialEq + 'static,
        A: 'static,
    {
        let slot = self.get_slot();

        // Always store the latest reducer so dispatch never applies a stale
        // closure.
        slot.borrow_mut().reducer = Some(Box::new(Rc::clone(&reducer)));

        let needs_init = slot.borrow().dispatch.is_none();
        if needs_init {
            let value = init();
            let slot_ref = Rc::clone(&slot);
            let dispatch: Dispatch<A> = Dispatch::new(move |action: A| {
                let next = {
                    let s = slot_ref.borrow();
                    let reducer = s
                        .reducer
                        .as_ref()
                        .and_then(|r| r.downcast_ref::<Rc<dyn Fn(&T, A) -> T>>())
                        .expect("hook slot reducer type changed between renders");
                    let current = s
                        .value
                        .as_ref()
                        .and_then(|v| v.downcast_ref::<T>())
                        .expect("hook slot state type changed between renders");
                    reducer(current, action)
                };
                let changed = {
                    let s = slot_ref.borrow();
                    let current = s
                        .value
                        .as_ref()
                        .and_then(|v| v.downcast_ref::<T>())
                        .expect("hook slot state type changed between renders");
                    *current != next
                };
                if changed {
                    slot_ref.borrow_mut().value = Some(Box::new(next));
                    tracing::trace!("state changed, re-rendering tree");
                    crate::engine::root::rerender()?;
                }
                Ok(())
            });
            let mut s = slot.borrow_mut();
            s.value = Some(Box::new(value));
            s.dispatch = Some(Box::new(dispatch));
        }

        let s = slot.borrow();
        let value = s
            .value
            .as_ref()
            .and_then(|v| v.downcast_ref::<T>())
            .expect("hook slot state type changed between renders")
            .clone();
        let dispatch = s
            .dispatch
            .as_ref()
            .and_then(|d| d.downcast_ref::<Dispatch<A>>())
            .expect("hook slot dispatch type changed between renders")
            .clone();
        (value, dispatch)
    }

    /// Plain state: current value plus a stable setter.
    pub fn use_state<T>(&mut self, initial: T) -> (T, Setter<T>)
    where
        T: Clone + PartialEq + 'static,
    {
        self.use_state_with(move || initial)
    }

    /// Plain state with a lazily computed initial value.
    pub fn use_state_with<T>(&mut self, init: impl FnOnce() -> T) -> (T, Setter<T>)
    where
        T: Clone + PartialEq + 'static,
    {
        let (value, dispatch) = self.use_reducer_with(
            |current: &T, action: StateAction<T>| match action {
                StateAction::Set(value) => value,
                StateAction::Update(f) => f(current),
            },
            init,
        );
        (value, Setter(dispatch))
    }

    // -------------------------------------------------------------------------
    // Effects
    // -------------------------------------------------------------------------

    /// Schedule `effect` to run at commit when `deps` differ from the
    /// previous render (by `PartialEq`; a missing or type-changed previous
    /// value counts as different — pass [`Always`] to run every render, `()`
    /// to run once).
    ///
    /// The callback may return a [`Cleanup`] (see [`cleanup`]); it runs
    /// before the next invocation and once when the fiber is torn down.
    pub fn use_effect<D, R>(&mut self, deps: D, effect: impl FnOnce() -> R + 'static)
    where
        D: PartialEq + 'static,
        R: IntoCleanup,
    {
        let slot = self.get_slot();
        let changed = {
            let s = slot.borrow();
            deps_changed(s.deps.as_deref(), &deps)
        };
        if changed {
            {
                let mut s = slot.borrow_mut();
                s.pending = Some(Box::new(move || effect().into_cleanup()));
                s.deps = Some(Box::new(deps));
            }
            self.hooks.borrow_mut().effects.push(slot);
        }
    }

    // -------------------------------------------------------------------------
    // Memoization
    // -------------------------------------------------------------------------

    /// Recompute `factory` only when `deps` changed; otherwise return the
    /// cached value.
    pub fn use_memo<T, D>(&mut self, deps: D, factory: impl FnOnce() -> T) -> T
    where
        T: Clone + 'static,
        D: PartialEq + 'static,
    {
        let slot = self.get_slot();
        let changed = {
            let s = slot.borrow();
            deps_changed(s.deps.as_deref(), &deps)
        };
        if changed {
            let value = factory();
            let mut s = slot.borrow_mut();
            s.value = Some(Box::new(value));
            s.deps = Some(Box::new(deps));
        }
        slot.borrow()
            .value
            .as_ref()
            .and_then(|v| v.downcast_ref::<T>())
            .expect("hook slot memo type changed between renders")
            .clone()
    }

    /// A mutable box created once and shared for the component's lifetime.
    pub fn use_ref<T: 'static>(&mut self, initial: T) -> RefHandle<T> {
        self.use_memo((), move || RefHandle::new(initial))
    }

    /// Memoize a function value itself, preserving its identity while `deps`
    /// are unchanged.
    pub fn use_callback<F, D>(&mut self, deps: D, callback: F) -> Rc<F>
    where
        F: 'static,
        D: PartialEq + 'static,
    {
        self.use_memo(deps, move || Rc::new(callback))
    }

    // -------------------------------------------------------------------------
    // Context
    // -------------------------------------------------------------------------

    /// Read the nearest enclosing provider's value for `context`, or its
    /// default when no provider is in the ancestor chain.
    pub fn use_context<T: Clone + 'static>(&self, context: &Context<T>) -> T {
        for stamp in &self.ctx_chain {
            if stamp.id() == context.id() {
                return stamp
                    .value_as::<T>()
                    .expect("context value type mismatch")
                    .clone();
            }
        }
        context.default_value().clone()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn cx_for(hooks: &HooksHandle) -> HookCx {
        HookCx::new(Rc::clone(hooks), Vec::new())
    }

    #[test]
    fn test_deps_changed_rules() {
        let stored: Box<dyn Any> = Box::new((1i32, "a"));
        // unchanged value
        assert!(!deps_changed(Some(stored.as_ref()), &(1i32, "a")));
        // changed position
        assert!(deps_changed(Some(stored.as_ref()), &(2i32, "a")));
        // different type (length/shape change)
        assert!(deps_changed(Some(stored.as_ref()), &(1i32,)));
        // nothing stored yet
        assert!(deps_changed(None, &(1i32, "a")));
        // Always never matches itself
        assert!(deps_changed(Some(Box::new(Always) as Box<dyn Any>).as_deref(), &Always));
    }

    #[test]
    fn test_state_persists_across_renders() {
        let hooks = new_hooks();

        let (value, setter) = cx_for(&hooks).use_state(1i32);
        assert_eq!(value, 1);

        // No mounted tree: the re-render attempt fails, but the slot is
        // already mutated — exactly what the next render must observe.
        crate::engine::root::reset();
        assert!(matches!(setter.set(5), Err(RenderError::NoRoot)));

        let (value, _) = cx_for(&hooks).use_state(1i32);
        assert_eq!(value, 5);
    }

    #[test]
    fn test_dispatch_identity_stable() {
        let hooks = new_hooks();
        let (_, s1) = cx_for(&hooks).use_state(0i32);
        let (_, s2) = cx_for(&hooks).use_state(0i32);
        assert!(Rc::ptr_eq(&s1.0.inner, &s2.0.inner));
    }

    #[test]
    fn test_setter_update_applies_producer() {
        crate::engine::root::reset();
        let hooks = new_hooks();
        let (_, setter) = cx_for(&hooks).use_state(10i32);
        let _ = setter.update(|v| v + 5);
        let (value, _) = cx_for(&hooks).use_state(10i32);
        assert_eq!(value, 15);
    }

    #[test]
    fn test_equal_value_does_not_mutate() {
        crate::engine::root::reset();
        let hooks = new_hooks();
        let (_, setter) = cx_for(&hooks).use_state(3i32);
        // Reducing to an equal value never reaches the renderer, so no
        // NoRoot error either.
        assert!(setter.set(3).is_ok());
    }

    #[test]
    fn test_use_memo_caches_until_deps_change() {
        let hooks = new_hooks();
        let calls = Rc::new(Cell::new(0));

        for (dep, expected_calls) in [(1, 1), (1, 1), (2, 2)] {
            let calls = Rc::clone(&calls);
            let calls_in = Rc::clone(&calls);
            let got = cx_for(&hooks).use_memo(dep, move || {
                calls_in.set(calls_in.get() + 1);
                dep * 10
            });
            assert_eq!(got, dep * 10);
            assert_eq!(calls.get(), expected_calls);
        }
    }

    #[test]
    fn test_use_ref_keeps_identity() {
        let hooks = new_hooks();
        let r1 = cx_for(&hooks).use_ref(0i32);
        let r2 = cx_for(&hooks).use_ref(0i32);
        assert!(r1.ptr_eq(&r2));
    }

    #[test]
    fn test_use_callback_identity_follows_deps() {
        let hooks = new_hooks();
        let c1 = cx_for(&hooks).use_callback(1i32, || ());
        let c2 = cx_for(&hooks).use_callback(1i32, || ());
        let c3 = cx_for(&hooks).use_callback(2i32, || ());
        assert!(Rc::ptr_eq(&c1, &c2));
        assert!(!Rc::ptr_eq(&c2, &c3));
    }

    #[test]
    fn test_effect_queue_and_flush() {
        let hooks = new_hooks();
        let runs = Rc::new(Cell::new(0));
        let cleanups = Rc::new(Cell::new(0));

        let run_render = |dep: i32| {
            let runs = Rc::clone(&runs);
            let cleanups = Rc::clone(&cleanups);
            let mut cx = cx_for(&hooks);
            clear_effect_queue(&hooks);
            cx.use_effect(dep, move || {
                runs.set(runs.get() + 1);
                cleanup(move || cleanups.set(cleanups.get() + 1))
            });
            flush_effects(&hooks);
        };

        run_render(1);
        assert_eq!((runs.get(), cleanups.get()), (1, 0));

        // Same deps: no re-run, no cleanup.
        run_render(1);
        assert_eq!((runs.get(), cleanups.get()), (1, 0));

        // Changed deps: cleanup once, then re-run.
        run_render(2);
        assert_eq!((runs.get(), cleanups.get()), (2, 1));
    }

    #[test]
    fn test_removal_cleanup_runs_once() {
        let hooks = new_hooks();
        let cleanups = Rc::new(Cell::new(0));

        let mut cx = cx_for(&hooks);
        let cleanups2 = Rc::clone(&cleanups);
        cx.use_effect((), move || cleanup(move || cleanups2.set(cleanups2.get() + 1)));
        flush_effects(&hooks);
        assert_eq!(cleanups.get(), 0);

        run_removal_cleanups(&hooks);
        assert_eq!(cleanups.get(), 1);
        // A second teardown pass finds the cleanup already consumed.
        run_removal_cleanups(&hooks);
        assert_eq!(cleanups.get(), 1);
    }
}
