//! Root controller.
//!
//! Entry points for the first render and whole-tree re-renders, plus the
//! process-wide cursor they operate on: the current generation and the bound
//! host binding, held in a thread-local cell. Exactly one render runs at a
//! time; re-entering (e.g. dispatching from inside a component body) is
//! reported as [`RenderError::RenderInProgress`].

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::element::Element;
use crate::error::RenderError;
use crate::events::{self, LifecycleEvent};
use crate::hooks;
use crate::host::HostBinding;
use crate::types::Props;

use super::arena::Generation;
use super::commit::commit_pass;
use super::reconcile::render_pass;

struct Mounted {
    host: Box<dyn HostBinding>,
    current: Option<Generation>,
}

thread_local! {
    static MOUNTED: RefCell<Option<Mounted>> = const { RefCell::new(None) };
    static IN_PROGRESS: Cell<bool> = const { Cell::new(false) };
}

/// Render `element` for the first time through `host`.
///
/// Replaces any previously mounted tree wholesale. Returns after the entire
/// render-and-commit cycle (including effect flushing) has completed.
pub fn render(element: Element, host: impl HostBinding + 'static) -> Result<(), RenderError> {
    if IN_PROGRESS.get() {
        return Err(RenderError::RenderInProgress);
    }
    tracing::debug!(root = element.node_type().name(), "mounting");

    let mut root_props = Props::new();
    root_props.children = vec![element];

    MOUNTED.with(|m| {
        *m.borrow_mut() = Some(Mounted {
            host: Box::new(host),
            current: None,
        })
    });
    drive(Rc::new(root_props))
}

/// Re-render the current tree from scratch.
///
/// Re-invokes every component against the root element of the original
/// render; synchronous like [`render`].
pub fn rerender() -> Result<(), RenderError> {
    if IN_PROGRESS.get() {
        return Err(RenderError::RenderInProgress);
    }
    let root_props = MOUNTED
        .with(|m| {
            m.borrow()
                .as_ref()
                .and_then(|m| m.current.as_ref())
                .map(|g| Rc::clone(&g.arena.get(g.root).props))
        })
        .ok_or(RenderError::NoRoot)?;
    drive(root_props)
}

/// True when a tree has been rendered and is current.
pub fn is_mounted() -> bool {
    MOUNTED.with(|m| {
        m.borrow()
            .as_ref()
            .is_some_and(|m| m.current.is_some())
    })
}

/// Drop the mounted tree, the bound host, and all lifecycle listeners
/// (for testing and embedder teardown). No removal notifications fire.
pub fn reset() {
    MOUNTED.with(|m| *m.borrow_mut() = None);
    IN_PROGRESS.set(false);
    events::reset_listeners();
}

/// One full render-and-commit cycle.
fn drive(root_props: Rc<Props>) -> Result<(), RenderError> {
    let mut mounted = MOUNTED
        .with(|m| m.borrow_mut().take())
        .ok_or(RenderError::NoRoot)?;
    IN_PROGRESS.set(true);

    let mut prev = mounted.current.take();
    let outcome = match render_pass(root_props, &mut prev, mounted.host.as_mut()) {
        Ok(next) => match commit_pass(&next, prev.as_ref(), mounted.host.as_mut()) {
            Ok(records) => {
                mounted.current = Some(next);
                Ok(records)
            }
            Err(e) => {
                // The previous generation stays current; the host tree is
                // partially committed and no rollback is attempted.
                mounted.current = prev;
                Err(e)
            }
        },
        Err(e) => {
            mounted.current = prev;
            Err(e)
        }
    };

    // Reinstall the mount before touching user code: queued effects and
    // commit listeners may dispatch, which re-enters rerender().
    MOUNTED.with(|m| *m.borrow_mut() = Some(mounted));
    IN_PROGRESS.set(false);

    let records = outcome?;
    for record in records {
        if let Some(hooks) = &record.hooks {
            hooks::flush_effects(hooks);
        }
        events::emit(LifecycleEvent::Commit, &record.event);
    }
    Ok(())
}
