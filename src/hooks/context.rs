//! Context propagation.
//!
//! A context is dynamic scoping by tree ancestry: a provider stamps a value
//! onto a fragment, and any descendant component can read the nearest stamp
//! during its render. Resolution is re-evaluated on every render, so moving a
//! consumer under a different provider is observable after one re-render.

use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::element::{create_element, Element};
use crate::types::{NodeType, Props};

thread_local! {
    /// Counter for unique context ids.
    static NEXT_CONTEXT_ID: Cell<u64> = const { Cell::new(0) };
}

/// A context value stamped onto a fiber, visible to descendants.
#[derive(Clone)]
pub struct CtxStamp {
    id: u64,
    value: Rc<dyn Any>,
}

impl CtxStamp {
    pub(crate) fn new(id: u64, value: Rc<dyn Any>) -> Self {
        Self { id, value }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn value_as<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }
}

impl fmt::Debug for CtxStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CtxStamp").field("id", &self.id).finish()
    }
}

/// A typed context with a unique id and a default value.
///
/// Created once (usually at startup) and shared with both providers and
/// consumers. Cloning shares the id.
#[derive(Debug, Clone)]
pub struct Context<T> {
    id: u64,
    default: T,
}

impl<T: Clone + 'static> Context<T> {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn default_value(&self) -> &T {
        &self.default
    }

    /// Build a provider element: a fragment stamped with `value` (or the
    /// context default when `None`), wrapping `children`.
    pub fn provider(&self, value: impl Into<Option<T>>, children: Vec<Element>) -> Element {
        let value = value.into().unwrap_or_else(|| self.default.clone());
        let props = Props::new().with_ctx(CtxStamp::new(self.id, Rc::new(value)));
        create_element(NodeType::Fragment, props, children)
    }
}

/// Create a context with a fresh unique id.
pub fn create_context<T: Clone + 'static>(default: T) -> Context<T> {
    let id = NEXT_CONTEXT_ID.get();
    NEXT_CONTEXT_ID.set(id + 1);
    Context { id, default }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_ids_unique() {
        let a = create_context(0i32);
        let b = create_context(0i32);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_provider_stamps_fragment() {
        let theme = create_context("light".to_string());
        let el = theme.provider("dark".to_string(), vec![]);
        assert_eq!(el.node_type(), &NodeType::Fragment);
        let stamp = el.ctx.as_ref().expect("provider should stamp ctx");
        assert_eq!(stamp.id(), theme.id());
        assert_eq!(stamp.value_as::<String>().map(String::as_str), Some("dark"));
    }

    #[test]
    fn test_provider_without_value_uses_default() {
        let theme = create_context("light".to_string());
        let el = theme.provider(None, vec![]);
        let stamp = el.ctx.as_ref().unwrap();
        assert_eq!(stamp.value_as::<String>().map(String::as_str), Some("light"));
    }
}
