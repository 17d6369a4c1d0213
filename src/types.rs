//! Core types for weft.
//!
//! Everything else builds on these: node types, props, effect tags, and the
//! shared handle types that flow between the reconciler, the hooks, and the
//! host binding.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::element::Element;
use crate::hooks::context::CtxStamp;
use crate::hooks::HookCx;
use crate::host::HostInstance;

// =============================================================================
// Effect Tag
// =============================================================================

/// The mutation a fiber requires when the work tree is committed.
///
/// Absent only on the synthetic root and on fibers that carry no mutation of
/// their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectTag {
    /// A new host instance must be created for this position.
    Placement,
    /// The position is reused; changed props are applied to the existing
    /// instance.
    Update,
    /// The previous occupant of this position is being torn down.
    Deletion,
}

// =============================================================================
// Components
// =============================================================================

/// The render function of a component: props in, one element out.
pub type ComponentFn = fn(&mut HookCx, &Props) -> Element;

/// Producer for a component's default props, merged under supplied props.
pub type DefaultProps = fn() -> Props;

/// A function component: a named render function with optional default props.
///
/// Two `Component` values compare equal when they share the same render
/// function, which is what positional reconciliation keys on.
#[derive(Clone, Copy)]
pub struct Component {
    name: &'static str,
    render: ComponentFn,
    defaults: Option<DefaultProps>,
}

impl Component {
    /// Wrap a render function as a component.
    pub const fn new(name: &'static str, render: ComponentFn) -> Self {
        Self {
            name,
            render,
            defaults: None,
        }
    }

    /// Wrap a render function together with a default-props producer.
    pub const fn with_defaults(
        name: &'static str,
        render: ComponentFn,
        defaults: DefaultProps,
    ) -> Self {
        Self {
            name,
            render,
            defaults: Some(defaults),
        }
    }

    /// The display name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn render_fn(&self) -> ComponentFn {
        self.render
    }

    pub(crate) fn defaults(&self) -> Option<Props> {
        self.defaults.map(|f| f())
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::fn_addr_eq(self.render, other.render)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Component").field(&self.name).finish()
    }
}

// =============================================================================
// Node Type
// =============================================================================

/// What a tree position is: the synthetic root, a fragment, a primitive
/// control tag interpreted by the host binding, or a function component.
#[derive(Clone, PartialEq)]
pub enum NodeType {
    Root,
    Fragment,
    Primitive(String),
    Component(Component),
}

impl NodeType {
    /// The primitive tag, if this is a primitive node.
    pub fn primitive_tag(&self) -> Option<&str> {
        match self {
            NodeType::Primitive(tag) => Some(tag),
            _ => None,
        }
    }

    #[inline]
    pub fn is_component(&self) -> bool {
        matches!(self, NodeType::Component(_))
    }

    #[inline]
    pub fn is_primitive(&self) -> bool {
        matches!(self, NodeType::Primitive(_))
    }

    /// Display name for logs and events.
    pub fn name(&self) -> &str {
        match self {
            NodeType::Root => "root",
            NodeType::Fragment => "fragment",
            NodeType::Primitive(tag) => tag,
            NodeType::Component(c) => c.name(),
        }
    }
}

impl fmt::Debug for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeType::Root => write!(f, "Root"),
            NodeType::Fragment => write!(f, "Fragment"),
            NodeType::Primitive(tag) => write!(f, "Primitive({tag:?})"),
            NodeType::Component(c) => write!(f, "Component({:?})", c.name()),
        }
    }
}

impl From<&str> for NodeType {
    fn from(tag: &str) -> Self {
        NodeType::Primitive(tag.to_string())
    }
}

impl From<String> for NodeType {
    fn from(tag: String) -> Self {
        NodeType::Primitive(tag)
    }
}

impl From<Component> for NodeType {
    fn from(component: Component) -> Self {
        NodeType::Component(component)
    }
}

// =============================================================================
// Prop Values
// =============================================================================

/// An event-handler prop. Invoked by the host binding with the host instance
/// that raised the event.
///
/// Compares by allocation identity, so a handler memoized with
/// [`HookCx::use_callback`] stays "unchanged" across renders while a fresh
/// closure registers as a changed prop.
#[derive(Clone)]
pub struct Handler(Rc<dyn Fn(&HostInstance)>);

impl Handler {
    pub fn new(f: impl Fn(&HostInstance) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Wrap an existing shared closure without re-allocating, preserving its
    /// identity for prop diffing.
    pub fn from_rc(f: Rc<dyn Fn(&HostInstance)>) -> Self {
        Self(f)
    }

    pub fn invoke(&self, instance: &HostInstance) {
        (self.0)(instance)
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler(..)")
    }
}

/// A single property value. Unknown keys pass through the engine untouched;
/// interpretation is entirely up to the host binding.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Handler(Handler),
}

impl PropValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            PropValue::Float(v) => Some(*v),
            PropValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_handler(&self) -> Option<&Handler> {
        match self {
            PropValue::Handler(h) => Some(h),
            _ => None,
        }
    }
}

impl From<bool> for PropValue {
    fn from(v: bool) -> Self {
        PropValue::Bool(v)
    }
}

impl From<i64> for PropValue {
    fn from(v: i64) -> Self {
        PropValue::Int(v)
    }
}

impl From<i32> for PropValue {
    fn from(v: i32) -> Self {
        PropValue::Int(v as i64)
    }
}

impl From<f64> for PropValue {
    fn from(v: f64) -> Self {
        PropValue::Float(v)
    }
}

impl From<&str> for PropValue {
    fn from(v: &str) -> Self {
        PropValue::Text(v.to_string())
    }
}

impl From<String> for PropValue {
    fn from(v: String) -> Self {
        PropValue::Text(v)
    }
}

impl From<Handler> for PropValue {
    fn from(v: Handler) -> Self {
        PropValue::Handler(v)
    }
}

// =============================================================================
// Props
// =============================================================================

/// The property bag of an element or fiber.
///
/// Named values live in an ordered map so prop diffing walks keys
/// deterministically. Children are carried alongside the map; `reference` and
/// `ctx` are extracted into first-class [`Element`] fields by the element
/// factory and never reach the host binding as ordinary props.
#[derive(Clone, Default)]
pub struct Props {
    values: BTreeMap<&'static str, PropValue>,
    pub children: Vec<Element>,
    pub(crate) reference: Option<HostRef>,
    pub(crate) ctx: Option<CtxStamp>,
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Props")
            .field("values", &self.values)
            .field("children", &self.children.len())
            .finish()
    }
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a named prop. Chains.
    pub fn set(mut self, key: &'static str, value: impl Into<PropValue>) -> Self {
        self.values.insert(key, value.into());
        self
    }

    /// Set an event-handler prop. Chains.
    pub fn handler(self, key: &'static str, f: impl Fn(&HostInstance) + 'static) -> Self {
        self.set(key, Handler::new(f))
    }

    /// Declare an output ref to be populated with the bound host instance.
    pub fn reference(mut self, r: HostRef) -> Self {
        self.reference = Some(r);
        self
    }

    pub(crate) fn with_ctx(mut self, stamp: CtxStamp) -> Self {
        self.ctx = Some(stamp);
        self
    }

    pub fn get(&self, key: &str) -> Option<&PropValue> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Iterate named props in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &PropValue)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(PropValue::as_text)
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(PropValue::as_int)
    }

    pub fn float(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(PropValue::as_float)
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(PropValue::as_bool)
    }

    /// Merge `overrides` on top of `self`: supplied values win over defaults,
    /// children / reference / ctx come from `overrides` wholesale.
    pub(crate) fn merged_under(mut self, overrides: Props) -> Props {
        for (k, v) in overrides.values {
            self.values.insert(k, v);
        }
        self.children = overrides.children;
        self.reference = overrides.reference;
        self.ctx = overrides.ctx;
        self
    }
}

// =============================================================================
// Ref Handles
// =============================================================================

/// A shared mutable cell.
///
/// Returned by [`HookCx::use_ref`] and used (as [`HostRef`]) for the `ref`
/// output of elements. Cloning shares the same cell.
pub struct RefHandle<T> {
    inner: Rc<RefCell<T>>,
}

impl<T> RefHandle<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(value)),
        }
    }

    pub fn set(&self, value: T) {
        *self.inner.borrow_mut() = value;
    }

    pub fn replace(&self, value: T) -> T {
        self.inner.replace(value)
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow())
    }

    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.inner.borrow_mut())
    }

    /// True when both handles share the same cell.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Clone> RefHandle<T> {
    pub fn get(&self) -> T {
        self.inner.borrow().clone()
    }
}

impl<T> Clone for RefHandle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Default> Default for RefHandle<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for RefHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RefHandle").field(&self.inner.borrow()).finish()
    }
}

/// Output cell an element can declare; populated with the bound host
/// instance during the render phase.
pub type HostRef = RefHandle<Option<HostInstance>>;

// =============================================================================
// Tests
// =============================================================================
