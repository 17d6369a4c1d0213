//! Host bindings.
//!
//! The engine never touches a real control itself; it asks a [`HostBinding`]
//! to create, mutate, and destroy opaque instances. Three operations are the
//! entire contract. All of them are synchronous and must not re-enter the
//! renderer.
//!
//! - [`term`] - the built-in terminal control-tree binding

pub mod term;

use std::any::Any;
use std::rc::Rc;

use thiserror::Error;

use crate::types::Props;

/// An opaque control created by a host binding, stored on the owning fiber.
/// Identity is stable for the lifetime of the tree position.
pub type HostInstance = Rc<dyn Any>;

/// The slice of a fiber a host binding gets to see.
pub struct HostFiber<'a> {
    /// Primitive tag of the fiber.
    pub tag: &'a str,
    /// Props of the current render.
    pub props: &'a Props,
    /// Props of the previous render; present for `update` calls.
    pub prev_props: Option<&'a Props>,
    /// The bound instance; present for `update` and `remove` calls.
    pub instance: Option<&'a HostInstance>,
    /// Instance of the nearest bound ancestor; present for `create` calls
    /// unless the fiber is itself top-level.
    pub parent_instance: Option<&'a HostInstance>,
}

/// The three-operation contract the engine depends on.
pub trait HostBinding {
    /// Materialize a new instance for a primitive fiber. Called once per
    /// tree position for as long as the position keeps its type.
    fn create(&mut self, fiber: &HostFiber<'_>) -> Result<HostInstance, HostError>;

    /// Apply changed props to an existing instance, in place. Both property
    /// sets are available for diffing.
    fn update(&mut self, fiber: &HostFiber<'_>) -> Result<(), HostError>;

    /// Destroy an instance.
    fn remove(&mut self, fiber: &HostFiber<'_>) -> Result<(), HostError>;
}

/// Failure raised by a host binding. Propagates out of the render entry
/// points unmodified.
#[derive(Debug, Error)]
pub enum HostError {
    /// A control was declared under a parent that cannot hold children.
    #[error("`{child}` cannot be attached under `{parent}`: not a container")]
    CannotHostChildren { parent: String, child: String },

    /// The primitive tag means nothing to this binding.
    #[error("unknown control type `{0}`")]
    UnknownType(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}
