//! # weft
//!
//! Fiber-style virtual tree reconciliation with hooks.
//!
//! Application code describes a UI as a tree of declarative elements
//! (function components and primitive control tags). The engine diffs that
//! description against the previously rendered tree, computes the minimal
//! mutations, and applies them through a pluggable host binding.
//!
//! ## Architecture
//!
//! ```text
//! create_element → render pass (diff + effect tags) → commit (host mutations)
//!        ↑                                                  │
//!        └──────────── hooks (state/effects/context) ←──────┘
//! ```
//!
//! Rendering is synchronous and single-threaded: `render`/`rerender` return
//! only after the whole cycle, including queued effects, has completed. Any
//! state dispatch re-renders the whole tree; positions keep their host
//! instances (and hook state) as long as their type is unchanged.
//!
//! ## Modules
//!
//! - [`types`] - node types, props, effect tags, shared handles
//! - [`element`] - the element factory
//! - [`engine`] - fiber arena, render and commit phases, root entry points
//! - [`hooks`] - per-fiber local state, effects, memoization, contexts
//! - [`events`] - lifecycle event bus (`update` / `commit` / `remove`)
//! - [`host`] - the host-binding contract and the terminal binding
//!
//! ## Example
//!
//! ```no_run
//! use weft::{create_element, render, Component, HookCx, Element, Props, TermHost};
//!
//! fn counter(cx: &mut HookCx, _props: &Props) -> Element {
//!     let (count, set) = cx.use_state(0i64);
//!     let label = create_element(
//!         "statictext",
//!         Props::new().set("text", format!("count: {count}")),
//!         vec![],
//!     );
//!     let bump = create_element(
//!         "button",
//!         Props::new()
//!             .set("text", "+1")
//!             .handler("on_click", move |_| {
//!                 let _ = set.update(|c| c + 1);
//!             }),
//!         vec![],
//!     );
//!     create_element("window", Props::new().set("text", "demo"), vec![label, bump])
//! }
//!
//! const COUNTER: Component = Component::new("Counter", counter);
//!
//! let host = TermHost::new();
//! let handle = host.handle();
//! render(create_element(COUNTER, Props::new(), vec![]), host).unwrap();
//! handle.present().unwrap();
//! ```

pub mod element;
pub mod engine;
pub mod error;
pub mod events;
pub mod hooks;
pub mod host;
pub mod types;

// Re-export the public surface

pub use element::{create_element, fragment, Element};

pub use engine::arena::FiberId;
pub use engine::{is_mounted, render, rerender, reset};

pub use error::RenderError;

pub use events::{
    add_listener, add_listener_once, remove_listener, Emitter, FiberEvent, LifecycleEvent,
    ListenerId,
};

pub use hooks::context::{create_context, Context};
pub use hooks::{cleanup, Always, Cleanup, Dispatch, HookCx, IntoCleanup, Setter, StateAction};

pub use host::term::{ControlKind, TermHandle, TermHost};
pub use host::{HostBinding, HostError, HostFiber, HostInstance};

pub use types::{
    Component, ComponentFn, DefaultProps, EffectTag, Handler, HostRef, NodeType, PropValue, Props,
    RefHandle,
};
