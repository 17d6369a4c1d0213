//! Render phase.
//!
//! A render pass builds a fresh generation by walking the tree being
//! described, depth-first and pre-order, reusing what the previous generation
//! had at each position:
//!
//! - component fibers are invoked (after their `Update` notification) and
//!   their single resulting element becomes the child list
//! - primitive fibers get a host instance created on first sight and their
//!   `children` props reconciled
//! - child reconciliation matches previous fibers to new elements purely by
//!   position and type; a mismatch tears the old subtree down immediately,
//!   during the render pass, not at commit
//!
//! Everything here is synchronous; a pass runs to completion on one call
//! stack, with explicit work stacks instead of recursion.

use std::rc::Rc;

use crate::element::Element;
use crate::error::RenderError;
use crate::events::{self, FiberEvent, LifecycleEvent};
use crate::hooks::context::CtxStamp;
use crate::hooks::{self, HookCx};
use crate::host::{HostBinding, HostFiber};
use crate::types::{EffectTag, NodeType, Props};

use super::arena::{Fiber, FiberArena, FiberId, Generation};

/// Event snapshot for a fiber.
pub(crate) fn fiber_event(arena: &FiberArena, id: FiberId) -> FiberEvent {
    let fiber = arena.get(id);
    FiberEvent {
        fiber: id,
        ty: fiber.ty.clone(),
        tag: fiber.tag,
        props: Rc::clone(&fiber.props),
    }
}

/// Run a full render pass over `root_props`, consuming the previous
/// generation for position matching and eager teardown.
pub(crate) fn render_pass(
    root_props: Rc<Props>,
    prev: &mut Option<Generation>,
    host: &mut dyn HostBinding,
) -> Result<Generation, RenderError> {
    let mut arena = FiberArena::new();
    let root = arena.alloc(Fiber {
        ty: NodeType::Root,
        props: root_props,
        instance: None,
        reference: None,
        ctx: None,
        tag: None,
        parent: None,
        child: None,
        sibling: None,
        prev: prev.as_ref().map(|g| g.root),
        hooks: None,
    });

    let mut cursor = Some(root);
    while let Some(id) = cursor {
        process_fiber(&mut arena, prev, id, host)?;
        cursor = arena.next_pre_order(id);
    }

    tracing::debug!(fibers = arena.len(), "render pass complete");
    Ok(Generation { arena, root })
}

/// Render one fiber: invoke a component, or bind a host instance, then
/// reconcile its child list.
fn process_fiber(
    arena: &mut FiberArena,
    prev: &mut Option<Generation>,
    id: FiberId,
    host: &mut dyn HostBinding,
) -> Result<(), RenderError> {
    let ty = arena.get(id).ty.clone();
    match ty {
        NodeType::Component(component) => {
            let hooks = match arena.get(id).hooks.clone() {
                Some(hooks) => hooks,
                None => {
                    // First occupant of this position: fresh container.
                    let hooks = hooks::new_hooks();
                    arena.get_mut(id).hooks = Some(Rc::clone(&hooks));
                    hooks
                }
            };
            hooks::clear_effect_queue(&hooks);
            events::emit(LifecycleEvent::Update, &fiber_event(arena, id));

            let props = Rc::clone(&arena.get(id).props);
            let mut cx = HookCx::new(hooks, collect_ctx_chain(arena, id));
            let child = (component.render_fn())(&mut cx, &props);
            reconcile_children(arena, prev, id, vec![child], host)
        }
        NodeType::Primitive(tag) => {
            if arena.get(id).instance.is_none() {
                let props = Rc::clone(&arena.get(id).props);
                let parent_instance = arena.nearest_instance(id);
                let view = HostFiber {
                    tag: &tag,
                    props: &props,
                    prev_props: None,
                    instance: None,
                    parent_instance: parent_instance.as_ref(),
                };
                let instance = host.create(&view)?;
                arena.get_mut(id).instance = Some(instance);
            }
            if let Some(reference) = arena.get(id).reference.clone() {
                reference.set(arena.get(id).instance.clone());
            }
            let children = arena.get(id).props.children.clone();
            reconcile_children(arena, prev, id, children, host)
        }
        NodeType::Root | NodeType::Fragment => {
            // No instance of their own; a ref resolves to the nearest
            // ancestor's instance.
            if let Some(reference) = arena.get(id).reference.clone() {
                reference.set(arena.nearest_instance(id));
            }
            let children = arena.get(id).props.children.clone();
            reconcile_children(arena, prev, id, children, host)
        }
    }
}

/// Context stamps visible from `id`, nearest first (including `id` itself).
fn collect_ctx_chain(arena: &FiberArena, id: FiberId) -> Vec<CtxStamp> {
    let mut chain = Vec::new();
    let mut cursor = Some(id);
    while let Some(fid) = cursor {
        let fiber = arena.get(fid);
        if let Some(stamp) = &fiber.ctx {
            chain.push(stamp.clone());
        }
        cursor = fiber.parent;
    }
    chain
}

/// Walk the new element list and the previous sibling chain in parallel, by
/// position only. Same type at a position reuses instance, ref, and hooks;
/// anything else is a placement plus (if a previous fiber occupied the
/// position) an immediate teardown.
fn reconcile_children(
    arena: &mut FiberArena,
    prev: &mut Option<Generation>,
    fiber: FiberId,
    elements: Vec<Element>,
    host: &mut dyn HostBinding,
) -> Result<(), RenderError> {
    let mut prev_child = match (arena.get(fiber).prev, prev.as_ref()) {
        (Some(p), Some(g)) => g.arena.get(p).child,
        _ => None,
    };
    let mut index = 0usize;
    let mut last_sibling: Option<FiberId> = None;

    while index < elements.len() || prev_child.is_some() {
        let element = elements.get(index);
        let same_type = match (prev_child, element) {
            (Some(p), Some(e)) => prev.as_ref().unwrap().arena.get(p).ty == e.ty,
            _ => false,
        };

        let mut new_fiber: Option<FiberId> = None;

        if same_type {
            let p = prev_child.unwrap();
            let element = element.unwrap();
            let (ty, reference, instance, hooks) = {
                let pf = prev.as_ref().unwrap().arena.get(p);
                (
                    pf.ty.clone(),
                    pf.reference.clone(),
                    pf.instance.clone(),
                    pf.hooks.clone(),
                )
            };
            new_fiber = Some(arena.alloc(Fiber {
                ty,
                props: Rc::clone(&element.props),
                instance,
                reference,
                ctx: element.ctx.clone(),
                tag: Some(EffectTag::Update),
                parent: Some(fiber),
                child: None,
                sibling: None,
                prev: Some(p),
                hooks,
            }));
        } else if let Some(element) = element {
            new_fiber = Some(arena.alloc(Fiber {
                ty: element.ty.clone(),
                props: Rc::clone(&element.props),
                instance: None,
                reference: element.reference.clone(),
                ctx: element.ctx.clone(),
                tag: Some(EffectTag::Placement),
                parent: Some(fiber),
                child: None,
                sibling: None,
                prev: None,
                hooks: None,
            }));
        }

        if !same_type {
            if let Some(p) = prev_child {
                teardown(prev.as_mut().unwrap(), p, host)?;
            }
        }

        if let Some(p) = prev_child {
            prev_child = prev.as_ref().unwrap().arena.get(p).sibling;
        }

        if index == 0 {
            arena.get_mut(fiber).child = new_fiber;
        } else if let (Some(nf), Some(ls)) = (new_fiber, last_sibling) {
            arena.get_mut(ls).sibling = Some(nf);
        }
        if new_fiber.is_some() {
            last_sibling = new_fiber;
        }
        index += 1;
    }
    Ok(())
}

/// Tear down a previous-generation subtree, immediately.
///
/// Visitation is child subtree, then sibling subtree (within the torn-down
/// subtree only), then the fiber itself: host removal for bound primitives,
/// removal cleanups for hook slots, and the `Remove` notification, so remove
/// notifications arrive deepest-first.
pub(crate) fn teardown(
    generation: &mut Generation,
    root: FiberId,
    host: &mut dyn HostBinding,
) -> Result<(), RenderError> {
    tracing::trace!(fiber = ?root, "tearing down subtree");
    generation.arena.get_mut(root).tag = Some(EffectTag::Deletion);

    enum Step {
        Enter(FiberId, bool),
        Leave(FiberId),
    }

    let mut stack = vec![Step::Enter(root, false)];
    while let Some(step) = stack.pop() {
        match step {
            Step::Enter(id, follow_siblings) => {
                stack.push(Step::Leave(id));
                let fiber = generation.arena.get(id);
                if follow_siblings {
                    if let Some(sibling) = fiber.sibling {
                        stack.push(Step::Enter(sibling, true));
                    }
                }
                if let Some(child) = fiber.child {
                    stack.push(Step::Enter(child, true));
                }
            }
            Step::Leave(id) => {
                let (tag, props, instance) = {
                    let fiber = generation.arena.get(id);
                    (
                        fiber.ty.primitive_tag().map(str::to_string),
                        Rc::clone(&fiber.props),
                        fiber.instance.clone(),
                    )
                };
                if let (Some(tag), Some(instance)) = (tag, instance) {
                    let view = HostFiber {
                        tag: &tag,
                        props: &props,
                        prev_props: None,
                        instance: Some(&instance),
                        parent_instance: None,
                    };
                    host.remove(&view)?;
                }
                if let Some(hooks) = generation.arena.get(id).hooks.clone() {
                    hooks::run_removal_cleanups(&hooks);
                }
                events::emit(LifecycleEvent::Remove, &fiber_event(&generation.arena, id));
            }
        }
    }
    Ok(())
}
