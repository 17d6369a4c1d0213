//! Commit phase.
//!
//! A second pass over the finished work tree. Host mutations for reused
//! primitives are applied at first visit (pre-order); the commit notification
//! for a fiber is recorded only after its child subtree *and* its later
//! siblings have fully committed, so a fiber's own notification always
//! trails every notification belonging to its descendants and to all of its
//! later siblings. The root itself is never notified.
//!
//! Notifications are returned as an ordered record list rather than fired
//! here: the root controller installs the new generation first and then
//! flushes effects and listeners, so that effect code is free to dispatch.

use std::rc::Rc;

use crate::error::RenderError;
use crate::events::FiberEvent;
use crate::hooks::HooksHandle;
use crate::host::{HostBinding, HostFiber};
use crate::types::EffectTag;

use super::arena::{FiberId, Generation};
use super::reconcile::fiber_event;

/// One entry of the commit notification order.
pub(crate) struct CommitRecord {
    pub hooks: Option<HooksHandle>,
    pub event: FiberEvent,
}

/// Apply host mutations and collect the notification order.
pub(crate) fn commit_pass(
    next: &Generation,
    prev: Option<&Generation>,
    host: &mut dyn HostBinding,
) -> Result<Vec<CommitRecord>, RenderError> {
    enum Step {
        Visit(FiberId),
        Notify(FiberId),
    }

    let mut records = Vec::new();
    let mut stack = Vec::new();
    if let Some(child) = next.arena.get(next.root).child {
        stack.push(Step::Visit(child));
    }

    while let Some(step) = stack.pop() {
        match step {
            Step::Visit(id) => {
                let fiber = next.arena.get(id);
                if fiber.tag == Some(EffectTag::Update) && fiber.ty.is_primitive() {
                    let tag = fiber.ty.primitive_tag().unwrap().to_string();
                    let props = Rc::clone(&fiber.props);
                    let prev_props = match (fiber.prev, prev) {
                        (Some(p), Some(g)) => Some(Rc::clone(&g.arena.get(p).props)),
                        _ => None,
                    };
                    let instance = fiber.instance.clone();
                    let view = HostFiber {
                        tag: &tag,
                        props: &props,
                        prev_props: prev_props.as_deref(),
                        instance: instance.as_ref(),
                        parent_instance: None,
                    };
                    host.update(&view)?;
                }

                stack.push(Step::Notify(id));
                if let Some(sibling) = next.arena.get(id).sibling {
                    stack.push(Step::Visit(sibling));
                }
                if let Some(child) = next.arena.get(id).child {
                    stack.push(Step::Visit(child));
                }
            }
            Step::Notify(id) => {
                records.push(CommitRecord {
                    hooks: next.arena.get(id).hooks.clone(),
                    event: fiber_event(&next.arena, id),
                });
            }
        }
    }

    tracing::debug!(notifications = records.len(), "commit pass complete");
    Ok(records)
}
