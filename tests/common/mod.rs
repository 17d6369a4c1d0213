//! Shared test fixtures: a recording host binding and a few shorthands.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use weft::{Element, HostBinding, HostError, HostFiber, HostInstance, Props, create_element};

/// One host operation, in the order the engine requested it.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Create {
        id: usize,
        tag: String,
        text: Option<String>,
    },
    Update {
        id: usize,
        tag: String,
        text: Option<String>,
    },
    Remove {
        id: usize,
        tag: String,
    },
}

impl Op {
    pub fn tag(&self) -> &str {
        match self {
            Op::Create { tag, .. } | Op::Update { tag, .. } | Op::Remove { tag, .. } => tag,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Op::Create { .. } => "create",
            Op::Update { .. } => "update",
            Op::Remove { .. } => "remove",
        }
    }
}

/// Instance payload of the recording host.
#[derive(Debug)]
pub struct MockInstance {
    pub id: usize,
    pub tag: String,
}

#[derive(Default)]
struct Journal {
    ops: Vec<Op>,
    next_id: usize,
}

/// Shared view of a [`RecordingHost`]'s journal.
#[derive(Clone, Default)]
pub struct JournalHandle {
    inner: Rc<RefCell<Journal>>,
}

impl JournalHandle {
    pub fn ops(&self) -> Vec<Op> {
        self.inner.borrow().ops.clone()
    }

    pub fn clear(&self) {
        self.inner.borrow_mut().ops.clear();
    }

    /// Ops filtered down to `(kind, tag)` pairs, handy for order assertions.
    pub fn sequence(&self) -> Vec<(String, String)> {
        self.inner
            .borrow()
            .ops
            .iter()
            .map(|op| (op.kind().to_string(), op.tag().to_string()))
            .collect()
    }

    pub fn count(&self, kind: &str, tag: &str) -> usize {
        self.inner
            .borrow()
            .ops
            .iter()
            .filter(|op| op.kind() == kind && op.tag() == tag)
            .count()
    }
}

/// A host binding that records every operation and hands out inert
/// instances.
#[derive(Default)]
pub struct RecordingHost {
    journal: JournalHandle,
}

impl RecordingHost {
    pub fn new() -> (Self, JournalHandle) {
        let host = Self::default();
        let journal = host.journal.clone();
        (host, journal)
    }
}

fn instance_id(instance: &HostInstance) -> usize {
    instance
        .downcast_ref::<MockInstance>()
        .map(|m| m.id)
        .unwrap_or(usize::MAX)
}

impl HostBinding for RecordingHost {
    fn create(&mut self, fiber: &HostFiber<'_>) -> Result<HostInstance, HostError> {
        let mut journal = self.journal.inner.borrow_mut();
        let id = journal.next_id;
        journal.next_id += 1;
        journal.ops.push(Op::Create {
            id,
            tag: fiber.tag.to_string(),
            text: fiber.props.text("text").map(str::to_string),
        });
        Ok(Rc::new(MockInstance {
            id,
            tag: fiber.tag.to_string(),
        }))
    }

    fn update(&mut self, fiber: &HostFiber<'_>) -> Result<(), HostError> {
        let id = fiber.instance.map(instance_id).unwrap_or(usize::MAX);
        self.journal.inner.borrow_mut().ops.push(Op::Update {
            id,
            tag: fiber.tag.to_string(),
            text: fiber.props.text("text").map(str::to_string),
        });
        Ok(())
    }

    fn remove(&mut self, fiber: &HostFiber<'_>) -> Result<(), HostError> {
        let id = fiber.instance.map(instance_id).unwrap_or(usize::MAX);
        self.journal.inner.borrow_mut().ops.push(Op::Remove {
            id,
            tag: fiber.tag.to_string(),
        });
        Ok(())
    }
}

/// Shorthand for a primitive element with a `text` prop.
pub fn text_el(tag: &str, text: &str) -> Element {
    create_element(tag, Props::new().set("text", text), vec![])
}
