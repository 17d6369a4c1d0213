//! Element factory.
//!
//! Elements are immutable descriptions of one tree position, produced fresh
//! on every render and discarded afterwards. The factory merges a component's
//! default props under the supplied props, attaches children, and pulls the
//! `ref` output cell and the context stamp out of the prop bag into
//! first-class fields.

use std::rc::Rc;

use crate::hooks::context::CtxStamp;
use crate::types::{HostRef, NodeType, Props};

/// Immutable description of one node, produced fresh each render.
#[derive(Clone)]
pub struct Element {
    pub(crate) ty: NodeType,
    pub(crate) props: Rc<Props>,
    pub(crate) reference: Option<HostRef>,
    pub(crate) ctx: Option<CtxStamp>,
}

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Element")
            .field("ty", &self.ty)
            .field("props", &self.props)
            .finish()
    }
}

impl Element {
    pub fn node_type(&self) -> &NodeType {
        &self.ty
    }

    pub fn props(&self) -> &Props {
        &self.props
    }
}

/// Build an element from a node type, props, and children.
///
/// Props are passed through unvalidated; unknown keys are the host binding's
/// concern. Children always come from the `children` argument, replacing
/// whatever the prop bag carried.
pub fn create_element(ty: impl Into<NodeType>, props: Props, children: Vec<Element>) -> Element {
    let ty = ty.into();

    let mut props = match &ty {
        NodeType::Component(c) => match c.defaults() {
            Some(defaults) => defaults.merged_under(props),
            None => props,
        },
        _ => props,
    };
    props.children = children;

    let reference = props.reference.take();
    let ctx = props.ctx.take();

    Element {
        ty,
        props: Rc::new(props),
        reference,
        ctx,
    }
}

/// A fragment: expands into its children without binding a host instance.
pub fn fragment(children: Vec<Element>) -> Element {
    create_element(NodeType::Fragment, Props::new(), children)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::HookCx;
    use crate::types::{Component, HostRef};

    fn labeled(_cx: &mut HookCx, props: &Props) -> Element {
        create_element("statictext", Props::new().set("text", props.text("label").unwrap_or("")), vec![])
    }

    fn labeled_defaults() -> Props {
        Props::new().set("label", "unnamed").set("width", 20)
    }

    const LABELED: Component = Component::with_defaults("Labeled", labeled, labeled_defaults);

    #[test]
    fn test_defaults_merge_under_supplied() {
        let el = create_element(LABELED, Props::new().set("label", "ok"), vec![]);
        assert_eq!(el.props().text("label"), Some("ok"));
        assert_eq!(el.props().int("width"), Some(20));
    }

    #[test]
    fn test_ref_extracted_from_props() {
        let r = HostRef::default();
        let el = create_element("button", Props::new().set("text", "go").reference(r), vec![]);
        assert!(el.reference.is_some());
        assert!(el.props().reference.is_none());
        assert_eq!(el.props().text("text"), Some("go"));
    }

    #[test]
    fn test_children_attached() {
        let child = create_element("statictext", Props::new(), vec![]);
        let el = create_element("group", Props::new(), vec![child]);
        assert_eq!(el.props().children.len(), 1);
        assert!(fragment(vec![]).node_type() == &NodeType::Fragment);
    }
}
