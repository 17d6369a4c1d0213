//! Lifecycle bus ordering: commit notifications settle child subtrees and
//! later siblings before a fiber's own notification, removals arrive
//! deepest-first, and listener registration modes behave.

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::{text_el, RecordingHost};
use weft::{
    add_listener, add_listener_once, create_element, remove_listener, render, rerender, reset,
    Component, Element, HookCx, LifecycleEvent, Props, Setter,
};

thread_local! {
    static SHOW: RefCell<Option<Setter<bool>>> = const { RefCell::new(None) };
}

/// Collect the `text` prop (or node-type name) of every notification of one
/// kind, in arrival order.
fn record(kind: LifecycleEvent) -> Rc<RefCell<Vec<String>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let seen2 = Rc::clone(&seen);
    add_listener(kind, move |event| {
        let label = event
            .props
            .text("text")
            .map(str::to_string)
            .unwrap_or_else(|| event.name().to_string());
        seen2.borrow_mut().push(label);
    });
    seen
}

#[test]
fn test_commit_order_settles_descendants_and_later_siblings_first() {
    reset();
    let seen = record(LifecycleEvent::Commit);
    let (host, _journal) = RecordingHost::new();

    // window > [A panel > (a1, a2), B panel > (b1)]
    let a = create_element(
        "panel",
        Props::new().set("text", "A"),
        vec![text_el("statictext", "a1"), text_el("statictext", "a2")],
    );
    let b = create_element(
        "panel",
        Props::new().set("text", "B"),
        vec![text_el("statictext", "b1")],
    );
    let window = create_element("window", Props::new().set("text", "w"), vec![a, b]);
    render(window, host).unwrap();

    // Later siblings settle before earlier ones; parents settle last; the
    // synthetic root is never notified.
    assert_eq!(
        *seen.borrow(),
        vec!["a2", "a1", "b1", "B", "A", "w"]
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>()
    );
}

#[test]
fn test_update_fires_once_per_component_render() {
    reset();
    let seen = record(LifecycleEvent::Update);
    let (host, _journal) = RecordingHost::new();

    fn leafy(_cx: &mut HookCx, _props: &Props) -> Element {
        text_el("statictext", "leaf")
    }
    const LEAFY: Component = Component::new("Leafy", leafy);

    render(
        create_element(
            "window",
            Props::new(),
            vec![create_element(LEAFY, Props::new(), vec![])],
        ),
        host,
    )
    .unwrap();
    assert_eq!(*seen.borrow(), vec!["Leafy".to_string()]);

    rerender().unwrap();
    assert_eq!(
        *seen.borrow(),
        vec!["Leafy".to_string(), "Leafy".to_string()]
    );
}

// -----------------------------------------------------------------------------
// Removal notifications
// -----------------------------------------------------------------------------

fn collapsible(cx: &mut HookCx, _props: &Props) -> Element {
    let (show, set) = cx.use_state(true);
    SHOW.with(|s| *s.borrow_mut() = Some(set));
    let children = if show {
        vec![create_element(
            "panel",
            Props::new().set("text", "outer"),
            vec![create_element(
                "group",
                Props::new().set("text", "mid"),
                vec![text_el("statictext", "leafmost")],
            )],
        )]
    } else {
        vec![]
    };
    create_element("window", Props::new(), children)
}

const COLLAPSIBLE: Component = Component::new("Collapsible", collapsible);

#[test]
fn test_remove_notifications_arrive_deepest_first() {
    reset();
    let (host, _journal) = RecordingHost::new();
    render(create_element(COLLAPSIBLE, Props::new(), vec![]), host).unwrap();

    let seen = record(LifecycleEvent::Remove);
    SHOW.with(|s| s.borrow().clone()).unwrap().set(false).unwrap();
    assert_eq!(
        *seen.borrow(),
        vec!["leafmost".to_string(), "mid".to_string(), "outer".to_string()]
    );
}

// -----------------------------------------------------------------------------
// Listener registration modes
// -----------------------------------------------------------------------------

#[test]
fn test_once_and_off() {
    reset();
    let (host, _journal) = RecordingHost::new();

    let once_hits = Rc::new(RefCell::new(0));
    let on_hits = Rc::new(RefCell::new(0));

    let o = Rc::clone(&once_hits);
    add_listener_once(LifecycleEvent::Commit, move |_| *o.borrow_mut() += 1);
    let o = Rc::clone(&on_hits);
    let id = add_listener(LifecycleEvent::Commit, move |_| *o.borrow_mut() += 1);

    render(text_el("window", "w"), host).unwrap();
    assert_eq!(*once_hits.borrow(), 1);
    assert_eq!(*on_hits.borrow(), 1);

    rerender().unwrap();
    assert_eq!(*once_hits.borrow(), 1, "once listener is consumed");
    assert_eq!(*on_hits.borrow(), 2);

    remove_listener(id);
    rerender().unwrap();
    assert_eq!(*on_hits.borrow(), 2);
}
