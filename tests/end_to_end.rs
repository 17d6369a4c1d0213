//! The whole engine against the terminal binding: a counter app drives
//! state through a handler prop, the display control mutates in place, and
//! unmounting the counter runs its effect cleanup exactly once.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use weft::{
    cleanup, create_element, render, reset, Component, Element, HookCx, HostRef, Props, Setter,
    TermHost,
};

thread_local! {
    static BUMP_REF: RefCell<Option<HostRef>> = const { RefCell::new(None) };
    static LABEL_REF: RefCell<Option<HostRef>> = const { RefCell::new(None) };
    static SHOW: RefCell<Option<Setter<bool>>> = const { RefCell::new(None) };
    static CLEANUPS: Cell<usize> = const { Cell::new(0) };
}

fn counter(cx: &mut HookCx, _props: &Props) -> Element {
    let (count, set) = cx.use_state(0i64);

    cx.use_effect((), || {
        cleanup(move || CLEANUPS.with(|c| c.set(c.get() + 1)))
    });

    let label = create_element(
        "statictext",
        Props::new()
            .set("text", format!("count: {count}"))
            .reference(LABEL_REF.with(|r| r.borrow().clone()).unwrap()),
        vec![],
    );
    let bump = create_element(
        "button",
        Props::new()
            .set("text", "+1")
            .handler("on_click", move |_| {
                let _ = set.update(|c| c + 1);
            })
            .reference(BUMP_REF.with(|r| r.borrow().clone()).unwrap()),
        vec![],
    );
    create_element("group", Props::new(), vec![label, bump])
}

const COUNTER: Component = Component::new("Counter", counter);

fn shell(cx: &mut HookCx, _props: &Props) -> Element {
    let (show, set) = cx.use_state(true);
    SHOW.with(|s| *s.borrow_mut() = Some(set));
    let children = if show {
        vec![create_element(COUNTER, Props::new(), vec![])]
    } else {
        vec![]
    };
    create_element("window", Props::new().set("text", "Counter"), children)
}

const SHELL: Component = Component::new("Shell", shell);

#[test]
fn test_counter_clicks_then_unmount() {
    reset();
    BUMP_REF.with(|r| *r.borrow_mut() = Some(HostRef::default()));
    LABEL_REF.with(|r| *r.borrow_mut() = Some(HostRef::default()));

    let host = TermHost::with_width(40);
    let handle = host.handle();
    render(create_element(SHELL, Props::new(), vec![]), host).unwrap();

    assert!(handle.snapshot().contains("count: 0"));
    assert_eq!(CLEANUPS.with(Cell::get), 0);

    // Click: the handler dispatches, the tree re-renders, and the display
    // control is mutated in place.
    let label_before = LABEL_REF.with(|r| r.borrow().clone()).unwrap().get().unwrap();
    let button = BUMP_REF.with(|r| r.borrow().clone()).unwrap().get().unwrap();
    assert!(handle.invoke(&button, "on_click"));

    let snap = handle.snapshot();
    assert!(snap.contains("count: 1"), "display updated in place: {snap}");
    let label_after = LABEL_REF.with(|r| r.borrow().clone()).unwrap().get().unwrap();
    assert!(
        Rc::ptr_eq(&label_before, &label_after),
        "display control identity is stable across clicks"
    );

    // Click again through the same (stable) handler identity.
    assert!(handle.invoke(&button, "on_click"));
    assert!(handle.snapshot().contains("count: 2"));

    // Unmount the counter: its controls disappear and the effect cleanup
    // runs exactly once.
    SHOW.with(|s| s.borrow().clone()).unwrap().set(false).unwrap();
    assert_eq!(CLEANUPS.with(Cell::get), 1);
    let snap = handle.snapshot();
    assert!(!snap.contains("count:"));
    assert!(snap.contains("▣ Counter"));

    SHOW.with(|s| s.borrow().clone()).unwrap().set(true).unwrap();
    assert!(handle.snapshot().contains("count: 0"), "fresh state after remount");
    assert_eq!(CLEANUPS.with(Cell::get), 1);
}
