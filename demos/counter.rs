//! Counter demo: state, a handler prop, and in-place host mutation.
//!
//! Run with `cargo run --example counter`. Set `RUST_LOG=weft=debug` to watch
//! the engine work.

use std::error::Error;

use tracing_subscriber::EnvFilter;
use weft::{create_element, render, Component, Element, HookCx, HostRef, Props, TermHost};

thread_local! {
    static BUMP: HostRef = HostRef::default();
}

fn counter(cx: &mut HookCx, _props: &Props) -> Element {
    let (count, set) = cx.use_state(0i64);

    let label = create_element(
        "statictext",
        Props::new().set("text", format!("count: {count}")),
        vec![],
    );
    let gauge = create_element(
        "progressbar",
        Props::new()
            .set("value", count * 10)
            .set("maxvalue", 100),
        vec![],
    );
    let bump = create_element(
        "button",
        Props::new()
            .set("text", "+1")
            .handler("on_click", move |_| {
                let _ = set.update(|c| c + 1);
            })
            .reference(BUMP.with(HostRef::clone)),
        vec![],
    );
    create_element(
        "window",
        Props::new().set("text", "Counter"),
        vec![label, gauge, bump],
    )
}

const COUNTER: Component = Component::new("Counter", counter);

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let host = TermHost::new();
    let handle = host.handle();
    render(create_element(COUNTER, Props::new(), vec![]), host)?;
    handle.present()?;

    // Simulate three clicks on the button; each one re-renders the tree and
    // mutates the bound controls in place.
    for _ in 0..3 {
        if let Some(button) = BUMP.with(HostRef::get) {
            handle.invoke(&button, "on_click");
        }
        println!();
        handle.present()?;
    }
    Ok(())
}
