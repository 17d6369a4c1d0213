//! Settings form demo: context propagation, checkboxes, and a slider.
//!
//! Run with `cargo run --example settings`.

use std::error::Error;

use tracing_subscriber::EnvFilter;
use weft::{
    create_context, create_element, render, Component, Context, Element, HookCx, HostRef, Props,
    TermHost,
};

thread_local! {
    static THEME: Context<String> = create_context("dim".to_string());
    static DARK_TOGGLE: HostRef = HostRef::default();
}

fn theme_badge(cx: &mut HookCx, _props: &Props) -> Element {
    let theme = THEME.with(|c| cx.use_context(c));
    create_element(
        "statictext",
        Props::new().set("text", format!("theme: {theme}")),
        vec![],
    )
}

const THEME_BADGE: Component = Component::new("ThemeBadge", theme_badge);

fn volume_defaults() -> Props {
    Props::new().set("value", 40).set("maxvalue", 100)
}

fn volume(_cx: &mut HookCx, props: &Props) -> Element {
    create_element(
        "slider",
        Props::new()
            .set("value", props.int("value").unwrap_or(0))
            .set("maxvalue", props.int("maxvalue").unwrap_or(100)),
        vec![],
    )
}

const VOLUME: Component = Component::with_defaults("Volume", volume, volume_defaults);

fn settings(cx: &mut HookCx, _props: &Props) -> Element {
    let (dark, set_dark) = cx.use_state(false);

    let toggle = create_element(
        "checkbox",
        Props::new()
            .set("text", "dark mode")
            .set("value", dark)
            .handler("on_change", move |_| {
                let _ = set_dark.update(|on| !on);
            })
            .reference(DARK_TOGGLE.with(HostRef::clone)),
        vec![],
    );

    let theme = if dark { "midnight" } else { "daylight" };
    let themed = THEME.with(|c| {
        c.provider(
            theme.to_string(),
            vec![create_element(THEME_BADGE, Props::new(), vec![])],
        )
    });

    let panel = create_element(
        "panel",
        Props::new().set("text", "Audio"),
        vec![create_element(VOLUME, Props::new().set("value", 70), vec![])],
    );

    create_element(
        "window",
        Props::new().set("text", "Settings"),
        vec![toggle, themed, panel],
    )
}

const SETTINGS: Component = Component::new("Settings", settings);

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let host = TermHost::new();
    let handle = host.handle();
    render(create_element(SETTINGS, Props::new(), vec![]), host)?;
    handle.present()?;

    // Flip dark mode: the provider value changes and the badge re-reads it.
    if let Some(toggle) = DARK_TOGGLE.with(HostRef::get) {
        handle.invoke(&toggle, "on_change");
    }
    println!();
    handle.present()?;
    Ok(())
}
