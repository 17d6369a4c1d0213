//! Terminal host binding.
//!
//! Keeps a tree of lightweight controls (windows, groups, text, buttons,
//! value widgets) and knows how to put a textual rendition of it on the
//! terminal. Creation is prop-driven: the engine hands over the fiber's prop
//! bag and this binding interprets the keys it knows (`text`, `value`,
//! `minvalue`, `maxvalue`, `on_*` handlers) while storing the rest untouched.
//!
//! Layout is a plain vertical stack with indentation per nesting level; the
//! hosting toolkit of a richer binding would own real layout instead.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::rc::Rc;

use bitflags::bitflags;
use crossterm::queue;
use crossterm::style::{Attribute, Print, SetAttribute};
use crossterm::terminal;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::{HostBinding, HostError, HostFiber, HostInstance};
use crate::types::PropValue;

// =============================================================================
// Control Kinds
// =============================================================================

bitflags! {
    /// What a control kind is able to do.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Caps: u8 {
        /// May exist without a parent (and only without one).
        const TOP_LEVEL = 1 << 0;
        /// May hold child controls.
        const HOSTS_CHILDREN = 1 << 1;
        /// Renders a text label.
        const HAS_TEXT = 1 << 2;
        /// Carries a numeric or boolean value.
        const HAS_VALUE = 1 << 3;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Window,
    Group,
    Panel,
    StaticText,
    EditText,
    Button,
    Checkbox,
    RadioButton,
    Slider,
    Progressbar,
    ListBox,
    Item,
}

impl ControlKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "window" => Some(Self::Window),
            "group" => Some(Self::Group),
            "panel" => Some(Self::Panel),
            "statictext" => Some(Self::StaticText),
            "edittext" => Some(Self::EditText),
            "button" => Some(Self::Button),
            "checkbox" => Some(Self::Checkbox),
            "radiobutton" => Some(Self::RadioButton),
            "slider" => Some(Self::Slider),
            "progressbar" => Some(Self::Progressbar),
            "listbox" => Some(Self::ListBox),
            "item" => Some(Self::Item),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Self::Window => "window",
            Self::Group => "group",
            Self::Panel => "panel",
            Self::StaticText => "statictext",
            Self::EditText => "edittext",
            Self::Button => "button",
            Self::Checkbox => "checkbox",
            Self::RadioButton => "radiobutton",
            Self::Slider => "slider",
            Self::Progressbar => "progressbar",
            Self::ListBox => "listbox",
            Self::Item => "item",
        }
    }

    pub fn caps(self) -> Caps {
        match self {
            Self::Window => Caps::TOP_LEVEL | Caps::HOSTS_CHILDREN | Caps::HAS_TEXT,
            Self::Group => Caps::HOSTS_CHILDREN,
            Self::Panel => Caps::HOSTS_CHILDREN | Caps::HAS_TEXT,
            Self::ListBox => Caps::HOSTS_CHILDREN,
            Self::StaticText | Self::EditText | Self::Button | Self::Item => Caps::HAS_TEXT,
            Self::Checkbox | Self::RadioButton => Caps::HAS_TEXT | Caps::HAS_VALUE,
            Self::Slider | Self::Progressbar => Caps::HAS_VALUE,
        }
    }
}

// =============================================================================
// Control Tree
// =============================================================================

/// Instance payload handed back to the engine; resolves to a slot in the
/// control arena.
#[derive(Debug)]
pub struct ControlHandle {
    id: usize,
}

impl ControlHandle {
    pub fn id(&self) -> usize {
        self.id
    }
}

struct Control {
    kind: ControlKind,
    props: BTreeMap<&'static str, PropValue>,
    children: Vec<usize>,
    parent: Option<usize>,
}

#[derive(Default)]
struct TermState {
    controls: Vec<Option<Control>>,
    windows: Vec<usize>,
    width: u16,
}

fn control_id(instance: &HostInstance) -> Result<usize, HostError> {
    instance
        .downcast_ref::<ControlHandle>()
        .map(|h| h.id)
        .ok_or_else(|| HostError::Other("instance was not created by this binding".into()))
}

fn control_mut(state: &mut TermState, id: usize) -> Result<&mut Control, HostError> {
    state
        .controls
        .get_mut(id)
        .and_then(Option::as_mut)
        .ok_or_else(|| HostError::Other(format!("control #{id} no longer exists")))
}

fn control_ref(state: &TermState, id: usize) -> Result<&Control, HostError> {
    state
        .controls
        .get(id)
        .and_then(Option::as_ref)
        .ok_or_else(|| HostError::Other(format!("control #{id} no longer exists")))
}

// =============================================================================
// Host
// =============================================================================

/// The terminal host binding. Move it into [`crate::render`]; keep a
/// [`TermHandle`] (from [`TermHost::handle`]) around for presenting and for
/// driving handler props.
pub struct TermHost {
    state: Rc<RefCell<TermState>>,
}

impl TermHost {
    /// Autodetects the terminal width (80 columns when detection fails).
    pub fn new() -> Self {
        let width = terminal::size().map(|(w, _)| w).unwrap_or(80);
        Self::with_width(width)
    }

    pub fn with_width(width: u16) -> Self {
        Self {
            state: Rc::new(RefCell::new(TermState {
                width,
                ..TermState::default()
            })),
        }
    }

    /// A shared view of the control tree, usable after the host has been
    /// moved into the engine.
    pub fn handle(&self) -> TermHandle {
        TermHandle {
            state: Rc::clone(&self.state),
        }
    }
}

impl Default for TermHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostBinding for TermHost {
    fn create(&mut self, fiber: &HostFiber<'_>) -> Result<HostInstance, HostError> {
        let kind = ControlKind::from_tag(fiber.tag)
            .ok_or_else(|| HostError::UnknownType(fiber.tag.to_string()))?;
        let mut state = self.state.borrow_mut();

        let parent = if kind.caps().contains(Caps::TOP_LEVEL) {
            None
        } else {
            let parent_instance =
                fiber
                    .parent_instance
                    .ok_or_else(|| HostError::CannotHostChildren {
                        parent: "nothing".into(),
                        child: fiber.tag.to_string(),
                    })?;
            let parent_id = control_id(parent_instance)?;
            let parent_kind = control_ref(&state, parent_id)?.kind;
            if !parent_kind.caps().contains(Caps::HOSTS_CHILDREN) {
                return Err(HostError::CannotHostChildren {
                    parent: parent_kind.tag().into(),
                    child: fiber.tag.to_string(),
                });
            }
            Some(parent_id)
        };

        let id = state.controls.len();
        state.controls.push(Some(Control {
            kind,
            props: fiber.props.iter().map(|(k, v)| (k, v.clone())).collect(),
            children: Vec::new(),
            parent,
        }));
        match parent {
            Some(p) => control_mut(&mut state, p)?.children.push(id),
            None => state.windows.push(id),
        }
        Ok(Rc::new(ControlHandle { id }))
    }

    fn update(&mut self, fiber: &HostFiber<'_>) -> Result<(), HostError> {
        let instance = fiber
            .instance
            .ok_or_else(|| HostError::Other("update without an instance".into()))?;
        let id = control_id(instance)?;
        let mut state = self.state.borrow_mut();
        let control = control_mut(&mut state, id)?;

        // Keys gone from the new props are cleared, changed keys re-set.
        if let Some(prev) = fiber.prev_props {
            for (key, _) in prev.iter() {
                if fiber.props.get(key).is_none() {
                    control.props.remove(key);
                }
            }
        }
        for (key, value) in fiber.props.iter() {
            let unchanged = fiber
                .prev_props
                .and_then(|p| p.get(key))
                .is_some_and(|prev| prev == value);
            if !unchanged {
                control.props.insert(key, value.clone());
            }
        }
        Ok(())
    }

    fn remove(&mut self, fiber: &HostFiber<'_>) -> Result<(), HostError> {
        let instance = fiber
            .instance
            .ok_or_else(|| HostError::Other("remove without an instance".into()))?;
        let id = control_id(instance)?;
        let mut state = self.state.borrow_mut();

        let parent = control_mut(&mut state, id)?.parent;
        match parent {
            Some(p) => {
                if let Ok(parent_control) = control_mut(&mut state, p) {
                    parent_control.children.retain(|c| *c != id);
                }
            }
            None => state.windows.retain(|w| *w != id),
        }
        state.controls[id] = None;
        Ok(())
    }
}

// =============================================================================
// Handle: Presentation & Event Driving
// =============================================================================

/// Shared view of a [`TermHost`]'s control tree.
#[derive(Clone)]
pub struct TermHandle {
    state: Rc<RefCell<TermState>>,
}

impl TermHandle {
    /// Number of live controls.
    pub fn control_count(&self) -> usize {
        self.state.borrow().controls.iter().flatten().count()
    }

    /// Fire a handler prop (`on_click`, `on_change`, ...) of an instance.
    /// Returns whether a handler was registered for `event`.
    pub fn invoke(&self, instance: &HostInstance, event: &str) -> bool {
        let handler = {
            let state = self.state.borrow();
            control_id(instance)
                .ok()
                .and_then(|id| control_ref(&state, id).ok().map(|c| c.props.clone()))
                .and_then(|props| props.get(event).and_then(PropValue::as_handler).cloned())
        };
        match handler {
            // The borrow is released first: handlers routinely dispatch,
            // which re-enters this binding through the engine.
            Some(handler) => {
                handler.invoke(instance);
                true
            }
            None => false,
        }
    }

    /// Textual rendition of all windows, one control per line.
    pub fn snapshot(&self) -> String {
        let state = self.state.borrow();
        let width = state.width.max(8) as usize;
        let mut out = String::new();
        for (indent, line, _) in collect_lines(&state) {
            out.push_str(&clip(&format!("{:indent$}{line}", ""), width));
            out.push('\n');
        }
        out
    }

    /// Print the current control tree to stdout, window titles emphasized.
    pub fn present(&self) -> io::Result<()> {
        let state = self.state.borrow();
        let width = state.width.max(8) as usize;
        let mut out = io::stdout();
        for (indent, line, kind) in collect_lines(&state) {
            let text = clip(&format!("{:indent$}{line}", ""), width);
            if kind == ControlKind::Window {
                queue!(
                    out,
                    SetAttribute(Attribute::Bold),
                    Print(text),
                    SetAttribute(Attribute::Reset),
                    Print("\n")
                )?;
            } else {
                queue!(out, Print(text), Print("\n"))?;
            }
        }
        out.flush()
    }
}

fn collect_lines(state: &TermState) -> Vec<(usize, String, ControlKind)> {
    let mut lines = Vec::new();
    for window in &state.windows {
        push_lines(state, *window, 0, &mut lines);
    }
    lines
}

fn push_lines(state: &TermState, id: usize, indent: usize, lines: &mut Vec<(usize, String, ControlKind)>) {
    let Some(control) = state.controls.get(id).and_then(Option::as_ref) else {
        return;
    };
    lines.push((indent, describe(control), control.kind));
    for child in &control.children {
        push_lines(state, *child, indent + 2, lines);
    }
}

fn describe(control: &Control) -> String {
    let text = control
        .props
        .get("text")
        .and_then(PropValue::as_text)
        .unwrap_or("");
    let value = control
        .props
        .get("value")
        .and_then(PropValue::as_float)
        .unwrap_or(0.0);
    let checked = control
        .props
        .get("value")
        .and_then(PropValue::as_bool)
        .unwrap_or(false);

    match control.kind {
        ControlKind::Window => format!("▣ {text}"),
        ControlKind::Group => "·".to_string(),
        ControlKind::Panel => format!("┌ {text}"),
        ControlKind::StaticText => text.to_string(),
        ControlKind::EditText => format!("[{text}]"),
        ControlKind::Button => format!("( {text} )"),
        ControlKind::Checkbox => {
            format!("[{}] {text}", if checked { 'x' } else { ' ' })
        }
        ControlKind::RadioButton => {
            format!("({}) {text}", if checked { 'o' } else { ' ' })
        }
        ControlKind::Slider | ControlKind::Progressbar => {
            let min = control
                .props
                .get("minvalue")
                .and_then(PropValue::as_float)
                .unwrap_or(0.0);
            let max = control
                .props
                .get("maxvalue")
                .and_then(PropValue::as_float)
                .unwrap_or(100.0);
            let span = (max - min).max(f64::EPSILON);
            let filled = (((value - min) / span).clamp(0.0, 1.0) * 10.0).round() as usize;
            format!("{}{} {value:.0}", "█".repeat(filled), "░".repeat(10 - filled))
        }
        ControlKind::ListBox => "≡".to_string(),
        ControlKind::Item => format!("• {text}"),
    }
}

/// Truncate to the display width, ellipsis at the cut.
fn clip(s: &str, width: usize) -> String {
    if s.width() <= width {
        return s.to_string();
    }
    let mut out = String::new();
    let mut used = 0usize;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > width.saturating_sub(1) {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

// =============================================================================
// Tests
// =============================================================================
