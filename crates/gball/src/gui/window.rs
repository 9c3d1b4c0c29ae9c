use crate::config::{DisplayConfig, WindowPosition};
use crate::gui::gmeter::Point;
use gtk::prelude::*;
use gtk4 as gtk;
use gtk4_layer_shell::{Edge, KeyboardMode, Layer, LayerShell};

/// Turns the window into an always-on-top overlay surface pinned to the top-left
/// corner; its position is then controlled through the edge margins.
pub fn init_layer_shell(window: &gtk::ApplicationWindow, config: &DisplayConfig) {
    window.init_layer_shell();
    window.set_layer(Layer::Overlay);
    window.set_namespace(Some("gball"));
    window.set_exclusive_zone(-1);
    for edge in [Edge::Left, Edge::Top] {
        window.set_anchor(edge, true);
    }
    apply_config(window, config);
}

pub fn apply_config(window: &gtk::ApplicationWindow, config: &DisplayConfig) {
    window.set_default_size(config.window_size.width, config.window_size.height);
    window.set_keyboard_mode(if config.hotkeys_enabled {
        KeyboardMode::OnDemand
    } else {
        KeyboardMode::None
    });
    move_to(window, config.window_position);
}

pub fn move_to(window: &gtk::ApplicationWindow, position: WindowPosition) {
    window.set_margin(Edge::Left, position.x);
    window.set_margin(Edge::Top, position.y);
}

/// Follows a drag gesture. Each offset reported by GTK is relative to where the drag
/// began, so the new position is always derived from the position at that point.
#[derive(Debug, Default)]
pub struct DragTracker {
    origin: Option<WindowPosition>,
}

impl DragTracker {
    pub fn begin(&mut self, position: WindowPosition) {
        self.origin = Some(position);
    }

    /// Position for the given offset, or `None` outside of a drag.
    pub fn update(&self, offset: Point) -> Option<WindowPosition> {
        let origin = self.origin?;
        Some(WindowPosition {
            x: origin.x + offset.x.round() as i32,
            y: origin.y + offset.y.round() as i32,
        })
    }

    pub fn end(&mut self) {
        self.origin = None;
    }
}
