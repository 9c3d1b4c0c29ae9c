use gdk4 as gdk;
use gtk::prelude::*;
use gtk4 as gtk;
use palette::Srgba;

pub struct ThemeColors {
    pub outer_ring: Srgba<f64>,
    pub grid: Srgba<f64>,
    pub text: Srgba<f64>,
    pub help: Srgba<f64>,
    pub trail: Srgba<f64>,
    pub dot: Srgba<f64>,
    pub dot_outline: Srgba<f64>,
    pub waiting: Srgba<f64>,
}

impl Default for ThemeColors {
    fn default() -> Self {
        Self {
            outer_ring: Srgba::new(1.0, 1.0, 1.0, 0.7),
            grid: Srgba::new(1.0, 1.0, 1.0, 0.35),
            text: Srgba::new(1.0, 1.0, 1.0, 0.86),
            help: Srgba::new(1.0, 1.0, 1.0, 0.78),
            trail: Srgba::new(0.0, 0.78, 1.0, 0.47),
            dot: Srgba::new(0.0, 0.78, 1.0, 0.86),
            dot_outline: Srgba::new(0.0, 0.0, 0.0, 0.47),
            waiting: Srgba::new(1.0, 1.0, 1.0, 0.5),
        }
    }
}

impl ThemeColors {
    /// The scale stays white for contrast against the game; only the dot and trail
    /// follow the desktop accent colour when one is defined.
    pub fn from_context(context: &gtk::StyleContext) -> Self {
        let fallback = Self::default();
        Self {
            dot: Self::lookup_color(context, "accent_color", fallback.dot, Some(0.86)),
            trail: Self::lookup_color(context, "accent_color", fallback.trail, Some(0.47)),
            ..fallback
        }
    }

    fn lookup_color(
        context: &gtk::StyleContext,
        name: &str,
        fallback: Srgba<f64>,
        alpha_override: Option<f64>,
    ) -> Srgba<f64> {
        context
            .lookup_color(name)
            .map(|c| {
                let (r, g, b, a) = (
                    c.red() as f64,
                    c.green() as f64,
                    c.blue() as f64,
                    c.alpha() as f64,
                );
                Srgba::new(r, g, b, alpha_override.unwrap_or(a))
            })
            .unwrap_or(fallback)
    }
}

pub fn load_css() {
    let provider = gtk::CssProvider::new();
    let css_data = "
.gball-window, .gball-drawing-area {
    background: none;
    background-color: transparent;
}
";
    provider.load_from_data(css_data);

    if let Some(display) = gdk::Display::default() {
        gtk::style_context_add_provider_for_display(
            &display,
            &provider,
            gtk::STYLE_PROVIDER_PRIORITY_APPLICATION,
        );
    }
}
