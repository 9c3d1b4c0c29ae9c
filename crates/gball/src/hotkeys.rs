use crate::config::{ALPHA_RANGE, DisplayConfig, G_SCALE_RANGE};
use strum::{Display as StrumDisplay, EnumIter};

pub const G_SCALE_STEP: f64 = 0.25;
pub const ALPHA_STEP: f64 = 0.05;

pub const HELP_LINES: [&str; 2] = [
    "G = grav. comp, T = trail, +/- = scale, S/A = smoothing, H = help, right-click = quit",
    "Drag to move. Dot = (lat g, long g). Up = accel, down = brake, left = left g.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, StrumDisplay)]
#[strum(serialize_all = "kebab-case")]
pub enum Hotkey {
    ToggleCompensation,
    ToggleTrail,
    ToggleHelp,
    ScaleUp,
    ScaleDown,
    SmoothingUp,
    SmoothingDown,
}

impl Hotkey {
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'g' => Some(Self::ToggleCompensation),
            't' => Some(Self::ToggleTrail),
            'h' => Some(Self::ToggleHelp),
            '+' | '=' => Some(Self::ScaleUp),
            '-' | '_' => Some(Self::ScaleDown),
            's' => Some(Self::SmoothingUp),
            'a' => Some(Self::SmoothingDown),
            _ => None,
        }
    }

    pub fn apply(self, config: &mut DisplayConfig) {
        match self {
            Self::ToggleCompensation => {
                config.gravity_compensation_enabled = !config.gravity_compensation_enabled
            }
            Self::ToggleTrail => config.show_trail = !config.show_trail,
            Self::ToggleHelp => config.show_help = !config.show_help,
            Self::ScaleUp => config.g_scale = step(config.g_scale, G_SCALE_STEP, G_SCALE_RANGE),
            Self::ScaleDown => config.g_scale = step(config.g_scale, -G_SCALE_STEP, G_SCALE_RANGE),
            Self::SmoothingUp => {
                config.smoothing_alpha = step(config.smoothing_alpha, ALPHA_STEP, ALPHA_RANGE)
            }
            Self::SmoothingDown => {
                config.smoothing_alpha = step(config.smoothing_alpha, -ALPHA_STEP, ALPHA_RANGE)
            }
        }
    }
}

// rounded to hundredths so repeated steps land on exact values
fn step(value: f64, delta: f64, (min, max): (f64, f64)) -> f64 {
    (((value + delta) * 100.0).round() / 100.0).clamp(min, max)
}
