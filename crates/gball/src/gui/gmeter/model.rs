use super::{DOT_RADIUS, RADIUS_FACTOR, RING_STEP_G};
use crate::config::DisplayConfig;
use crate::pipeline::RenderState;
use crate::telemetry::{GPoint, Trail};
use palette::Srgba;

pub const WAITING_LABEL: &str = "waiting for telemetry";

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Maps g-values onto the circular scale. Positive lateral g is drawn to the left and
/// positive longitudinal g upwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleGeometry {
    pub center: Point,
    pub radius: f64,
    pub g_scale: f64,
}

impl ScaleGeometry {
    pub fn new(width: f64, height: f64, g_scale: f64) -> Self {
        Self {
            center: Point::new(width / 2.0, height / 2.0),
            radius: width.min(height) * RADIUS_FACTOR,
            g_scale,
        }
    }

    /// Pixel distance from the center for a g-value.
    pub fn offset(&self, g: f64) -> f64 {
        (g / self.g_scale) * self.radius
    }

    pub fn to_pixel(&self, point: GPoint) -> Point {
        Point::new(
            self.center.x - self.offset(point.lat),
            self.center.y - self.offset(point.long),
        )
    }

    /// Radii of the inner grid rings, one per 0.5 g below the outer ring.
    pub fn ring_radii(&self) -> Vec<f64> {
        (1..)
            .map(|i| i as f64 * RING_STEP_G)
            .take_while(|g| *g < self.g_scale - 1e-9)
            .map(|g| self.offset(g))
            .collect()
    }
}

/// Everything needed to draw one frame.
pub struct Scene<'a> {
    pub geometry: ScaleGeometry,
    pub position: Option<GPoint>,
    pub trail: &'a Trail,
    pub show_trail: bool,
    pub show_help: bool,
    pub background: Srgba<f64>,
    pub scale_label: String,
    pub width: f64,
    pub height: f64,
}

impl<'a> Scene<'a> {
    pub fn new(state: &RenderState<'a>, config: &DisplayConfig, width: f64, height: f64) -> Self {
        Self {
            geometry: ScaleGeometry::new(width, height, config.g_scale),
            position: state.position,
            trail: state.trail,
            show_trail: config.show_trail,
            show_help: config.show_help,
            background: config.background_rgba.to_f64(),
            scale_label: scale_label(config),
            width,
            height,
        }
    }

    pub fn dot(&self) -> Option<Point> {
        self.position.map(|p| self.geometry.to_pixel(p))
    }

    /// Trail path in pixels, oldest first. Empty when there is nothing to draw.
    pub fn trail_path(&self) -> Vec<Point> {
        if !self.show_trail || self.position.is_none() || self.trail.len() < 2 {
            return Vec::new();
        }
        self.trail
            .iter()
            .map(|p| self.geometry.to_pixel(*p))
            .collect()
    }

    pub fn values_label(&self) -> Option<String> {
        self.position.map(values_label)
    }

    pub fn dot_radius(&self) -> f64 {
        DOT_RADIUS
    }
}

pub fn scale_label(config: &DisplayConfig) -> String {
    format!(
        "±{:.2} g   α={:.2}   comp={}",
        config.g_scale,
        config.smoothing_alpha,
        if config.gravity_compensation_enabled {
            "on"
        } else {
            "off"
        }
    )
}

pub fn values_label(point: GPoint) -> String {
    format!("Long: {:.2} g   Lat: {:.2} g", point.long, point.lat)
}
