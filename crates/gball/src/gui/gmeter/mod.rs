pub mod model;
pub mod view;

pub use model::{Point, ScaleGeometry, Scene};
pub use view::draw;

pub const RADIUS_FACTOR: f64 = 0.45; // of the shorter window side
pub const RING_STEP_G: f64 = 0.5;
pub const DOT_RADIUS: f64 = 6.0;
pub const FONT_SIZE: f64 = 12.0;
pub const LINE_HEIGHT: f64 = 16.0;
pub const TEXT_MARGIN: f64 = 10.0;
