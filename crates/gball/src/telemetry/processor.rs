use super::{G0, TelemetryFrame};
use crate::config::DisplayConfig;
use std::collections::VecDeque;

/// About two seconds of history at 60 Hz.
pub const TRAIL_CAPACITY: usize = 120;

/// A point on the g-ball, in g-units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GPoint {
    pub lat: f64,
    pub long: f64,
}

impl GPoint {
    pub fn new(lat: f64, long: f64) -> Self {
        Self { lat, long }
    }
}

/// Single-pole exponential moving average. Without a previous value the new sample
/// passes straight through.
pub fn ema(prev: Option<f64>, new: f64, alpha: f64) -> f64 {
    match prev {
        Some(prev) => alpha * new + (1.0 - alpha) * prev,
        None => new,
    }
}

/// Removes the gravity component picked up by a tilted body, using the single-axis
/// approximation `g*sin(pitch)` and `g*cos(pitch)*sin(roll)`. This is not a full
/// rotation of the gravity vector into the body frame.
pub fn compensate_gravity(long_accel: f64, lat_accel: f64, pitch: f64, roll: f64) -> (f64, f64) {
    (
        long_accel + G0 * pitch.sin(),
        lat_accel + G0 * pitch.cos() * roll.sin(),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SmoothedState {
    pub long_g: Option<f64>,
    pub lat_g: Option<f64>,
}

impl SmoothedState {
    /// Last known position, available only while both channels are set.
    pub fn position(&self) -> Option<GPoint> {
        Some(GPoint::new(self.lat_g?, self.long_g?))
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Bounded history of smoothed positions, oldest first.
#[derive(Debug, Clone)]
pub struct Trail {
    points: VecDeque<GPoint>,
}

impl Trail {
    pub fn new() -> Self {
        Self {
            points: VecDeque::with_capacity(TRAIL_CAPACITY),
        }
    }

    pub fn push(&mut self, point: GPoint) {
        if self.points.len() == TRAIL_CAPACITY {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &GPoint> {
        self.points.iter()
    }

    pub fn oldest(&self) -> Option<&GPoint> {
        self.points.front()
    }

    pub fn newest(&self) -> Option<&GPoint> {
        self.points.back()
    }
}

impl Default for Trail {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessSettings {
    pub alpha: f64,
    pub gravity_compensation: bool,
}

impl From<&DisplayConfig> for ProcessSettings {
    fn from(config: &DisplayConfig) -> Self {
        Self {
            alpha: config.smoothing_alpha,
            gravity_compensation: config.gravity_compensation_enabled,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SignalProcessor {
    smoothed: SmoothedState,
    trail: Trail,
}

impl SignalProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one frame into the smoothed state and returns the new position.
    ///
    /// A frame without data resets both channels, so the next valid frame starts
    /// without smoothing lag. The trail is left as is.
    pub fn process(&mut self, frame: &TelemetryFrame, settings: ProcessSettings) -> Option<GPoint> {
        let (Some(long_accel), Some(lat_accel)) = (frame.long_accel, frame.lat_accel) else {
            self.smoothed.reset();
            return None;
        };

        let (long_accel, lat_accel) = if settings.gravity_compensation {
            compensate_gravity(long_accel, lat_accel, frame.pitch, frame.roll)
        } else {
            (long_accel, lat_accel)
        };

        let long_g = ema(self.smoothed.long_g, long_accel / G0, settings.alpha);
        let lat_g = ema(self.smoothed.lat_g, lat_accel / G0, settings.alpha);
        self.smoothed = SmoothedState {
            long_g: Some(long_g),
            lat_g: Some(lat_g),
        };

        let point = GPoint::new(lat_g, long_g);
        self.trail.push(point);
        Some(point)
    }

    pub fn smoothed(&self) -> &SmoothedState {
        &self.smoothed
    }

    pub fn trail(&self) -> &Trail {
        &self.trail
    }

    pub fn position(&self) -> Option<GPoint> {
        self.smoothed.position()
    }
}
