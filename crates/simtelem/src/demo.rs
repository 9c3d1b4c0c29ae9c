//! Synthetic telemetry for running without a simulator.
//!
//! Loops a short "lap" of braking zones, corners and straights. Only the
//! standard-rate acceleration channels are published.

use crate::source::{SourceError, TelemetrySource};
use std::f64::consts::TAU;
use std::time::Instant;

const G0: f64 = 9.80665;
const LAP_SECONDS: f64 = 24.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DemoSample {
    pub long_accel: f64,
    pub lat_accel: f64,
    pub pitch: f64,
    pub roll: f64,
}

impl DemoSample {
    /// Sample at `t` seconds into the session.
    pub fn at(t: f64) -> Self {
        let phase = (t / LAP_SECONDS).fract() * TAU;

        // two corners per lap, braking into each and accelerating out
        let lat_g = 1.6 * (2.0 * phase).sin() * (phase).cos().abs().sqrt();
        let long_g = 0.45 * (2.0 * phase).cos() - 0.6 * (4.0 * phase).sin().max(0.0);
        // small ripple so the trail doesn't collapse onto one curve
        let ripple = 0.04 * (t * 7.3).sin();

        let long_accel = (long_g + ripple) * G0;
        let lat_accel = (lat_g - ripple) * G0;

        Self {
            long_accel,
            lat_accel,
            pitch: -0.012 * long_g,
            roll: 0.02 * lat_g,
        }
    }
}

#[derive(Default)]
pub struct DemoSource {
    started: Option<Instant>,
    frame: Option<DemoSample>,
}

impl DemoSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TelemetrySource for DemoSource {
    fn connect(&mut self) -> bool {
        if self.started.is_none() {
            log::info!("Using synthetic demo telemetry");
            self.started = Some(Instant::now());
        }
        true
    }

    fn is_connected(&self) -> bool {
        self.started.is_some()
    }

    fn freeze_latest(&mut self) -> Result<(), SourceError> {
        let started = self.started.ok_or(SourceError::NotConnected)?;
        self.frame = Some(DemoSample::at(started.elapsed().as_secs_f64()));
        Ok(())
    }

    fn read_variable(&self, name: &str) -> Result<Option<f64>, SourceError> {
        let frame = self.frame.ok_or(SourceError::NotConnected)?;
        Ok(match name {
            "LongAccel" => Some(frame.long_accel),
            "LatAccel" => Some(frame.lat_accel),
            "Pitch" => Some(frame.pitch),
            "Roll" => Some(frame.roll),
            _ => None,
        })
    }

    fn disconnect(&mut self) {
        self.started = None;
        self.frame = None;
    }
}
