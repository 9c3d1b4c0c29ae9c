//! Telemetry-to-g-force pipeline: sampling a source and smoothing the result.

pub mod processor;
pub mod sampler;

use crate::config::{SourceConfig, SourceKind};
use simtelem::TelemetrySource;
use simtelem::demo::DemoSource;
use simtelem::irsdk::IrsdkSource;

pub use processor::{GPoint, ProcessSettings, SignalProcessor, SmoothedState, TRAIL_CAPACITY, Trail};
pub use sampler::Sampler;

/// Standard gravity, m/s^2.
pub const G0: f64 = 9.80665;

/// One poll's worth of raw telemetry. `None` accelerations mean no data.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TelemetryFrame {
    /// Longitudinal acceleration in m/s^2, + forward.
    pub long_accel: Option<f64>,
    /// Lateral acceleration in m/s^2, + left.
    pub lat_accel: Option<f64>,
    /// Pitch in radians.
    pub pitch: f64,
    /// Roll in radians.
    pub roll: f64,
}

impl TelemetryFrame {
    pub fn no_data() -> Self {
        Self::default()
    }

    pub fn new(long_accel: f64, lat_accel: f64, pitch: f64, roll: f64) -> Self {
        Self {
            long_accel: Some(long_accel),
            lat_accel: Some(lat_accel),
            pitch,
            roll,
        }
    }

    pub fn has_data(&self) -> bool {
        self.long_accel.is_some() && self.lat_accel.is_some()
    }
}

/// Builds the telemetry source selected in the configuration.
pub fn open_source(config: &SourceConfig) -> Box<dyn TelemetrySource> {
    log::info!("Using {} telemetry source", config.kind);
    match config.kind {
        SourceKind::Irsdk => Box::new(IrsdkSource::new(config.irsdk_path.clone())),
        SourceKind::Demo => Box::new(DemoSource::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_source_is_always_available() {
        let config = SourceConfig {
            kind: SourceKind::Demo,
            ..SourceConfig::default()
        };
        let mut source = open_source(&config);
        assert!(source.connect());
        source.freeze_latest().unwrap();
        assert!(source.read_variable("LongAccel").unwrap().is_some());
    }

    #[test]
    fn test_missing_irsdk_file_stays_disconnected() {
        let config = SourceConfig {
            kind: SourceKind::Irsdk,
            irsdk_path: "/nonexistent/gball-test-irsdk".into(),
        };
        let mut source = open_source(&config);
        assert!(!source.connect());
        assert!(!source.is_connected());
    }
}
