use super::TelemetryFrame;
use simtelem::{SourceError, TelemetrySource};

/// A telemetry value published at a high rate with a standard-rate fallback.
#[derive(Debug, Clone, Copy)]
pub struct Channel {
    pub primary: &'static str,
    pub fallback: Option<&'static str>,
}

pub const LONG_ACCEL: Channel = Channel {
    primary: "LongAccel_ST",
    fallback: Some("LongAccel"),
};
pub const LAT_ACCEL: Channel = Channel {
    primary: "LatAccel_ST",
    fallback: Some("LatAccel"),
};
pub const PITCH: Channel = Channel {
    primary: "Pitch",
    fallback: None,
};
pub const ROLL: Channel = Channel {
    primary: "Roll",
    fallback: None,
};

/// Owns the telemetry source and turns it into one frame per tick.
///
/// While disconnected every call to [`Sampler::sample`] attempts a fresh
/// connection. Any read error tears the connection down.
pub struct Sampler<S> {
    source: S,
}

impl<S: TelemetrySource> Sampler<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn sample(&mut self) -> TelemetryFrame {
        if !self.ensure_connected() {
            return TelemetryFrame::no_data();
        }

        match self.read_frame() {
            Ok(frame) => frame,
            Err(e) => {
                log::debug!("Telemetry read failed, reconnecting next tick: {}", e);
                self.source.disconnect();
                TelemetryFrame::no_data()
            }
        }
    }

    fn ensure_connected(&mut self) -> bool {
        self.source.is_connected() || self.source.connect()
    }

    fn read_frame(&mut self) -> Result<TelemetryFrame, SourceError> {
        self.source.freeze_latest()?;

        let long_accel = self.read_channel(LONG_ACCEL)?;
        let lat_accel = self.read_channel(LAT_ACCEL)?;
        let (Some(long_accel), Some(lat_accel)) = (long_accel, lat_accel) else {
            return Ok(TelemetryFrame::no_data());
        };

        Ok(TelemetryFrame::new(
            long_accel,
            lat_accel,
            self.read_channel(PITCH)?.unwrap_or(0.0),
            self.read_channel(ROLL)?.unwrap_or(0.0),
        ))
    }

    /// Reads the primary variable, or the fallback when the primary is not published.
    /// Non-finite values count as absent.
    fn read_channel(&self, channel: Channel) -> Result<Option<f64>, SourceError> {
        let value = match self.source.read_variable(channel.primary)? {
            Some(v) => Some(v),
            None => match channel.fallback {
                Some(name) => self.source.read_variable(name)?,
                None => None,
            },
        };
        Ok(value.filter(|v| v.is_finite()))
    }
}
