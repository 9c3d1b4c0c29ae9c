//! Poll, process and snapshot phases of the overlay, independent of any display.

use crate::config::DisplayConfig;
use crate::telemetry::{GPoint, ProcessSettings, Sampler, SignalProcessor, TelemetryFrame, Trail};
use simtelem::TelemetrySource;
use strum::Display as StrumDisplay;

#[derive(Debug, Clone, Copy, PartialEq, Eq, StrumDisplay)]
#[strum(serialize_all = "lowercase")]
pub enum Phase {
    /// No renderable position.
    Disconnected,
    Connected,
}

/// What the renderer needs from one pipeline state.
#[derive(Debug, Clone, Copy)]
pub struct RenderState<'a> {
    pub position: Option<GPoint>,
    pub trail: &'a Trail,
}

pub struct Pipeline<S> {
    sampler: Sampler<S>,
    processor: SignalProcessor,
    phase: Phase,
}

impl<S: TelemetrySource> Pipeline<S> {
    pub fn new(source: S) -> Self {
        Self {
            sampler: Sampler::new(source),
            processor: SignalProcessor::new(),
            phase: Phase::Disconnected,
        }
    }

    pub fn poll(&mut self) -> TelemetryFrame {
        self.sampler.sample()
    }

    pub fn process(&mut self, frame: &TelemetryFrame, config: &DisplayConfig) -> Phase {
        let phase = match self.processor.process(frame, ProcessSettings::from(config)) {
            Some(_) => Phase::Connected,
            None => Phase::Disconnected,
        };

        if phase != self.phase {
            log::info!("Telemetry {} -> {}", self.phase, phase);
            self.phase = phase;
        }
        phase
    }

    pub fn tick(&mut self, config: &DisplayConfig) -> Phase {
        let frame = self.poll();
        self.process(&frame, config)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn render_state(&self) -> RenderState<'_> {
        RenderState {
            position: self.processor.position(),
            trail: self.processor.trail(),
        }
    }
}
