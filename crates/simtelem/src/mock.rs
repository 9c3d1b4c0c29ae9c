use crate::source::{SourceError, TelemetrySource};
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone)]
enum MockFrame {
    Values(HashMap<String, f64>),
    Failure,
}

/// Scripted telemetry source for tests.
///
/// Each `freeze_latest` consumes one queued frame; once the queue is empty the last
/// frame keeps being served.
#[derive(Debug, Default)]
pub struct MockSource {
    available: bool,
    connected: bool,
    queue: VecDeque<MockFrame>,
    current: HashMap<String, f64>,
    pub connect_attempts: usize,
    pub disconnects: usize,
}

impl MockSource {
    pub fn online() -> Self {
        Self {
            available: true,
            ..Self::default()
        }
    }

    pub fn offline() -> Self {
        Self::default()
    }

    /// Controls whether the simulator is running. Going offline breaks an existing
    /// connection on the next freeze.
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    pub fn push_frame<'a>(&mut self, values: impl IntoIterator<Item = (&'a str, f64)>) {
        let values = values
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect();
        self.queue.push_back(MockFrame::Values(values));
    }

    pub fn push_failure(&mut self) {
        self.queue.push_back(MockFrame::Failure);
    }
}

impl TelemetrySource for MockSource {
    fn connect(&mut self) -> bool {
        self.connect_attempts += 1;
        self.connected = self.available;
        self.connected
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn freeze_latest(&mut self) -> Result<(), SourceError> {
        if !self.connected || !self.available {
            return Err(SourceError::NotConnected);
        }
        match self.queue.pop_front() {
            Some(MockFrame::Values(values)) => self.current = values,
            Some(MockFrame::Failure) => {
                return Err(SourceError::Io(std::io::Error::other(
                    "scripted read failure",
                )));
            }
            None => {}
        }
        Ok(())
    }

    fn read_variable(&self, name: &str) -> Result<Option<f64>, SourceError> {
        if !self.connected {
            return Err(SourceError::NotConnected);
        }
        Ok(self.current.get(name).copied())
    }

    fn disconnect(&mut self) {
        self.connected = false;
        self.disconnects += 1;
    }
}
