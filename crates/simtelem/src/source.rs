use derive_more::{AsRef, Deref, Display, From, Into};
use thiserror::Error;

/// Name of a telemetry variable as published by the simulator (e.g. `LatAccel_ST`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Deref, From, Into, AsRef)]
pub struct VarName(String);

crate::impl_string_newtype!(VarName);

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Telemetry source is not connected")]
    NotConnected,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Malformed telemetry data: {0}")]
    Malformed(String),
    #[error("Unknown variable type {kind} for '{name}'")]
    UnknownVarType { name: VarName, kind: i32 },
}

/// Capability interface over a live simulator telemetry feed.
///
/// Sources are polled from a single thread: `connect` is retried by the caller
/// while disconnected, `freeze_latest` snapshots one consistent frame and
/// `read_variable` reads from that snapshot.
pub trait TelemetrySource {
    /// Attempts to attach to the feed. Returns whether the source is now connected.
    fn connect(&mut self) -> bool;

    fn is_connected(&self) -> bool;

    /// Captures the newest complete frame so that subsequent reads are consistent.
    fn freeze_latest(&mut self) -> Result<(), SourceError> {
        Ok(())
    }

    /// Reads a scalar from the frozen frame. `Ok(None)` means the variable is not published.
    fn read_variable(&self, name: &str) -> Result<Option<f64>, SourceError>;

    fn disconnect(&mut self);
}

impl<T: TelemetrySource + ?Sized> TelemetrySource for Box<T> {
    fn connect(&mut self) -> bool {
        (**self).connect()
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn freeze_latest(&mut self) -> Result<(), SourceError> {
        (**self).freeze_latest()
    }

    fn read_variable(&self, name: &str) -> Result<Option<f64>, SourceError> {
        (**self).read_variable(name)
    }

    fn disconnect(&mut self) {
        (**self).disconnect()
    }
}
