pub mod demo;
pub mod irsdk;
pub mod macros;
pub mod mock;
pub mod source;

pub use source::{SourceError, TelemetrySource, VarName};
