pub mod config;
pub mod events;
pub mod gui;
pub mod hotkeys;
pub mod pipeline;
pub mod sys;
pub mod telemetry;
