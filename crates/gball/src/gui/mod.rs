pub mod app;
pub mod gmeter;
pub mod theme;
pub mod window;
