pub mod headless;
pub mod runtime;
pub mod ticker;
