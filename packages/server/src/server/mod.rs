// Process wiring: stores, providers and background services
pub mod app;

pub use app::*;
