pub mod analytics;
pub mod core;
pub mod params;
pub mod setup;
pub mod thresholds;
