//! Score Analytics Engine.
//!
//! Everything below `service` is a pure function over an [`model::ExamSnapshot`]
//! or the per-request aggregates built from one. `service` is the only module
//! that talks to a [`crate::store::ScoreStore`].

pub mod aggregate;
pub mod balance;
pub mod critical;
pub mod error;
pub mod model;
pub mod overview;
pub mod progress;
pub mod ranking;
pub mod segments;
pub mod service;
pub mod stats;
pub mod thresholds;

pub use error::AnalyticsError;
pub use service::AnalyticsService;
