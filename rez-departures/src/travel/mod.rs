//! Travel-time estimation.
//!
//! A departure at one stop and an arrival at another are the same vehicle
//! run when their trip ids match. Correlated pairs give live durations,
//! which are averaged per line and checked against mode-specific bounds
//! before being trusted.

mod config;
mod correlate;
mod estimator;

pub use config::{EstimatorConfig, TRAIN_STATIC_MINUTES, static_minutes};
pub use correlate::{aggregate_by_line, correlate};
pub use estimator::{Sampling, TravelTimeEstimate, TravelTimeEstimator, UnavailableReason};
