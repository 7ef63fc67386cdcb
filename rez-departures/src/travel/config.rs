//! Estimator configuration and the static travel-time table.

use std::time::Duration;

use crate::domain::{HUSINEC, KOBYLISY, LINE_371, LINE_S4, Mode};

/// S4 Řež ↔ Praha Masarykovo, either way.
pub const TRAIN_STATIC_MINUTES: i64 = 18;

/// Configuration for the travel-time estimator.
#[derive(Debug, Clone)]
pub struct EstimatorConfig {
    /// How long an accepted live aggregate stays cached.
    pub ttl: Duration,

    /// Records requested from each board when sampling.
    pub sample_limit: usize,

    /// Maximum number of cached aggregates.
    pub max_entries: usize,

    /// Live train averages below this multiple of the static time are rejected.
    pub train_min_factor: f64,

    /// Live train averages above this multiple of the static time are rejected.
    pub train_max_factor: f64,

    /// Shortest plausible bus average (minutes).
    pub bus_min_minutes: i64,

    /// Longest plausible bus average (minutes).
    pub bus_max_minutes: i64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(5 * 60),
            sample_limit: 20,
            max_entries: 100,
            train_min_factor: 0.5,
            train_max_factor: 2.0,
            bus_min_minutes: 5,
            bus_max_minutes: 60,
        }
    }
}

impl EstimatorConfig {
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_sample_limit(mut self, limit: usize) -> Self {
        self.sample_limit = limit;
        self
    }

    /// Whether a live average is believable for `mode`, given the static
    /// time for the same trip.
    pub fn accepts(&self, mode: Mode, average_minutes: i64, static_minutes: Option<i64>) -> bool {
        match mode {
            Mode::Train => {
                let reference = static_minutes.unwrap_or(TRAIN_STATIC_MINUTES) as f64;
                let average = average_minutes as f64;
                average >= reference * self.train_min_factor
                    && average <= reference * self.train_max_factor
            }
            Mode::Bus => (self.bus_min_minutes..=self.bus_max_minutes).contains(&average_minutes),
        }
    }
}

/// Known point-to-point travel time in minutes, if there is one.
///
/// The 371 times differ by direction.
pub fn static_minutes(line: &str, from: &str, to: &str) -> Option<i64> {
    match (line, from, to) {
        (LINE_S4, _, _) => Some(TRAIN_STATIC_MINUTES),
        (LINE_371, HUSINEC, KOBYLISY) => Some(20),
        (LINE_371, KOBYLISY, HUSINEC) => Some(22),
        _ => None,
    }
}
