//! Travel-time samples and per-line aggregates.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::record::{Mode, TripId};

/// Durations at or above this many minutes are not plausible for these routes.
pub const MAX_PLAUSIBLE_MINUTES: i64 = 180;

/// One correlated departure/arrival pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelTimeSample {
    pub trip_id: TripId,
    pub line: String,
    pub mode: Mode,
    pub duration_minutes: i64,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub delay_minutes: Option<u32>,
}

impl TravelTimeSample {
    /// Whether the duration lies strictly between zero and [`MAX_PLAUSIBLE_MINUTES`].
    pub fn is_plausible(&self) -> bool {
        self.duration_minutes > 0 && self.duration_minutes < MAX_PLAUSIBLE_MINUTES
    }
}

/// Summary of the samples observed for one line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelTimeAggregate {
    pub line: String,
    pub mode: Mode,
    /// Arithmetic mean of the samples, rounded to the nearest minute.
    pub average_duration_minutes: i64,
    pub sample_count: usize,
    pub min_duration_minutes: i64,
    pub max_duration_minutes: i64,
    pub computed_at: DateTime<Utc>,
}

impl TravelTimeAggregate {
    /// Aggregate samples of a single line. Returns `None` for no samples.
    ///
    /// Line and mode are taken from the first sample.
    pub fn from_samples(samples: &[TravelTimeSample], computed_at: DateTime<Utc>) -> Option<Self> {
        let first = samples.first()?;

        let total: i64 = samples.iter().map(|s| s.duration_minutes).sum();
        let average = (total as f64 / samples.len() as f64).round() as i64;
        let min = samples.iter().map(|s| s.duration_minutes).min()?;
        let max = samples.iter().map(|s| s.duration_minutes).max()?;

        Some(Self {
            line: first.line.clone(),
            mode: first.mode,
            average_duration_minutes: average,
            sample_count: samples.len(),
            min_duration_minutes: min,
            max_duration_minutes: max,
            computed_at,
        })
    }

    /// Single-sample aggregate from a known constant.
    pub fn constant(line: &str, mode: Mode, minutes: i64, computed_at: DateTime<Utc>) -> Self {
        Self {
            line: line.to_string(),
            mode,
            average_duration_minutes: minutes,
            sample_count: 1,
            min_duration_minutes: minutes,
            max_duration_minutes: minutes,
            computed_at,
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    proptest! {
        /// The average is the rounded mean and the count matches.
        #[test]
        fn average_is_rounded_mean(durations in proptest::collection::vec(1i64..180, 1..40)) {
            let departure = Utc.with_ymd_and_hms(2025, 3, 14, 10, 0, 0).unwrap();
            let samples: Vec<_> = durations
                .iter()
                .enumerate()
                .map(|(i, &d)| TravelTimeSample {
                    trip_id: TripId::Upstream(i.to_string()),
                    line: "371".into(),
                    mode: Mode::Bus,
                    duration_minutes: d,
                    departure_time: departure,
                    arrival_time: departure + chrono::Duration::minutes(d),
                    delay_minutes: None,
                })
                .collect();

            let agg = TravelTimeAggregate::from_samples(&samples, departure).unwrap();
            let mean = durations.iter().sum::<i64>() as f64 / durations.len() as f64;

            prop_assert_eq!(agg.average_duration_minutes, mean.round() as i64);
            prop_assert_eq!(agg.sample_count, durations.len());
            prop_assert!(agg.min_duration_minutes <= agg.average_duration_minutes);
            prop_assert!(agg.average_duration_minutes <= agg.max_duration_minutes);
        }
    }
}
