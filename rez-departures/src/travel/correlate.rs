//! Pairing departures with arrivals by trip identity.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::domain::{
    ArrivalRecord, DepartureRecord, TravelTimeAggregate, TravelTimeSample, round_minutes,
};

/// Build one sample per departure whose trip also appears among the arrivals.
///
/// Durations are computed from delay-adjusted times. Implausible samples
/// (zero, negative or three hours and more) are dropped and logged.
/// Placeholder trip ids never correlate.
pub fn correlate(
    departures: &[DepartureRecord],
    arrivals: &[ArrivalRecord],
) -> Vec<TravelTimeSample> {
    let mut by_trip: HashMap<&str, &ArrivalRecord> = HashMap::with_capacity(arrivals.len());
    for arrival in arrivals {
        if let Some(trip) = arrival.trip_id.upstream() {
            by_trip.entry(trip).or_insert(arrival);
        }
    }

    departures
        .iter()
        .filter_map(|departure| {
            let trip = departure.trip_id.upstream()?;
            let arrival = by_trip.get(trip)?;

            let departure_time = departure.actual_time();
            let arrival_time = arrival.actual_time();
            let sample = TravelTimeSample {
                trip_id: departure.trip_id.clone(),
                line: departure.line.clone(),
                mode: departure.mode,
                duration_minutes: round_minutes(arrival_time - departure_time),
                departure_time,
                arrival_time,
                delay_minutes: departure.delay_minutes,
            };

            if !sample.is_plausible() {
                warn!(
                    trip,
                    line = %sample.line,
                    duration = sample.duration_minutes,
                    "discarding implausible travel time"
                );
                return None;
            }
            Some(sample)
        })
        .collect()
}

/// One aggregate per line, in order of each line's first sample.
pub fn aggregate_by_line(
    samples: &[TravelTimeSample],
    computed_at: DateTime<Utc>,
) -> Vec<TravelTimeAggregate> {
    let mut groups: Vec<(&str, Vec<TravelTimeSample>)> = Vec::new();
    for sample in samples {
        match groups.iter().position(|(line, _)| *line == sample.line) {
            Some(i) => groups[i].1.push(sample.clone()),
            None => groups.push((sample.line.as_str(), vec![sample.clone()])),
        }
    }

    groups
        .iter()
        .filter_map(|(_, group)| TravelTimeAggregate::from_samples(group, computed_at))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BoardRecord, Mode, TripId};
    use chrono::{Duration, TimeZone};

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, hour, minute, 0).unwrap()
    }

    fn record(trip: TripId, line: &str, time: DateTime<Utc>, delay: Option<u32>) -> BoardRecord {
        BoardRecord {
            id: trip.to_string(),
            line: line.into(),
            mode: if line == "S4" { Mode::Train } else { Mode::Bus },
            direction: "Praha Masarykovo n.".into(),
            scheduled_time: time,
            predicted_time: None,
            delay_minutes: delay,
            platform: None,
            route_id: line.into(),
            trip_id: trip,
        }
    }

    fn trip(id: &str) -> TripId {
        TripId::Upstream(id.into())
    }

    #[test]
    fn duration_uses_delay_adjusted_times() {
        let departures = [record(trip("t1"), "S4", at(10, 0), Some(5))];
        let arrivals = [record(trip("t1"), "S4", at(10, 23), Some(0))];

        let samples = correlate(&departures, &arrivals);

        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].duration_minutes, 18);
        assert_eq!(samples[0].departure_time, at(10, 5));
        assert_eq!(samples[0].arrival_time, at(10, 23));
        assert_eq!(samples[0].delay_minutes, Some(5));
    }

    #[test]
    fn unmatched_trips_are_ignored() {
        let departures = [
            record(trip("t1"), "S4", at(10, 0), None),
            record(trip("t2"), "S4", at(10, 30), None),
        ];
        let arrivals = [record(trip("t2"), "S4", at(10, 48), None)];

        let samples = correlate(&departures, &arrivals);

        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].trip_id, trip("t2"));
    }

    #[test]
    fn synthetic_ids_never_correlate() {
        let departures = [record(TripId::Synthetic(1), "S4", at(10, 0), None)];
        let arrivals = [record(TripId::Synthetic(1), "S4", at(10, 18), None)];

        assert!(correlate(&departures, &arrivals).is_empty());
    }

    #[test]
    fn implausible_durations_are_dropped() {
        let departures = [
            record(trip("backwards"), "S4", at(10, 0), None),
            record(trip("same"), "S4", at(10, 0), None),
            record(trip("slow"), "S4", at(10, 0), None),
            record(trip("ok"), "S4", at(10, 0), None),
        ];
        let arrivals = [
            record(trip("backwards"), "S4", at(9, 50), None),
            record(trip("same"), "S4", at(10, 0), None),
            record(trip("slow"), "S4", at(13, 0), None),
            record(trip("ok"), "S4", at(10, 19), None),
        ];

        let samples = correlate(&departures, &arrivals);

        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].trip_id, trip("ok"));
    }

    #[test]
    fn aggregates_group_by_line() {
        let departures = [
            record(trip("a"), "S4", at(10, 0), None),
            record(trip("b"), "371", at(10, 0), None),
            record(trip("c"), "S4", at(10, 30), None),
        ];
        let arrivals = [
            record(trip("a"), "S4", at(10, 17), None),
            record(trip("b"), "371", at(10, 20), None),
            record(trip("c"), "S4", at(10, 50), None),
        ];

        let samples = correlate(&departures, &arrivals);
        let aggregates = aggregate_by_line(&samples, at(11, 0));

        assert_eq!(aggregates.len(), 2);
        assert_eq!(aggregates[0].line, "S4");
        assert_eq!(aggregates[0].sample_count, 2);
        // (17 + 20) / 2 = 18.5
        assert_eq!(aggregates[0].average_duration_minutes, 19);
        assert_eq!(aggregates[1].line, "371");
        assert_eq!(aggregates[1].average_duration_minutes, 20);
    }

    #[test]
    fn no_samples_no_aggregates() {
        assert!(aggregate_by_line(&[], at(10, 0)).is_empty());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn samples_are_always_plausible(
                offsets in prop::collection::vec((-60i64..400, 0u32..30, 0u32..30), 0..30)
            ) {
                let base = at(8, 0);
                let mut departures = Vec::new();
                let mut arrivals = Vec::new();
                for (i, (offset, dep_delay, arr_delay)) in offsets.iter().enumerate() {
                    let id = trip(&format!("t{i}"));
                    departures.push(record(id.clone(), "S4", base, Some(*dep_delay)));
                    arrivals.push(record(id, "S4", base + Duration::minutes(*offset), Some(*arr_delay)));
                }

                for sample in correlate(&departures, &arrivals) {
                    prop_assert!(sample.duration_minutes > 0);
                    prop_assert!(sample.duration_minutes < 180);
                }
            }

            #[test]
            fn aggregate_average_is_rounded_mean(
                durations in prop::collection::vec(1i64..180, 1..40)
            ) {
                let base = at(8, 0);
                let departures: Vec<_> = (0..durations.len())
                    .map(|i| record(trip(&format!("t{i}")), "S4", base, None))
                    .collect();
                let arrivals: Vec<_> = durations
                    .iter()
                    .enumerate()
                    .map(|(i, d)| record(trip(&format!("t{i}")), "S4", base + Duration::minutes(*d), None))
                    .collect();

                let samples = correlate(&departures, &arrivals);
                let aggregates = aggregate_by_line(&samples, base);
                prop_assert_eq!(aggregates.len(), 1);

                let mean = durations.iter().sum::<i64>() as f64 / durations.len() as f64;
                prop_assert_eq!(aggregates[0].average_duration_minutes, mean.round() as i64);
                prop_assert_eq!(aggregates[0].sample_count, durations.len());
                prop_assert_eq!(aggregates[0].min_duration_minutes, *durations.iter().min().unwrap());
                prop_assert_eq!(aggregates[0].max_duration_minutes, *durations.iter().max().unwrap());
            }
        }
    }
}
