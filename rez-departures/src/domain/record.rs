//! Normalised departure and arrival records.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Serialize, Serializer};

/// Mode of transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Train,
    Bus,
}

impl Mode {
    /// GTFS route type for rail services.
    pub const RAIL_ROUTE_TYPE: u32 = 2;

    /// Classify an upstream GTFS route type. Anything that isn't rail runs on the road.
    pub fn from_route_type(route_type: Option<u32>) -> Self {
        match route_type {
            Some(Self::RAIL_ROUTE_TYPE) => Mode::Train,
            _ => Mode::Bus,
        }
    }

    /// Typical headway in minutes, used to guess the next departure past the end of a board.
    pub fn headway_minutes(self) -> i64 {
        match self {
            Mode::Train => 30,
            Mode::Bus => 20,
        }
    }
}

/// Which side of a stop's board to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardKind {
    Departures,
    Arrivals,
}

impl BoardKind {
    /// Value of the upstream `mode` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            BoardKind::Departures => "departures",
            BoardKind::Arrivals => "arrivals",
        }
    }
}

impl fmt::Display for BoardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of one vehicle run.
///
/// Upstream trip ids are stable across stops for the same day and are the
/// only correlation key between a departure at one stop and an arrival at
/// another. Records without an upstream id get a synthetic one, which never
/// correlates with anything.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TripId {
    Upstream(String),
    Synthetic(u64),
}

impl TripId {
    pub fn is_synthetic(&self) -> bool {
        matches!(self, TripId::Synthetic(_))
    }

    /// The upstream id, if this trip has one.
    pub fn upstream(&self) -> Option<&str> {
        match self {
            TripId::Upstream(id) => Some(id),
            TripId::Synthetic(_) => None,
        }
    }
}

impl fmt::Display for TripId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TripId::Upstream(id) => f.write_str(id),
            TripId::Synthetic(n) => write!(f, "synthetic-{n}"),
        }
    }
}

impl Serialize for TripId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One scheduled departure or arrival at a stop.
///
/// Created fresh from upstream data on every poll and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardRecord {
    pub id: String,
    pub line: String,
    pub mode: Mode,
    /// Raw headsign as shown to passengers.
    pub direction: String,
    pub scheduled_time: DateTime<Utc>,
    pub predicted_time: Option<DateTime<Utc>>,
    /// `None` means on time or unknown.
    pub delay_minutes: Option<u32>,
    pub platform: Option<String>,
    pub route_id: String,
    pub trip_id: TripId,
}

/// A record from a departure board.
pub type DepartureRecord = BoardRecord;

/// A record from an arrival board. Same shape, same trip correlation key.
pub type ArrivalRecord = BoardRecord;

impl BoardRecord {
    /// Scheduled time shifted by the reported delay.
    pub fn actual_time(&self) -> DateTime<Utc> {
        let delay = self.delay_minutes.unwrap_or(0);
        self.scheduled_time + Duration::minutes(i64::from(delay))
    }

    /// Expected arrival at the far end of a trip taking `travel_minutes`.
    pub fn arrival_after(&self, travel_minutes: i64) -> DateTime<Utc> {
        self.actual_time() + Duration::minutes(travel_minutes)
    }

    /// Whole minutes from `now` until the actual time (negative once gone).
    pub fn minutes_until(&self, now: DateTime<Utc>) -> i64 {
        round_minutes(self.actual_time() - now)
    }
}

/// Round a duration to the nearest whole minute.
pub fn round_minutes(delta: Duration) -> i64 {
    (delta.num_milliseconds() as f64 / 60_000.0).round() as i64
}

/// Minutes until the next departure on a board that hasn't left yet.
///
/// If everything on the board has already gone, guesses from the last
/// scheduled departure plus the mode's headway. Returns `None` for an
/// empty board.
pub fn minutes_until_next_departure(records: &[BoardRecord], now: DateTime<Utc>) -> Option<i64> {
    if let Some(minutes) = records
        .iter()
        .map(|r| r.minutes_until(now))
        .find(|&minutes| minutes > 0)
    {
        return Some(minutes);
    }

    let last = records.last()?;
    let next = last.scheduled_time + Duration::minutes(last.mode.headway_minutes());
    Some(round_minutes(next - now).max(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, hour, minute, 0).unwrap()
    }

    fn record(scheduled: DateTime<Utc>, delay: Option<u32>, mode: Mode) -> BoardRecord {
        BoardRecord {
            id: "t1".into(),
            line: "S4".into(),
            mode,
            direction: "Praha Masarykovo n.".into(),
            scheduled_time: scheduled,
            predicted_time: None,
            delay_minutes: delay,
            platform: Some("1".into()),
            route_id: "S4".into(),
            trip_id: TripId::Upstream("t1".into()),
        }
    }

    #[test]
    fn route_type_classification() {
        assert_eq!(Mode::from_route_type(Some(2)), Mode::Train);
        assert_eq!(Mode::from_route_type(Some(3)), Mode::Bus);
        assert_eq!(Mode::from_route_type(None), Mode::Bus);
    }

    #[test]
    fn board_kind_query_values() {
        assert_eq!(BoardKind::Departures.as_str(), "departures");
        assert_eq!(BoardKind::Arrivals.to_string(), "arrivals");
    }

    #[test]
    fn trip_id_display_and_kind() {
        let real = TripId::Upstream("1354_1234_240101".into());
        let synthetic = TripId::Synthetic(7);

        assert_eq!(real.to_string(), "1354_1234_240101");
        assert_eq!(synthetic.to_string(), "synthetic-7");
        assert!(!real.is_synthetic());
        assert!(synthetic.is_synthetic());
        assert_eq!(real.upstream(), Some("1354_1234_240101"));
        assert_eq!(synthetic.upstream(), None);
    }

    #[test]
    fn trip_id_serializes_as_string() {
        let json = serde_json::to_string(&TripId::Synthetic(3)).unwrap();
        assert_eq!(json, r#""synthetic-3""#);
    }

    #[test]
    fn actual_time_includes_delay() {
        let r = record(at(10, 0), Some(5), Mode::Train);
        assert_eq!(r.actual_time(), at(10, 5));

        let on_time = record(at(10, 0), None, Mode::Train);
        assert_eq!(on_time.actual_time(), at(10, 0));
    }

    #[test]
    fn arrival_after_travel_time() {
        let r = record(at(10, 0), Some(2), Mode::Train);
        assert_eq!(r.arrival_after(18), at(10, 20));
    }

    #[test]
    fn record_serializes_camel_case() {
        let json = serde_json::to_value(record(at(10, 0), Some(1), Mode::Bus)).unwrap();
        assert_eq!(json["delayMinutes"], 1);
        assert_eq!(json["mode"], "bus");
        assert_eq!(json["tripId"], "t1");
        assert!(json.get("scheduledTime").is_some());
    }

    #[test]
    fn next_departure_skips_departed() {
        let board = vec![
            record(at(9, 50), None, Mode::Train),
            record(at(10, 10), Some(2), Mode::Train),
        ];
        assert_eq!(minutes_until_next_departure(&board, at(10, 0)), Some(12));
    }

    #[test]
    fn next_departure_guesses_from_headway() {
        let board = vec![record(at(9, 40), None, Mode::Bus)];
        // 9:40 + 20 min headway = 10:00
        assert_eq!(minutes_until_next_departure(&board, at(9, 50)), Some(10));
        assert_eq!(minutes_until_next_departure(&board, at(10, 30)), Some(0));
    }

    #[test]
    fn next_departure_empty_board() {
        assert_eq!(minutes_until_next_departure(&[], at(10, 0)), None);
    }
}
