//! Conversion from Golemio DTOs to board records.
//!
//! Normalisation is lenient: missing strings become `"N/A"`, missing delay
//! and platform become `None`. Only an entry without any parseable timestamp
//! is rejected, since a record without a time is useless on a board.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::domain::{BoardKind, BoardRecord, Mode, TripId};

use super::types::{BoardEntry, DepartureBoard, Timestamps};

/// Placeholder for missing string fields.
pub const NOT_AVAILABLE: &str = "N/A";

/// Error during DTO to record conversion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    /// Neither the scheduled nor the predicted timestamp is present
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Timestamp present but not RFC 3339
    #[error("invalid timestamp: {0}")]
    InvalidTime(String),
}

/// Hands out placeholder trip ids for records upstream sent without one.
///
/// Ids are strictly increasing for the lifetime of the generator, so two
/// unrelated records can never share a placeholder.
#[derive(Debug, Default)]
pub struct TripIdGenerator {
    next: AtomicU64,
}

impl TripIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> TripId {
        TripId::Synthetic(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// Convert every usable entry on a board, skipping (and logging) the rest.
///
/// Upstream order is preserved.
pub fn convert_board(
    board: &DepartureBoard,
    kind: BoardKind,
    ids: &TripIdGenerator,
) -> Vec<BoardRecord> {
    board
        .departures
        .iter()
        .filter_map(|entry| match convert_entry(entry, kind, ids) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(
                    trip = entry.trip_id().unwrap_or(NOT_AVAILABLE),
                    line = entry.route_short_name().unwrap_or(NOT_AVAILABLE),
                    error = %e,
                    "skipping board entry"
                );
                None
            }
        })
        .collect()
}

/// Convert a single board entry.
///
/// Departure boards read the departure timestamp and arrival boards the
/// arrival timestamp, each falling back to the other when missing (first
/// and last stops of a trip only carry one of them).
pub fn convert_entry(
    entry: &BoardEntry,
    kind: BoardKind,
    ids: &TripIdGenerator,
) -> Result<BoardRecord, ConversionError> {
    let (primary, secondary) = match kind {
        BoardKind::Departures => (&entry.departure_timestamp, &entry.arrival_timestamp),
        BoardKind::Arrivals => (&entry.arrival_timestamp, &entry.departure_timestamp),
    };
    let timestamps = primary
        .as_ref()
        .filter(|t| has_time(t))
        .or_else(|| secondary.as_ref().filter(|t| has_time(t)))
        .ok_or(ConversionError::MissingField("timestamp"))?;

    let scheduled = timestamps
        .scheduled
        .as_deref()
        .or(timestamps.predicted.as_deref())
        .ok_or(ConversionError::MissingField("timestamp"))?;
    let scheduled_time = parse_timestamp(scheduled)?;

    // A malformed prediction shouldn't throw away an otherwise good record.
    let predicted_time = timestamps
        .predicted
        .as_deref()
        .and_then(|p| parse_timestamp(p).ok());

    let line = entry
        .route_short_name()
        .unwrap_or(NOT_AVAILABLE)
        .to_string();
    let mode = Mode::from_route_type(entry.route.as_ref().and_then(|r| r.route_type));

    let trip_id = match entry.trip_id() {
        Some(id) => TripId::Upstream(id.to_string()),
        None => ids.next_id(),
    };

    let platform = entry
        .stop
        .as_ref()
        .and_then(|s| s.platform_code.as_deref())
        .filter(|p| !p.is_empty())
        .map(str::to_string);

    let direction = match entry.headsign() {
        "" => NOT_AVAILABLE.to_string(),
        headsign => headsign.to_string(),
    };

    Ok(BoardRecord {
        id: trip_id.to_string(),
        route_id: line.clone(),
        line,
        mode,
        direction,
        scheduled_time,
        predicted_time,
        delay_minutes: delay_minutes(entry),
        platform,
        trip_id,
    })
}

fn has_time(t: &Timestamps) -> bool {
    t.scheduled.is_some() || t.predicted.is_some()
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, ConversionError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| ConversionError::InvalidTime(s.to_string()))
}

/// Reported delay, `None` when the vehicle isn't tracked. Early running counts as on time.
fn delay_minutes(entry: &BoardEntry) -> Option<u32> {
    let delay = entry.delay.as_ref()?;
    if delay.is_available == Some(false) {
        return None;
    }
    let minutes = delay.minutes?;
    Some(u32::try_from(minutes.max(0)).unwrap_or(u32::MAX))
}
