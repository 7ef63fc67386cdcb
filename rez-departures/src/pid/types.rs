//! Golemio departure board response DTOs.
//!
//! Only the fields the boards need are modelled. Everything is optional
//! because upstream omits fields rather than sending nulls.

use serde::Deserialize;

/// Response from `GET /pid/departureboards`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DepartureBoard {
    /// Departures or arrivals, depending on the requested mode.
    #[serde(default)]
    pub departures: Vec<BoardEntry>,
}

/// One row of a departure or arrival board.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BoardEntry {
    pub arrival_timestamp: Option<Timestamps>,
    pub departure_timestamp: Option<Timestamps>,
    pub delay: Option<Delay>,
    pub route: Option<Route>,
    pub stop: Option<StopInfo>,
    pub trip: Option<Trip>,
}

impl BoardEntry {
    /// Route short name (line), e.g. "S4" or "371".
    pub fn route_short_name(&self) -> Option<&str> {
        self.route.as_ref()?.short_name.as_deref()
    }

    /// Passenger-facing headsign, empty when missing.
    pub fn headsign(&self) -> &str {
        self.trip
            .as_ref()
            .and_then(|t| t.headsign.as_deref())
            .unwrap_or("")
    }

    pub fn trip_id(&self) -> Option<&str> {
        self.trip
            .as_ref()?
            .id
            .as_deref()
            .filter(|id| !id.is_empty())
    }
}

/// Scheduled and predicted ISO 8601 timestamps.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Timestamps {
    pub scheduled: Option<String>,
    pub predicted: Option<String>,
}

/// Real-time delay information.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Delay {
    /// False when the vehicle isn't reporting position.
    pub is_available: Option<bool>,
    pub minutes: Option<i64>,
}

/// Route the vehicle runs on.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Route {
    pub short_name: Option<String>,
    /// GTFS route type (2 = rail, 3 = bus).
    #[serde(rename = "type")]
    pub route_type: Option<u32>,
}

/// Stop the board row refers to.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StopInfo {
    pub platform_code: Option<String>,
}

/// Trip (vehicle run) the row belongs to.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Trip {
    pub id: Option<String>,
    pub headsign: Option<String>,
}
