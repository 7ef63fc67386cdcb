//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::domain::{Direction, Mode, mode_for_line, stop_name, stop_pair};
use crate::travel::TravelTimeEstimate;

use super::routes::AppError;

/// Query for a single travel-time estimate.
#[derive(Debug, Deserialize)]
pub struct TravelTimeQuery {
    /// Line short name ("S4" or "371")
    pub line: String,

    /// Canonical direction token, e.g. "to-rez"
    pub direction: String,
}

impl TravelTimeQuery {
    /// Validate the line and direction.
    pub fn parse(&self) -> Result<(Mode, Direction), AppError> {
        let mode = mode_for_line(&self.line)?;
        let direction = self.direction.parse::<Direction>()?;
        Ok((mode, direction))
    }
}

/// A travel-time estimate for one route.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelTimeResponse {
    pub line: String,
    pub direction: Direction,
    pub mode: Mode,
    /// Departure stop name, when the direction belongs to the line
    pub from: Option<&'static str>,
    /// Arrival stop name, when the direction belongs to the line
    pub to: Option<&'static str>,
    /// Estimated minutes, absent when unavailable
    pub minutes: Option<i64>,
    pub estimate: TravelTimeEstimate,
}

impl TravelTimeResponse {
    pub fn new(line: &str, direction: Direction, mode: Mode, estimate: TravelTimeEstimate) -> Self {
        let stops = stop_pair(line, direction);
        Self {
            line: line.to_string(),
            direction,
            mode,
            from: stops.and_then(|(from, _)| stop_name(from)),
            to: stops.and_then(|(_, to)| stop_name(to)),
            minutes: estimate.minutes(),
            estimate,
        }
    }
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(line: &str, direction: &str) -> TravelTimeQuery {
        TravelTimeQuery {
            line: line.into(),
            direction: direction.into(),
        }
    }

    #[test]
    fn parses_valid_query() {
        assert_eq!(
            query("S4", "to-rez").parse().unwrap(),
            (Mode::Train, Direction::ToRez)
        );
        assert_eq!(
            query("371", "to-kobylisy").parse().unwrap(),
            (Mode::Bus, Direction::ToKobylisy)
        );
    }

    #[test]
    fn rejects_unknown_line() {
        assert!(matches!(
            query("S49", "to-rez").parse(),
            Err(AppError::BadRequest { .. })
        ));
    }

    #[test]
    fn rejects_unknown_direction() {
        let err = query("S4", "northbound").parse().unwrap_err();
        let AppError::BadRequest { message } = err else {
            panic!("expected bad request");
        };
        assert!(message.contains("northbound"));
    }

    #[test]
    fn response_names_stops() {
        let response = TravelTimeResponse::new(
            "S4",
            Direction::ToRez,
            Mode::Train,
            TravelTimeEstimate::Unavailable {
                reason: crate::travel::UnavailableReason::NoCorrelation,
            },
        );
        assert_eq!(response.from, Some("Praha Masarykovo nádraží"));
        assert_eq!(response.to, Some("Řež"));
        assert_eq!(response.minutes, None);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["direction"], "to-rez");
        assert_eq!(json["estimate"]["source"], "unavailable");
    }

    #[test]
    fn query_deserializes() {
        let q: TravelTimeQuery =
            serde_json::from_str(r#"{"line": "S4", "direction": "to-masarykovo"}"#).unwrap();
        assert_eq!(q.line, "S4");
        assert_eq!(q.direction, "to-masarykovo");
    }
}
