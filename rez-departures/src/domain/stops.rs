//! Fixed stops and lines of the Řež commuter routes.
//!
//! Stop ids are PID platform-level ids as used by the departure board API.

use super::error::DomainError;
use super::record::Mode;

/// Řež station (train S4).
pub const REZ: &str = "U2823Z301";

/// Praha Masarykovo nádraží (train S4).
pub const MASARYKOVO: &str = "U480Z301";

/// Husinec, rozcestí, stand B (bus 371).
pub const HUSINEC: &str = "U2245Z2";

/// Praha Kobylisy, stand J (bus 371).
pub const KOBYLISY: &str = "U675Z12";

/// Train line between Řež and Masarykovo.
pub const LINE_S4: &str = "S4";

/// Bus line between Husinec and Kobylisy.
pub const LINE_371: &str = "371";

/// Human-readable name of one of the fixed stops.
pub fn stop_name(stop_id: &str) -> Option<&'static str> {
    match stop_id {
        REZ => Some("Řež"),
        MASARYKOVO => Some("Praha Masarykovo nádraží"),
        HUSINEC => Some("Husinec, rozc."),
        KOBYLISY => Some("Praha Kobylisy"),
        _ => None,
    }
}

/// Mode of transport for a line served by the dashboard.
pub fn mode_for_line(line: &str) -> Result<Mode, DomainError> {
    match line {
        LINE_S4 => Ok(Mode::Train),
        LINE_371 => Ok(Mode::Bus),
        other => Err(DomainError::UnknownLine(other.to_string())),
    }
}
