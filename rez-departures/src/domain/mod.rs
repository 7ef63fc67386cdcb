//! Domain types for the Řež commuter departure boards.
//!
//! Records are plain immutable values built fresh from every poll. The
//! direction classifier and stop table are pure lookups with no hidden state.

mod direction;
mod error;
mod record;
mod stops;
mod travel;

pub use direction::{Direction, classify, stop_pair};
pub use error::DomainError;
pub use record::{
    ArrivalRecord, BoardKind, BoardRecord, DepartureRecord, Mode, TripId,
    minutes_until_next_departure, round_minutes,
};
pub use stops::{
    HUSINEC, KOBYLISY, LINE_371, LINE_S4, MASARYKOVO, REZ, mode_for_line, stop_name,
};
pub use travel::{MAX_PLAUSIBLE_MINUTES, TravelTimeAggregate, TravelTimeSample};
