//! Golemio PID (Prague Integrated Transport) open-data client.
//!
//! The board fetcher only sees the [`Transport`] contract. The live stack is
//! a [`PidClient`] wrapped in a [`RetryingTransport`]; tests and offline
//! development use [`MockTransport`].
//!
//! Key characteristics of the departure board endpoint:
//! - Timestamps are ISO 8601 with a local offset
//! - Trip ids are stable across stops for one run on one day, but are
//!   occasionally missing
//! - Arrival boards use the same JSON shape as departure boards

mod client;
mod convert;
mod error;
mod mock;
mod retry;
mod transport;
mod types;

pub use client::{PidClient, PidConfig};
pub use convert::{ConversionError, NOT_AVAILABLE, TripIdGenerator, convert_board, convert_entry};
pub use error::TransportError;
pub use mock::{DemoTransport, MockEntry, MockTransport, board};
pub use retry::{RetryPolicy, RetryingTransport};
pub use transport::{RawResponse, Transport};
pub use types::{BoardEntry, Delay, DepartureBoard, Route, StopInfo, Timestamps, Trip};

/// Path of the departure board endpoint, relative to the API base URL.
pub const DEPARTURE_BOARDS_PATH: &str = "/pid/departureboards";
