//! Mock transport for development and tests without API access.
//!
//! Serves canned Golemio board JSON per stop and board kind, as if it came
//! from the live API, and counts the requests it receives.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde_json::{Value, json};

use crate::domain::{BoardKind, HUSINEC, KOBYLISY, LINE_371, LINE_S4, MASARYKOVO, Mode, REZ};

use super::error::TransportError;
use super::transport::{RawResponse, Transport};

type Key = (String, BoardKind);

/// Canned outcome for one (stop, board kind).
#[derive(Debug, Clone)]
enum Canned {
    Body(String),
    Fail(TransportError),
}

/// Transport that answers board requests from memory.
///
/// Requests for a stop with nothing registered fail with HTTP 404, like an
/// unknown stop id upstream.
#[derive(Debug, Default)]
pub struct MockTransport {
    boards: HashMap<Key, Canned>,
    calls: Mutex<Vec<Key>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `kind` requests at `stop`.
    pub fn with_board(mut self, stop: &str, kind: BoardKind, body: impl Into<String>) -> Self {
        self.boards
            .insert((stop.to_string(), kind), Canned::Body(body.into()));
        self
    }

    /// Serve a board built from `entries`.
    pub fn with_entries(self, stop: &str, kind: BoardKind, entries: &[MockEntry]) -> Self {
        self.with_board(stop, kind, board(entries))
    }

    /// Fail every `kind` request at `stop` with `error`.
    pub fn with_failure(mut self, stop: &str, kind: BoardKind, error: TransportError) -> Self {
        self.boards
            .insert((stop.to_string(), kind), Canned::Fail(error));
        self
    }

    /// Plausible boards for all four dashboard stops, starting shortly after `now`.
    ///
    /// Departures leave at +5, +25 and +45 minutes; the matching arrivals are
    /// served at the far stop of each route so travel times correlate.
    pub fn demo(now: DateTime<Utc>) -> Self {
        let routes = [
            (REZ, MASARYKOVO, LINE_S4, Mode::Train, "Praha Masarykovo n.", 18),
            (MASARYKOVO, REZ, LINE_S4, Mode::Train, "Kralupy nad Vltavou", 18),
            (HUSINEC, KOBYLISY, LINE_371, Mode::Bus, "Praha Kobylisy", 20),
            (KOBYLISY, HUSINEC, LINE_371, Mode::Bus, "Husinec,Řež", 22),
        ];

        let mut departures: HashMap<&str, Vec<MockEntry>> = HashMap::new();
        let mut arrivals: HashMap<&str, Vec<MockEntry>> = HashMap::new();

        for (from, to, line, mode, headsign, minutes) in routes {
            for i in 0..3 {
                let trip = format!("demo_{line}_{from}_{i}");
                let at = now + Duration::minutes(i * 20 + 5);
                let delay = if i == 0 { 2 } else { 0 };

                departures.entry(from).or_default().push(
                    MockEntry::new(line, mode, headsign, at)
                        .trip(&trip)
                        .delay(delay),
                );
                arrivals.entry(to).or_default().push(
                    MockEntry::new(line, mode, headsign, at + Duration::minutes(minutes))
                        .trip(&trip)
                        .delay(delay),
                );
            }
        }

        let mut mock = Self::new();
        for (stop, entries) in &departures {
            mock = mock.with_entries(stop, BoardKind::Departures, entries);
        }
        for (stop, entries) in &arrivals {
            mock = mock.with_entries(stop, BoardKind::Arrivals, entries);
        }
        mock
    }

    /// Total requests received.
    pub fn call_count(&self) -> usize {
        self.calls.lock().map_or(0, |calls| calls.len())
    }

    /// Requests received for one stop and board kind.
    pub fn calls_for(&self, stop: &str, kind: BoardKind) -> usize {
        self.calls.lock().map_or(0, |calls| {
            calls
                .iter()
                .filter(|(s, k)| s == stop && *k == kind)
                .count()
        })
    }
}

impl Transport for MockTransport {
    async fn request(
        &self,
        _path: &str,
        query: &[(&str, String)],
    ) -> Result<RawResponse, TransportError> {
        let param = |name: &str| {
            query
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.as_str())
        };

        let stop = param("ids[]").unwrap_or_default().to_string();
        let kind = match param("mode") {
            Some("arrivals") => BoardKind::Arrivals,
            _ => BoardKind::Departures,
        };

        if let Ok(mut calls) = self.calls.lock() {
            calls.push((stop.clone(), kind));
        }

        match self.boards.get(&(stop.clone(), kind)) {
            Some(Canned::Body(body)) => Ok(RawResponse {
                status: 200,
                body: body.clone(),
            }),
            Some(Canned::Fail(e)) => Err(e.clone()),
            None => Err(TransportError::Http {
                status: 404,
                message: format!("no mock {kind} board for stop {stop}"),
            }),
        }
    }
}

/// Demo boards that stay current.
///
/// Every request is answered from [`MockTransport::demo`] built at the time
/// of the request, so departures never drift into the past.
#[derive(Debug, Default, Clone, Copy)]
pub struct DemoTransport;

impl Transport for DemoTransport {
    async fn request(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<RawResponse, TransportError> {
        MockTransport::demo(Utc::now()).request(path, query).await
    }
}

/// Builder for one upstream board entry.
#[derive(Debug, Clone)]
pub struct MockEntry {
    line: String,
    mode: Mode,
    headsign: String,
    scheduled: DateTime<Utc>,
    trip_id: Option<String>,
    delay: Option<i64>,
    platform: Option<String>,
}

impl MockEntry {
    pub fn new(line: &str, mode: Mode, headsign: &str, scheduled: DateTime<Utc>) -> Self {
        Self {
            line: line.to_string(),
            mode,
            headsign: headsign.to_string(),
            scheduled,
            trip_id: Some(format!("{line}_{}", scheduled.timestamp())),
            delay: None,
            platform: None,
        }
    }

    pub fn train(headsign: &str, scheduled: DateTime<Utc>) -> Self {
        Self::new(LINE_S4, Mode::Train, headsign, scheduled)
    }

    pub fn bus(headsign: &str, scheduled: DateTime<Utc>) -> Self {
        Self::new(LINE_371, Mode::Bus, headsign, scheduled)
    }

    pub fn trip(mut self, id: &str) -> Self {
        self.trip_id = Some(id.to_string());
        self
    }

    /// Drop the trip id, as upstream occasionally does.
    pub fn without_trip(mut self) -> Self {
        self.trip_id = None;
        self
    }

    pub fn delay(mut self, minutes: i64) -> Self {
        self.delay = Some(minutes);
        self
    }

    pub fn platform(mut self, platform: &str) -> Self {
        self.platform = Some(platform.to_string());
        self
    }

    fn to_json(&self) -> Value {
        let route_type = match self.mode {
            Mode::Train => Mode::RAIL_ROUTE_TYPE,
            Mode::Bus => 3,
        };
        let timestamp = json!({ "scheduled": self.scheduled.to_rfc3339() });

        let mut trip = json!({ "headsign": self.headsign, "is_canceled": false });
        if let Some(id) = &self.trip_id {
            trip["id"] = json!(id);
        }

        json!({
            "arrival_timestamp": timestamp.clone(),
            "departure_timestamp": timestamp,
            "delay": {
                "is_available": self.delay.is_some(),
                "minutes": self.delay.unwrap_or(0),
                "seconds": self.delay.unwrap_or(0) * 60,
            },
            "route": { "short_name": self.line, "type": route_type },
            "stop": { "platform_code": self.platform },
            "trip": trip,
        })
    }
}

/// Serialise entries as a Golemio departure board body.
pub fn board(entries: &[MockEntry]) -> String {
    let departures: Vec<Value> = entries.iter().map(MockEntry::to_json).collect();
    json!({ "departures": departures, "stops": [], "infotexts": [] }).to_string()
}
