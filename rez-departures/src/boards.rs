//! Board fetcher: cached, filtered departure and arrival boards.
//!
//! Upstream returns every line at a stop in both directions, so each request
//! over-fetches a large raw page and filters locally. The filtered, normalised
//! list is cached per (stop, line, direction, board kind) and truncated per
//! call, so requests differing only in `limit` share one cache entry.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::cache::{CacheConfig, CacheStats, Clock, SystemClock, TtlCache};
use crate::domain::{BoardKind, BoardRecord, Direction, classify};
use crate::pid::{
    BoardEntry, DEPARTURE_BOARDS_PATH, DepartureBoard, Transport, TransportError, TripIdGenerator,
    convert_board,
};

/// Placeholder message for a board whose fetch failed.
pub const FETCH_FAILED: &str = "fetch failed";

/// Message for a board that loaded but had nothing matching.
pub const NO_DEPARTURES: &str = "no departures";

/// Configuration for the board fetcher.
#[derive(Debug, Clone)]
pub struct BoardConfig {
    /// Raw entries requested from upstream before filtering.
    pub raw_limit: u32,

    /// Look-ahead window in minutes.
    pub minutes_after: u32,

    /// How long a filtered board stays cached. Short, since delays change often.
    pub ttl: Duration,

    /// Maximum number of cached boards.
    pub max_entries: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            raw_limit: 50,
            minutes_after: 240,
            ttl: Duration::from_secs(30),
            max_entries: 200,
        }
    }
}

impl BoardConfig {
    fn cache_config(&self) -> CacheConfig {
        CacheConfig::new(self.max_entries, self.ttl)
    }
}

/// Errors from fetching a board.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    /// The request itself failed (after any retries)
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Upstream answered with something that isn't a departure board
    #[error("invalid board JSON: {message}")]
    Json { message: String, body: String },
}

/// Which board to fetch and how to filter it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoardRequest {
    pub stop_id: String,
    /// Keep only this route short name. `None` keeps every line.
    pub line: Option<String>,
    pub kind: BoardKind,
    /// Maximum records returned after filtering.
    pub limit: usize,
    /// Keep only records classified into this direction.
    pub direction: Option<Direction>,
}

impl BoardRequest {
    pub fn new(stop_id: impl Into<String>, kind: BoardKind) -> Self {
        Self {
            stop_id: stop_id.into(),
            line: None,
            kind,
            limit: 3,
            direction: None,
        }
    }

    pub fn departures(stop_id: impl Into<String>) -> Self {
        Self::new(stop_id, BoardKind::Departures)
    }

    pub fn arrivals(stop_id: impl Into<String>) -> Self {
        Self::new(stop_id, BoardKind::Arrivals)
    }

    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.line = Some(line.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    fn cache_key(&self) -> BoardKey {
        BoardKey {
            stop_id: self.stop_id.clone(),
            line: self.line.clone(),
            direction: self.direction,
            kind: self.kind,
        }
    }
}

/// Cache key: everything that affects filtering, but not the limit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoardKey {
    pub stop_id: String,
    pub line: Option<String>,
    pub direction: Option<Direction>,
    pub kind: BoardKind,
}

/// A fetched board.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct BoardResult {
    pub records: Vec<BoardRecord>,
    pub message: String,
    /// Served from cache without an upstream call.
    pub cached: bool,
}

impl BoardResult {
    fn new(records: Vec<BoardRecord>, cached: bool) -> Self {
        let message = if records.is_empty() {
            NO_DEPARTURES.to_string()
        } else {
            format!("loaded {} records", records.len())
        };
        Self {
            records,
            message,
            cached,
        }
    }

    /// Empty placeholder standing in for a board that couldn't be fetched.
    pub fn failed() -> Self {
        Self {
            records: Vec::new(),
            message: FETCH_FAILED.to_string(),
            cached: false,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.records.is_empty() && self.message == FETCH_FAILED
    }
}

/// Whether an entry runs on `line` (any line when `None`).
pub fn matches_line(entry: &BoardEntry, line: Option<&str>) -> bool {
    line.is_none_or(|line| entry.route_short_name() == Some(line))
}

/// Whether an entry heads in `direction` (any direction when `None`).
///
/// Unclassifiable headsigns fail an explicit direction filter.
pub fn matches_direction(entry: &BoardEntry, direction: Option<Direction>) -> bool {
    let Some(direction) = direction else {
        return true;
    };
    let line = entry.route_short_name().unwrap_or_default();
    classify(entry.headsign(), line) == Some(direction)
}

/// Apply the line filter then the direction filter, preserving upstream order.
pub fn filter_entries<'a>(
    entries: &'a [BoardEntry],
    line: Option<&'a str>,
    direction: Option<Direction>,
) -> impl Iterator<Item = &'a BoardEntry> + 'a {
    entries
        .iter()
        .filter(move |e| matches_line(e, line))
        .filter(move |e| matches_direction(e, direction))
}

/// Fetches boards through a [`Transport`], with caching.
///
/// Owns its board cache exclusively.
pub struct BoardFetcher<T> {
    transport: T,
    cache: Arc<TtlCache<BoardKey, Arc<Vec<BoardRecord>>>>,
    trip_ids: TripIdGenerator,
    config: BoardConfig,
}

impl<T: Transport> BoardFetcher<T> {
    pub fn new(transport: T, config: BoardConfig) -> Self {
        Self::with_clock(transport, config, Arc::new(SystemClock))
    }

    /// Create a fetcher whose cache runs on the given clock.
    pub fn with_clock(transport: T, config: BoardConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            transport,
            cache: Arc::new(TtlCache::with_clock(config.cache_config(), clock)),
            trip_ids: TripIdGenerator::new(),
            config,
        }
    }

    /// Fetch one board, from cache when fresh.
    ///
    /// An empty result is not an error: it means nothing matched. Transport
    /// and decoding failures are returned whole, never as a partial board.
    pub async fn fetch_board(&self, request: &BoardRequest) -> Result<BoardResult, BoardError> {
        let key = request.cache_key();

        if let Some(cached) = self.cache.get(&key) {
            debug!(
                stop = %request.stop_id,
                kind = %request.kind,
                "board cache hit"
            );
            return Ok(BoardResult::new(truncate(&cached, request.limit), true));
        }

        info!(
            stop = %request.stop_id,
            line = request.line.as_deref().unwrap_or("*"),
            direction = request.direction.map_or("*", Direction::as_str),
            kind = %request.kind,
            "fetching board from upstream"
        );

        let query = [
            ("ids[]", request.stop_id.clone()),
            ("limit", self.config.raw_limit.to_string()),
            ("minutesAfter", self.config.minutes_after.to_string()),
            ("mode", request.kind.as_str().to_string()),
            ("order", "real".to_string()),
        ];
        let response = self.transport.request(DEPARTURE_BOARDS_PATH, &query).await?;

        let board: DepartureBoard =
            serde_json::from_str(&response.body).map_err(|e| BoardError::Json {
                message: e.to_string(),
                body: response.body.chars().take(200).collect(),
            })?;

        let raw_count = board.departures.len();
        let filtered = DepartureBoard {
            departures: filter_entries(
                &board.departures,
                request.line.as_deref(),
                request.direction,
            )
            .cloned()
            .collect(),
        };
        let records = convert_board(&filtered, request.kind, &self.trip_ids);

        debug!(
            stop = %request.stop_id,
            raw = raw_count,
            kept = records.len(),
            "filtered board"
        );

        let records = Arc::new(records);
        self.cache.insert(key, Arc::clone(&records));

        Ok(BoardResult::new(truncate(&records, request.limit), false))
    }

    /// The board cache, for sweeping.
    pub fn cache(&self) -> &Arc<TtlCache<BoardKey, Arc<Vec<BoardRecord>>>> {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drop all cached boards.
    pub fn invalidate_cache(&self) {
        self.cache.clear();
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }
}

fn truncate(records: &[BoardRecord], limit: usize) -> Vec<BoardRecord> {
    records.iter().take(limit).cloned().collect()
}
