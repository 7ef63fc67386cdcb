//! Travel-time estimation from live boards, with mode-specific fallbacks.
//!
//! Trains always produce a number: when live data is missing or doesn't
//! look right, the static S4 time is used instead. Buses only ever report
//! live (or terminal-stop constant) times and are otherwise unavailable, so
//! the dashboard can omit the figure rather than show a wrong one.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::boards::{BoardError, BoardFetcher, BoardRequest, BoardResult};
use crate::cache::{CacheConfig, CacheStats, Clock, SystemClock, TtlCache};
use crate::domain::{Direction, Mode, TravelTimeAggregate, TravelTimeSample, stop_pair};
use crate::pid::Transport;

use super::config::{EstimatorConfig, TRAIN_STATIC_MINUTES, static_minutes};
use super::correlate::{aggregate_by_line, correlate};

/// Why no travel time could be given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "kebab-case")]
pub enum UnavailableReason {
    /// Both the departure and arrival boards failed to load
    #[error("upstream unavailable")]
    UpstreamUnavailable,

    /// Boards loaded but no trip appeared on both
    #[error("no correlated trips")]
    NoCorrelation,

    /// A live average was computed but fell outside the accepted window
    #[error("implausible live average")]
    ImplausibleAverage,

    /// The direction doesn't belong to the line
    #[error("unknown route")]
    UnknownRoute,
}

/// Outcome of one estimate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "camelCase")]
pub enum TravelTimeEstimate {
    /// Computed from correlated live boards.
    Live {
        aggregate: TravelTimeAggregate,
        cached: bool,
    },
    /// Known constant, used when live data is missing or rejected.
    Static { aggregate: TravelTimeAggregate },
    Unavailable { reason: UnavailableReason },
}

impl TravelTimeEstimate {
    pub fn aggregate(&self) -> Option<&TravelTimeAggregate> {
        match self {
            TravelTimeEstimate::Live { aggregate, .. }
            | TravelTimeEstimate::Static { aggregate } => Some(aggregate),
            TravelTimeEstimate::Unavailable { .. } => None,
        }
    }

    /// Estimated minutes, if any.
    pub fn minutes(&self) -> Option<i64> {
        self.aggregate().map(|a| a.average_duration_minutes)
    }

    pub fn is_live(&self) -> bool {
        matches!(self, TravelTimeEstimate::Live { .. })
    }
}

/// Raw result of sampling one route's boards.
#[derive(Debug, Clone, PartialEq)]
pub enum Sampling {
    /// Neither board could be fetched.
    BothFailed,
    /// The arrival board loaded but was empty, as it is at a terminus.
    NoArrivals,
    /// Correlated, plausible samples (possibly none).
    Samples(Vec<TravelTimeSample>),
}

/// Estimates travel times between the fixed stop pairs.
///
/// Owns the travel-time cache exclusively and shares the board fetcher
/// with the rest of the dashboard.
pub struct TravelTimeEstimator<T> {
    boards: Arc<BoardFetcher<T>>,
    cache: Arc<TtlCache<String, TravelTimeAggregate>>,
    config: EstimatorConfig,
}

impl<T: Transport> TravelTimeEstimator<T> {
    pub fn new(boards: Arc<BoardFetcher<T>>, config: EstimatorConfig) -> Self {
        Self::with_clock(boards, config, Arc::new(SystemClock))
    }

    /// Create an estimator whose cache runs on the given clock.
    pub fn with_clock(
        boards: Arc<BoardFetcher<T>>,
        config: EstimatorConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let cache_config = CacheConfig::new(config.max_entries, config.ttl);
        Self {
            boards,
            cache: Arc::new(TtlCache::with_clock(cache_config, clock)),
            config,
        }
    }

    /// Estimate the travel time on `line` heading `direction`.
    ///
    /// Never fails: transport problems surface as a static fallback (trains)
    /// or [`TravelTimeEstimate::Unavailable`] (buses).
    pub async fn estimate(&self, line: &str, direction: Direction, mode: Mode) -> TravelTimeEstimate {
        let Some((from, to)) = stop_pair(line, direction) else {
            debug!(line, %direction, "no stop pair for route");
            return self.fallback(line, mode, None, UnavailableReason::UnknownRoute);
        };
        let known = static_minutes(line, from, to);

        let key = cache_key(from, to, line);
        if let Some(aggregate) = self.cache.get(&key) {
            debug!(line, %direction, "travel time cache hit");
            return TravelTimeEstimate::Live {
                aggregate,
                cached: true,
            };
        }

        let samples = match self.sample(line, direction).await {
            Sampling::BothFailed => {
                warn!(line, %direction, "both boards unavailable");
                return TravelTimeEstimate::Unavailable {
                    reason: UnavailableReason::UpstreamUnavailable,
                };
            }
            Sampling::NoArrivals => {
                // Upstream has no arrival data at termini; use the known constant.
                debug!(line, %direction, "no arrivals, using static time");
                return self.terminal_static(line, mode, known);
            }
            Sampling::Samples(samples) => samples,
        };

        let Some(aggregate) = aggregate_by_line(&samples, Utc::now())
            .into_iter()
            .find(|a| a.line == line)
        else {
            debug!(line, %direction, "no correlated trips");
            return self.fallback(line, mode, known, UnavailableReason::NoCorrelation);
        };

        if !self
            .config
            .accepts(mode, aggregate.average_duration_minutes, known)
        {
            warn!(
                line,
                %direction,
                average = aggregate.average_duration_minutes,
                samples = aggregate.sample_count,
                "rejecting live travel time"
            );
            let reason = UnavailableReason::ImplausibleAverage;
            return match mode {
                Mode::Train => self.fallback(line, mode, known, reason),
                Mode::Bus => TravelTimeEstimate::Unavailable { reason },
            };
        }

        info!(
            line,
            %direction,
            average = aggregate.average_duration_minutes,
            samples = aggregate.sample_count,
            "live travel time"
        );
        self.cache.insert(key, aggregate.clone());
        TravelTimeEstimate::Live {
            aggregate,
            cached: false,
        }
    }

    /// Fetch both boards of a route concurrently and correlate them.
    ///
    /// A failure of either board alone is tolerated: it just yields no samples.
    pub async fn sample(&self, line: &str, direction: Direction) -> Sampling {
        let Some((from, to)) = stop_pair(line, direction) else {
            return Sampling::Samples(Vec::new());
        };

        let departures = BoardRequest::departures(from)
            .line(line)
            .direction(direction)
            .limit(self.config.sample_limit);
        let arrivals = BoardRequest::arrivals(to)
            .line(line)
            .direction(direction)
            .limit(self.config.sample_limit);

        let (departures, arrivals) = tokio::join!(
            self.boards.fetch_board(&departures),
            self.boards.fetch_board(&arrivals)
        );

        match (departures, arrivals) {
            (Err(dep_err), Err(arr_err)) => {
                debug!(line, departures = %dep_err, arrivals = %arr_err, "board fetches failed");
                Sampling::BothFailed
            }
            (_, Ok(arrivals)) if arrivals.records.is_empty() => Sampling::NoArrivals,
            (Ok(departures), Ok(arrivals)) => {
                Sampling::Samples(correlate(&departures.records, &arrivals.records))
            }
            (departures, arrivals) => {
                log_partial_failure(line, &departures, &arrivals);
                Sampling::Samples(Vec::new())
            }
        }
    }

    /// Static answer when live data is missing or rejected.
    ///
    /// Only trains have one; buses are unavailable.
    fn fallback(
        &self,
        line: &str,
        mode: Mode,
        known: Option<i64>,
        reason: UnavailableReason,
    ) -> TravelTimeEstimate {
        match mode {
            Mode::Train => static_estimate(line, mode, known.unwrap_or(TRAIN_STATIC_MINUTES)),
            Mode::Bus => TravelTimeEstimate::Unavailable { reason },
        }
    }

    /// Static answer for a route whose arrival board is empty.
    ///
    /// Buses take the constant for a known stop pair; trains fall back as usual.
    fn terminal_static(&self, line: &str, mode: Mode, known: Option<i64>) -> TravelTimeEstimate {
        match (mode, known) {
            (Mode::Bus, Some(minutes)) => static_estimate(line, mode, minutes),
            _ => self.fallback(line, mode, known, UnavailableReason::NoCorrelation),
        }
    }

    pub fn cache(&self) -> &Arc<TtlCache<String, TravelTimeAggregate>> {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn boards(&self) -> &Arc<BoardFetcher<T>> {
        &self.boards
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }
}

fn static_estimate(line: &str, mode: Mode, minutes: i64) -> TravelTimeEstimate {
    TravelTimeEstimate::Static {
        aggregate: TravelTimeAggregate::constant(line, mode, minutes, Utc::now()),
    }
}

fn cache_key(from: &str, to: &str, line: &str) -> String {
    format!("{from}|{to}|{line}")
}

fn log_partial_failure(
    line: &str,
    departures: &Result<BoardResult, BoardError>,
    arrivals: &Result<BoardResult, BoardError>,
) {
    for (kind, result) in [("departures", departures), ("arrivals", arrivals)] {
        if let Err(e) = result {
            debug!(line, kind, error = %e, "board fetch failed, no samples");
        }
    }
}
