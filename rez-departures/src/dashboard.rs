//! Orchestration of the four dashboard boards.
//!
//! Every poll fans out to all four fixed routes at once. A route whose fetch
//! fails gets an empty placeholder board instead of failing the poll, so the
//! dashboard always has four slots to show.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::boards::{BoardConfig, BoardFetcher, BoardRequest, BoardResult};
use crate::cache::CacheStats;
use crate::domain::{
    Direction, HUSINEC, KOBYLISY, LINE_371, LINE_S4, MASARYKOVO, Mode, REZ,
    minutes_until_next_departure,
};
use crate::pid::Transport;
use crate::travel::{EstimatorConfig, TravelTimeEstimate, TravelTimeEstimator, UnavailableReason};

/// Records shown per board.
pub const BOARD_LIMIT: usize = 3;

/// How often the background poller refreshes the snapshot.
pub const POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Shown when not a single board could be loaded.
pub const ALL_FAILED_MESSAGE: &str = "Departures are unavailable right now. Please try again shortly.";

/// One of the four boards on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    RezToMasarykovo,
    MasarykovoToRez,
    HusinecToKobylisy,
    KobylisyToHusinec,
}

impl Slot {
    pub const ALL: [Slot; 4] = [
        Slot::RezToMasarykovo,
        Slot::MasarykovoToRez,
        Slot::HusinecToKobylisy,
        Slot::KobylisyToHusinec,
    ];

    pub fn route(self) -> &'static RouteSpec {
        match self {
            Slot::RezToMasarykovo => &ROUTES[0],
            Slot::MasarykovoToRez => &ROUTES[1],
            Slot::HusinecToKobylisy => &ROUTES[2],
            Slot::KobylisyToHusinec => &ROUTES[3],
        }
    }
}

/// A fixed stop, line and direction shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteSpec {
    pub slot: Slot,
    pub stop_id: &'static str,
    pub line: &'static str,
    pub direction: Direction,
    pub mode: Mode,
}

impl RouteSpec {
    pub fn board_request(&self) -> BoardRequest {
        BoardRequest::departures(self.stop_id)
            .line(self.line)
            .direction(self.direction)
            .limit(BOARD_LIMIT)
    }
}

pub const ROUTES: [RouteSpec; 4] = [
    RouteSpec {
        slot: Slot::RezToMasarykovo,
        stop_id: REZ,
        line: LINE_S4,
        direction: Direction::ToMasarykovo,
        mode: Mode::Train,
    },
    RouteSpec {
        slot: Slot::MasarykovoToRez,
        stop_id: MASARYKOVO,
        line: LINE_S4,
        direction: Direction::ToRez,
        mode: Mode::Train,
    },
    RouteSpec {
        slot: Slot::HusinecToKobylisy,
        stop_id: HUSINEC,
        line: LINE_371,
        direction: Direction::ToKobylisy,
        mode: Mode::Bus,
    },
    RouteSpec {
        slot: Slot::KobylisyToHusinec,
        stop_id: KOBYLISY,
        line: LINE_371,
        direction: Direction::ToHusinec,
        mode: Mode::Bus,
    },
];

/// One value per dashboard slot, keyed by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerSlot<V> {
    pub rez_to_masarykovo: V,
    pub masarykovo_to_rez: V,
    pub husinec_to_kobylisy: V,
    pub kobylisy_to_husinec: V,
}

impl<V> PerSlot<V> {
    /// Build by calling `f` for each slot in [`Slot::ALL`] order.
    pub fn from_fn(mut f: impl FnMut(Slot) -> V) -> Self {
        Self {
            rez_to_masarykovo: f(Slot::RezToMasarykovo),
            masarykovo_to_rez: f(Slot::MasarykovoToRez),
            husinec_to_kobylisy: f(Slot::HusinecToKobylisy),
            kobylisy_to_husinec: f(Slot::KobylisyToHusinec),
        }
    }

    pub fn get(&self, slot: Slot) -> &V {
        match slot {
            Slot::RezToMasarykovo => &self.rez_to_masarykovo,
            Slot::MasarykovoToRez => &self.masarykovo_to_rez,
            Slot::HusinecToKobylisy => &self.husinec_to_kobylisy,
            Slot::KobylisyToHusinec => &self.kobylisy_to_husinec,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Slot, &V)> {
        Slot::ALL.into_iter().map(move |slot| (slot, self.get(slot)))
    }
}

/// The four boards.
pub type AllBoards = PerSlot<BoardResult>;

/// Travel-time estimate for each route.
pub type TravelTimes = PerSlot<TravelTimeEstimate>;

impl AllBoards {
    /// Whether every board is a failure placeholder.
    pub fn all_failed(&self) -> bool {
        self.iter().all(|(_, board)| board.is_failed())
    }
}

/// Everything the dashboard shows, from one poll.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Increases with every poll; a newer snapshot always supersedes an older one.
    pub generation: u64,
    pub fetched_at: DateTime<Utc>,
    pub boards: AllBoards,
    pub travel_times: TravelTimes,
    /// Minutes until the next departure on each board.
    pub next_departure_minutes: PerSlot<Option<i64>>,
    /// Set only when no board at all could be loaded.
    pub error: Option<String>,
}

/// Latest published snapshot. Older generations are discarded.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    latest: RwLock<Option<Arc<Snapshot>>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn latest(&self) -> Option<Arc<Snapshot>> {
        self.latest.read().await.clone()
    }

    /// Publish `snapshot` unless a newer one is already stored.
    ///
    /// Returns whether it was stored.
    pub async fn publish(&self, snapshot: Snapshot) -> bool {
        let mut latest = self.latest.write().await;
        if let Some(current) = latest.as_ref() {
            if current.generation >= snapshot.generation {
                debug!(
                    stale = snapshot.generation,
                    current = current.generation,
                    "discarding stale snapshot"
                );
                return false;
            }
        }
        *latest = Some(Arc::new(snapshot));
        true
    }
}

/// Cache sizes and hit counts, for monitoring.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardCacheStats {
    pub boards: CacheStats,
    pub travel_times: CacheStats,
}

/// Fetches the four fixed boards and their travel times.
pub struct Dashboard<T> {
    boards: Arc<BoardFetcher<T>>,
    estimator: TravelTimeEstimator<T>,
    generation: AtomicU64,
}

impl<T: Transport> Dashboard<T> {
    pub fn new(transport: T, boards: BoardConfig, estimator: EstimatorConfig) -> Self {
        let boards = Arc::new(BoardFetcher::new(transport, boards));
        let estimator = TravelTimeEstimator::new(Arc::clone(&boards), estimator);
        Self::from_parts(estimator)
    }

    /// Build around an existing estimator, sharing its board fetcher.
    pub fn from_parts(estimator: TravelTimeEstimator<T>) -> Self {
        Self {
            boards: Arc::clone(estimator.boards()),
            estimator,
            generation: AtomicU64::new(0),
        }
    }

    /// Fetch all four boards concurrently.
    ///
    /// Never fails: a board that can't be fetched becomes a placeholder.
    pub async fn fetch_all(&self) -> AllBoards {
        let fetches = ROUTES.iter().map(|route| async move {
            match self.boards.fetch_board(&route.board_request()).await {
                Ok(board) => board,
                Err(e) => {
                    warn!(
                        stop = route.stop_id,
                        line = route.line,
                        direction = %route.direction,
                        error = %e,
                        "board fetch failed, using placeholder"
                    );
                    BoardResult::failed()
                }
            }
        });

        let mut results = join_all(fetches).await.into_iter();
        PerSlot::from_fn(|_| results.next().unwrap_or_else(BoardResult::failed))
    }

    /// Estimate the travel time of all four routes concurrently.
    pub async fn estimate_all(&self) -> TravelTimes {
        let estimates = ROUTES.iter().map(|route| {
            self.estimator
                .estimate(route.line, route.direction, route.mode)
        });

        let mut results = join_all(estimates).await.into_iter();
        PerSlot::from_fn(|_| {
            results.next().unwrap_or(TravelTimeEstimate::Unavailable {
                reason: UnavailableReason::UpstreamUnavailable,
            })
        })
    }

    /// Poll everything once.
    ///
    /// Boards are fetched before estimating so the estimator's departure
    /// fetches hit the board cache.
    pub async fn snapshot(&self) -> Snapshot {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let boards = self.fetch_all().await;
        let travel_times = self.estimate_all().await;

        let fetched_at = Utc::now();
        let next_departure_minutes = PerSlot::from_fn(|slot| {
            minutes_until_next_departure(&boards.get(slot).records, fetched_at)
        });
        let error = boards.all_failed().then(|| ALL_FAILED_MESSAGE.to_string());

        Snapshot {
            generation,
            fetched_at,
            boards,
            travel_times,
            next_departure_minutes,
            error,
        }
    }

    pub fn cache_stats(&self) -> DashboardCacheStats {
        DashboardCacheStats {
            boards: self.boards.cache_stats(),
            travel_times: self.estimator.cache_stats(),
        }
    }

    pub fn boards(&self) -> &Arc<BoardFetcher<T>> {
        &self.boards
    }

    pub fn estimator(&self) -> &TravelTimeEstimator<T> {
        &self.estimator
    }
}

impl<T: Transport + 'static> Dashboard<T> {
    /// Start the expiry sweeps of both caches.
    pub fn spawn_sweepers(&self) -> Vec<JoinHandle<()>> {
        vec![
            self.boards.cache().spawn_sweeper(),
            self.estimator.cache().spawn_sweeper(),
        ]
    }

    /// Poll every `period` (starting immediately) and publish into `store`.
    pub fn spawn_poller(
        self: &Arc<Self>,
        store: Arc<SnapshotStore>,
        period: Duration,
    ) -> JoinHandle<()> {
        let dashboard = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                let snapshot = dashboard.snapshot().await;
                let generation = snapshot.generation;
                let failed = snapshot
                    .boards
                    .iter()
                    .filter(|(_, b)| b.is_failed())
                    .count();
                if store.publish(snapshot).await {
                    info!(generation, failed_boards = failed, "published snapshot");
                }
            }
        })
    }
}
