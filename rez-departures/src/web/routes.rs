//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use tracing::{error, warn};

use crate::dashboard::{DashboardCacheStats, Snapshot};
use crate::domain::DomainError;
use crate::pid::Transport;

use super::dto::{ErrorResponse, TravelTimeQuery, TravelTimeResponse};
use super::state::AppState;

/// Create the application router.
pub fn create_router<T: Transport + 'static>(state: AppState<T>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/departures", get(departures::<T>))
        .route("/api/travel-time", get(travel_time::<T>))
        .route("/api/cache/stats", get(cache_stats::<T>))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Latest dashboard snapshot.
///
/// Before the first poll has finished, polls on demand.
async fn departures<T: Transport + 'static>(
    State(state): State<AppState<T>>,
) -> Result<Json<Snapshot>, AppError> {
    let snapshot = match state.snapshots.latest().await {
        Some(snapshot) => (*snapshot).clone(),
        None => {
            let snapshot = state.dashboard.snapshot().await;
            state.snapshots.publish(snapshot.clone()).await;
            snapshot
        }
    };

    if let Some(message) = &snapshot.error {
        return Err(AppError::Unavailable {
            message: message.clone(),
        });
    }

    Ok(Json(snapshot))
}

/// Travel-time estimate for one line and direction.
async fn travel_time<T: Transport + 'static>(
    State(state): State<AppState<T>>,
    Query(query): Query<TravelTimeQuery>,
) -> Result<Json<TravelTimeResponse>, AppError> {
    let (mode, direction) = query.parse()?;

    let estimate = state
        .dashboard
        .estimator()
        .estimate(&query.line, direction, mode)
        .await;

    Ok(Json(TravelTimeResponse::new(
        &query.line,
        direction,
        mode,
        estimate,
    )))
}

/// Cache sizes and hit counts.
async fn cache_stats<T: Transport + 'static>(
    State(state): State<AppState<T>>,
) -> Json<DashboardCacheStats> {
    Json(state.dashboard.cache_stats())
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    Unavailable { message: String },
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        AppError::BadRequest {
            message: e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::Unavailable { message } => (StatusCode::SERVICE_UNAVAILABLE, message),
        };

        if status.is_server_error() {
            error!(%status, %message, "request failed");
        } else {
            warn!(%status, %message, "rejected request");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boards::BoardConfig;
    use crate::dashboard::{Dashboard, SnapshotStore};
    use crate::pid::MockTransport;
    use crate::travel::{EstimatorConfig, TravelTimeEstimate};
    use std::sync::Arc;

    fn state(mock: MockTransport) -> AppState<MockTransport> {
        let dashboard = Dashboard::new(mock, BoardConfig::default(), EstimatorConfig::default());
        AppState::new(Arc::new(dashboard), Arc::new(SnapshotStore::new()))
    }

    fn demo_state() -> AppState<MockTransport> {
        state(MockTransport::demo(chrono::Utc::now()))
    }

    #[tokio::test]
    async fn health_is_ok() {
        assert_eq!(health().await, "ok");
    }

    #[test]
    fn router_builds() {
        let _router = create_router(demo_state());
    }

    #[tokio::test]
    async fn departures_polls_on_demand_then_reuses_snapshot() {
        let state = demo_state();

        let Json(first) = departures(State(state.clone())).await.unwrap();
        assert_eq!(first.generation, 1);
        assert_eq!(first.boards.rez_to_masarykovo.records.len(), 3);

        let Json(second) = departures(State(state.clone())).await.unwrap();
        assert_eq!(second.generation, 1);
    }

    #[tokio::test]
    async fn departures_unavailable_when_everything_fails() {
        let result = departures(State(state(MockTransport::new()))).await;
        assert!(matches!(result, Err(AppError::Unavailable { .. })));
    }

    #[tokio::test]
    async fn travel_time_for_known_route() {
        let query = TravelTimeQuery {
            line: "S4".into(),
            direction: "to-masarykovo".into(),
        };

        let Json(response) = travel_time(State(demo_state()), Query(query))
            .await
            .unwrap();

        assert_eq!(response.minutes, Some(18));
        assert!(matches!(response.estimate, TravelTimeEstimate::Live { .. }));
    }

    #[tokio::test]
    async fn travel_time_rejects_bad_direction() {
        let query = TravelTimeQuery {
            line: "371".into(),
            direction: "sideways".into(),
        };

        let result = travel_time(State(demo_state()), Query(query)).await;
        assert!(matches!(result, Err(AppError::BadRequest { .. })));
    }

    #[tokio::test]
    async fn cache_stats_reflect_fetches() {
        let state = demo_state();
        let _snapshot = departures(State(state.clone())).await.unwrap();

        let Json(stats) = cache_stats(State(state)).await;
        assert_eq!(stats.boards.size, 8);
        assert_eq!(stats.travel_times.size, 4);
    }

    #[test]
    fn error_status_codes() {
        let response = AppError::BadRequest {
            message: "nope".into(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = AppError::Unavailable {
            message: "down".into(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
