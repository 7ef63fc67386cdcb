//! Web layer for the departure dashboard.
//!
//! JSON endpoints for the latest snapshot, single travel-time estimates and
//! cache statistics. Presentation is left to the client.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
