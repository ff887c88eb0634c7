//! HTTP service for generating, minting and burning SongDrop badges.

pub mod config;
pub mod error;
pub mod health;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the service router over shared state
pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .merge(health::routes())
        .merge(routes::badges::routes())
        .merge(routes::burns::routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
