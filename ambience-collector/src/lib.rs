//! ambience-collector library
//!
//! Receives player error reports posted by the playback controller and
//! forwards each one to the structured log stream, where log shippers pick
//! them up for dashboards and alerting.

use axum::Router;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod config;
pub mod service;

pub use config::CollectorConfig;
pub use service::PlayerErrorLog;

/// Application state shared across HTTP handlers
#[derive(Clone, Default)]
pub struct AppState {
    /// Reports accepted since startup
    pub reports_received: Arc<AtomicU64>,
    pub log: PlayerErrorLog,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_report(&self) -> u64 {
        self.reports_received.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn reports_received(&self) -> u64 {
        self.reports_received.load(Ordering::Relaxed)
    }
}

/// Build application router
///
/// Browsers post reports cross-origin, so CORS is permissive.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::player_error_routes())
        .merge(api::health_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
