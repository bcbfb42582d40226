//! HTTP API for the collector

pub mod health;
pub mod player_errors;

pub use health::health_routes;
pub use player_errors::player_error_routes;
