// libs/schedule-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;

use crate::handlers;

pub fn schedule_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/day", get(handlers::day_schedule))
        .route("/week", get(handlers::week_schedule))
        .route("/slots", get(handlers::time_slots))
        .route("/draft", post(handlers::create_draft))
        .route("/navigate", post(handlers::navigate))
        .with_state(state)
}
