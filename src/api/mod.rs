//! HTTP API module
//! 
//! This module contains all HTTP endpoint handlers and response structures.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/timers", get(list_timers_handler).post(create_timer_handler))
        .route(
            "/timers/:id",
            get(get_timer_handler)
                .patch(update_timer_handler)
                .delete(delete_timer_handler),
        )
        .route("/timers/:id/:action", post(timer_action_handler))
        .route("/profile/save", post(save_profile_handler))
        .route("/profiles", get(list_profiles_handler))
        .route("/profiles/import", post(import_profile_handler))
        .route(
            "/profiles/:name",
            get(export_profile_handler).delete(delete_profile_handler),
        )
        .route("/profiles/:name/load", post(load_profile_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
