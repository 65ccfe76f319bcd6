pub mod catalog;
pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;
pub mod store;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/services", get(handlers::booking::list_services))
        .route("/api/team", get(handlers::booking::list_team))
        .route("/api/hours", get(handlers::booking::opening_hours))
        .route("/api/dates", get(handlers::booking::bookable_dates))
        .route("/api/slots", get(handlers::booking::list_slots))
        .route("/api/bookings", post(handlers::booking::create_booking))
        .route("/api/bookings/:id", get(handlers::booking::get_booking))
        .route("/api/admin/dashboard", get(handlers::admin::get_dashboard))
        .route("/api/admin/bookings", get(handlers::admin::get_bookings))
        .route("/api/admin/calendar", get(handlers::admin::get_calendar))
        .route(
            "/api/admin/bookings/:id/status",
            post(handlers::admin::update_status),
        )
        .route(
            "/api/admin/bookings/:id/modify",
            post(handlers::admin::modify_booking),
        )
        .route(
            "/api/admin/services",
            get(handlers::admin::get_services).post(handlers::admin::upsert_service),
        )
        .route(
            "/api/admin/services/:id",
            axum::routing::delete(handlers::admin::delete_service),
        )
        .route(
            "/api/admin/team",
            get(handlers::admin::get_team).post(handlers::admin::upsert_barber),
        )
        .route(
            "/api/admin/team/:id",
            axum::routing::delete(handlers::admin::delete_barber),
        )
        .route(
            "/api/admin/settings",
            get(handlers::admin::get_settings).post(handlers::admin::update_settings),
        )
        .route("/api/admin/webhook/test", post(handlers::admin::test_webhook))
        .with_state(state)
}
