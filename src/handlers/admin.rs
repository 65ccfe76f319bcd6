use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{Barber, Booking, BookingChanges, BookingStatus, Service, WebhookEvent};
use crate::services::bookings;
use crate::services::notifications;
use crate::state::AppState;
use crate::store::{BarberDay, Dashboard, Settings};

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token.is_empty() || token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

fn ok() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}

/// Builds the notification for `booking` and hands it to the dispatcher.
fn notify(state: &AppState, event: WebhookEvent, booking: &Booking) {
    let (payload, url) = {
        let store = state.store.lock().unwrap();
        let payload = notifications::booking_payload(
            event,
            booking,
            store.services(),
            store.team(),
            &state.config.public_url,
        );
        (payload, store.settings().webhook_url.clone())
    };
    state.webhooks.dispatch(url, payload);
}

// GET /api/admin/dashboard
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Dashboard>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let today = Local::now().date_naive();
    let store = state.store.lock().unwrap();
    Ok(Json(store.dashboard(today)))
}

// GET /api/admin/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub date: Option<NaiveDate>,
    pub status: Option<String>,
    pub limit: Option<usize>,
}

pub async fn get_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let status = match query.status.as_deref() {
        Some(s) => Some(
            BookingStatus::parse(s)
                .ok_or_else(|| AppError::Validation(format!("unknown status: {s}")))?,
        ),
        None => None,
    };
    let limit = query.limit.unwrap_or(50);

    let store = state.store.lock().unwrap();
    let bookings = store
        .bookings()
        .iter()
        .filter(|b| query.date.map_or(true, |d| b.date == d))
        .filter(|b| status.map_or(true, |s| b.status == s))
        .take(limit)
        .cloned()
        .collect();

    Ok(Json(bookings))
}

// GET /api/admin/calendar?date=YYYY-MM-DD
#[derive(Deserialize)]
pub struct CalendarQuery {
    pub date: Option<NaiveDate>,
}

pub async fn get_calendar(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<Vec<BarberDay>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let date = query.date.unwrap_or_else(|| Local::now().date_naive());
    let store = state.store.lock().unwrap();
    Ok(Json(store.day_schedule(date)))
}

// POST /api/admin/bookings/:id/status
#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: BookingStatus,
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<StatusRequest>,
) -> Result<Json<Booking>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let (booking, changed) = {
        let mut store = state.store.lock().unwrap();
        let before = store
            .booking(&id)
            .map(|b| b.status)
            .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;
        let booking = store.set_status(&id, body.status)?;
        (booking, before != body.status)
    };

    tracing::info!(id = %id, status = booking.status.as_str(), "booking status changed");

    if changed && booking.status == BookingStatus::Cancelled {
        notify(&state, WebhookEvent::BookingCancelled, &booking);
    }

    Ok(Json(booking))
}

// POST /api/admin/bookings/:id/modify
pub async fn modify_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(changes): Json<BookingChanges>,
) -> Result<Json<Booking>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let booking = {
        let mut store = state.store.lock().unwrap();
        bookings::modify_booking(
            &mut store,
            &state.config.opening_hours,
            state.config.slot_interval_minutes,
            &id,
            changes,
        )?
    };

    notify(&state, WebhookEvent::BookingModified, &booking);

    Ok(Json(booking))
}

// GET /api/admin/services
pub async fn get_services(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Service>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let store = state.store.lock().unwrap();
    Ok(Json(store.services().to_vec()))
}

// POST /api/admin/services
pub async fn upsert_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(service): Json<Service>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let mut store = state.store.lock().unwrap();
    store.upsert_service(service)?;
    Ok(ok())
}

// DELETE /api/admin/services/:id
pub async fn delete_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let mut store = state.store.lock().unwrap();
    store.remove_service(&id)?;
    Ok(ok())
}

// GET /api/admin/team
pub async fn get_team(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Barber>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let store = state.store.lock().unwrap();
    Ok(Json(store.team().to_vec()))
}

// POST /api/admin/team
pub async fn upsert_barber(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(barber): Json<Barber>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    if barber.id.trim().is_empty() || barber.name.trim().is_empty() {
        return Err(AppError::Validation("barber id and name are required".to_string()));
    }

    let mut store = state.store.lock().unwrap();
    store.upsert_barber(barber)?;
    Ok(ok())
}

// DELETE /api/admin/team/:id
pub async fn delete_barber(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let mut store = state.store.lock().unwrap();
    store.remove_barber(&id)?;
    Ok(ok())
}

// GET /api/admin/settings
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Settings>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let store = state.store.lock().unwrap();
    Ok(Json(store.settings().clone()))
}

// POST /api/admin/settings
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    pub webhook_url: Option<String>,
}

pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<UpdateSettingsRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    if let Some(url) = body.webhook_url {
        let mut store = state.store.lock().unwrap();
        store.set_webhook_url(url.trim().to_string())?;
    }

    Ok(ok())
}

// POST /api/admin/webhook/test
#[derive(Serialize)]
pub struct WebhookTestResponse {
    ok: bool,
}

pub async fn test_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<WebhookTestResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let url = {
        let store = state.store.lock().unwrap();
        store.settings().webhook_url.clone()
    };

    let delivered = state
        .webhooks
        .send(&url, &notifications::test_payload())
        .await;

    tracing::info!(delivered, "webhook test finished");

    Ok(Json(WebhookTestResponse { ok: delivered }))
}
