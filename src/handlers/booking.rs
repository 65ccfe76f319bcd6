use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{Barber, Booking, OpeningHours, Service, WebhookEvent};
use crate::services::bookings::{self, NewBooking};
use crate::services::{notifications, scheduling, slots};
use crate::state::AppState;

/// How far ahead customers may book.
const BOOKING_HORIZON_DAYS: u32 = 14;

// GET /api/services
pub async fn list_services(State(state): State<Arc<AppState>>) -> Json<Vec<Service>> {
    let store = state.store.lock().unwrap();
    Json(store.services().to_vec())
}

// GET /api/team
pub async fn list_team(State(state): State<Arc<AppState>>) -> Json<Vec<Barber>> {
    let store = state.store.lock().unwrap();
    Json(store.team().to_vec())
}

// GET /api/hours
pub async fn opening_hours(State(state): State<Arc<AppState>>) -> Json<OpeningHours> {
    Json(state.config.opening_hours.clone())
}

// GET /api/dates
pub async fn bookable_dates(State(state): State<Arc<AppState>>) -> Json<Vec<NaiveDate>> {
    let today = Local::now().date_naive();
    Json(slots::bookable_dates(
        &state.config.opening_hours,
        today,
        BOOKING_HORIZON_DAYS,
    ))
}

// GET /api/slots?date=YYYY-MM-DD&barber=id&duration=minutes
#[derive(Deserialize)]
pub struct SlotsQuery {
    pub date: NaiveDate,
    pub barber: Option<String>,
    /// Length of the appointment being planned; defaults to one slot.
    pub duration: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct SlotsResponse {
    pub date: NaiveDate,
    pub slots: Vec<String>,
    /// Slots where an appointment of the requested length would clash with
    /// one the barber already holds.
    pub taken: Vec<String>,
}

pub async fn list_slots(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SlotsQuery>,
) -> Json<SlotsResponse> {
    let slots = slots::slots_for_date(
        &state.config.opening_hours,
        query.date,
        state.config.slot_interval_minutes,
    );

    let taken = match query.barber.as_deref() {
        Some(barber_id) => {
            let duration = query.duration.unwrap_or(state.config.slot_interval_minutes);
            let store = state.store.lock().unwrap();
            scheduling::taken_slots(&slots, store.bookings(), query.date, barber_id, duration)
        }
        None => Vec::new(),
    };

    Json(SlotsResponse {
        date: query.date,
        slots,
        taken,
    })
}

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewBooking>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let (booking, payload, webhook_url) = {
        let mut store = state.store.lock().unwrap();
        let booking = bookings::create_booking(
            &mut store,
            &state.config.opening_hours,
            state.config.slot_interval_minutes,
            body,
        )?;
        let payload = notifications::booking_payload(
            WebhookEvent::NewBooking,
            &booking,
            store.services(),
            store.team(),
            &state.config.public_url,
        );
        (booking, payload, store.settings().webhook_url.clone())
    };

    state.webhooks.dispatch(webhook_url, payload);

    Ok((StatusCode::CREATED, Json(booking)))
}

// GET /api/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    let store = state.store.lock().unwrap();
    store
        .booking(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("booking {id}")))
}
