use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{Booking, BookingChanges, BookingStatus, OpeningHours, Service, ServiceTotals};
use crate::services::scheduling::{validate_booking_time, SlotRequest};
use crate::store::BookingStore;

const ID_LEN: usize = 6;

/// What the customer submits at the end of the booking flow.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    pub service_ids: Vec<String>,
    pub barber_id: Option<String>,
    pub date: NaiveDate,
    pub time: String,
    pub name: String,
    pub surname: String,
    pub phone: String,
    pub email: Option<String>,
    pub notes: Option<String>,
}

pub fn create_booking(
    store: &mut BookingStore,
    hours: &OpeningHours,
    interval_minutes: u32,
    request: NewBooking,
) -> Result<Booking, AppError> {
    let name = required(&request.name, "name")?;
    let surname = required(&request.surname, "surname")?;
    let phone = required(&request.phone, "phone")?;

    let services = resolve_services(store, &request.service_ids)?;
    let totals = totals_of(&services)?;
    let barber_id = request.barber_id.filter(|id| !id.is_empty() && id != "none");

    validate_booking_time(
        hours,
        interval_minutes,
        store.team(),
        store.bookings(),
        &SlotRequest {
            date: request.date,
            time: &request.time,
            duration_minutes: totals.duration,
            barber_id: barber_id.as_deref(),
            exclude_id: None,
        },
    )?;

    let booking = Booking {
        id: new_booking_id(store),
        customer_name: name,
        customer_surname: surname,
        phone,
        email: request.email.filter(|e| !e.trim().is_empty()),
        notes: request.notes.filter(|n| !n.trim().is_empty()),
        barber_id,
        service_ids: services.iter().map(|s| s.id.clone()).collect(),
        date: request.date,
        time: request.time,
        total_price: totals.price,
        total_duration: totals.duration,
        status: BookingStatus::Confirmed,
        created_at: Utc::now(),
    };

    store.add_booking(booking.clone())?;
    tracing::info!(
        id = %booking.id,
        date = %booking.date,
        time = %booking.time,
        "booking created"
    );

    Ok(booking)
}

pub fn modify_booking(
    store: &mut BookingStore,
    hours: &OpeningHours,
    interval_minutes: u32,
    id: &str,
    changes: BookingChanges,
) -> Result<Booking, AppError> {
    if changes.is_empty() {
        return Err(AppError::Validation("no changes given".to_string()));
    }

    let mut booking = store
        .booking(id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;

    if let Some(service_ids) = changes.service_ids {
        let services = resolve_services(store, &service_ids)?;
        let totals = totals_of(&services)?;
        booking.service_ids = services.iter().map(|s| s.id.clone()).collect();
        booking.total_duration = totals.duration;
        booking.total_price = totals.price;
    }
    if let Some(date) = changes.date {
        booking.date = date;
    }
    if let Some(time) = changes.time {
        booking.time = time;
    }
    if let Some(barber_id) = changes.barber_id {
        booking.barber_id = barber_id.filter(|id| !id.is_empty() && id != "none");
    }
    if let Some(notes) = changes.notes {
        booking.notes = Some(notes).filter(|n| !n.trim().is_empty());
    }

    validate_booking_time(
        hours,
        interval_minutes,
        store.team(),
        store.bookings(),
        &SlotRequest {
            date: booking.date,
            time: &booking.time,
            duration_minutes: booking.total_duration,
            barber_id: booking.barber_id.as_deref(),
            exclude_id: Some(&booking.id),
        },
    )?;

    store.replace_booking(booking.clone())?;
    tracing::info!(id = %booking.id, "booking modified");

    Ok(booking)
}

fn resolve_services(store: &BookingStore, ids: &[String]) -> Result<Vec<Service>, AppError> {
    if ids.is_empty() {
        return Err(AppError::Validation("select at least one service".to_string()));
    }

    let mut services: Vec<Service> = Vec::with_capacity(ids.len());
    for id in ids {
        if services.iter().any(|s| &s.id == id) {
            continue;
        }
        let service = store
            .service(id)
            .ok_or_else(|| AppError::Validation(format!("unknown service: {id}")))?;
        services.push(service.clone());
    }
    Ok(services)
}

fn totals_of(services: &[Service]) -> Result<ServiceTotals, AppError> {
    ServiceTotals::of(services)
        .ok_or_else(|| AppError::Validation("selected services are too long to book".to_string()))
}

fn required(value: &str, field: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn new_booking_id(store: &BookingStore) -> String {
    loop {
        let id = uuid::Uuid::new_v4().simple().to_string()[..ID_LEN].to_uppercase();
        if !store.contains_booking(&id) {
            return id;
        }
    }
}
