//! Shop data owned by the application: bookings, services, team and
//! settings. Every collection is loaded once at startup and written back
//! through a [`StorageAdapter`] after each successful mutation.

use std::collections::HashMap;

use anyhow::Context;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::catalog;
use crate::errors::AppError;
use crate::models::{Barber, Booking, BookingStatus, Service};

const BOOKINGS_KEY: &str = "bookings";
const SERVICES_KEY: &str = "services";
const TEAM_KEY: &str = "team";
const SETTINGS_KEY: &str = "settings";

/// How many of today's bookings the dashboard lists.
const DASHBOARD_PREVIEW: usize = 5;

pub trait StorageAdapter: Send {
    fn load(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn save(&mut self, key: &str, value: &str) -> anyhow::Result<()>;
}

#[derive(Default)]
pub struct MemoryStorage {
    values: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageAdapter for MemoryStorage {
    fn load(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub webhook_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub today_count: usize,
    pub today: Vec<Booking>,
    pub total_revenue: f64,
    pub total_bookings: usize,
    pub team_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarberDay {
    pub barber: Barber,
    pub bookings: Vec<Booking>,
}

pub struct BookingStore {
    storage: Box<dyn StorageAdapter>,
    bookings: Vec<Booking>,
    services: Vec<Service>,
    team: Vec<Barber>,
    settings: Settings,
}

impl BookingStore {
    /// Loads every collection, falling back to the default catalog for
    /// anything never saved. `default_webhook_url` seeds the settings.
    pub fn load(storage: Box<dyn StorageAdapter>, default_webhook_url: &str) -> anyhow::Result<Self> {
        let bookings: Vec<Booking> = load_or(storage.as_ref(), BOOKINGS_KEY, Vec::new)?;
        let services: Vec<Service> = load_or(storage.as_ref(), SERVICES_KEY, catalog::default_services)?;
        let team: Vec<Barber> = load_or(storage.as_ref(), TEAM_KEY, catalog::default_team)?;
        let settings: Settings = load_or(storage.as_ref(), SETTINGS_KEY, || Settings {
            webhook_url: default_webhook_url.to_string(),
        })?;

        tracing::info!(
            bookings = bookings.len(),
            services = services.len(),
            team = team.len(),
            "store loaded"
        );

        Ok(Self {
            storage,
            bookings,
            services,
            team,
            settings,
        })
    }

    // ── Bookings ──

    pub fn bookings(&self) -> &[Booking] {
        &self.bookings
    }

    pub fn booking(&self, id: &str) -> Option<&Booking> {
        self.bookings.iter().find(|b| b.id == id)
    }

    pub fn bookings_on(&self, date: NaiveDate) -> Vec<Booking> {
        self.bookings
            .iter()
            .filter(|b| b.date == date)
            .cloned()
            .collect()
    }

    pub fn contains_booking(&self, id: &str) -> bool {
        self.booking(id).is_some()
    }

    /// Newest bookings come first.
    pub fn add_booking(&mut self, booking: Booking) -> Result<(), AppError> {
        if self.contains_booking(&booking.id) {
            return Err(AppError::Conflict(format!("booking {} already exists", booking.id)));
        }
        let mut next = Vec::with_capacity(self.bookings.len() + 1);
        next.push(booking);
        next.extend(self.bookings.iter().cloned());
        commit(self.storage.as_mut(), BOOKINGS_KEY, &mut self.bookings, next)
    }

    pub fn set_status(&mut self, id: &str, status: BookingStatus) -> Result<Booking, AppError> {
        let index = self.booking_index(id)?;
        let current = &self.bookings[index];
        if current.status == status {
            return Ok(current.clone());
        }
        if current.status.is_final() {
            return Err(AppError::Conflict(format!(
                "booking {id} is already {}",
                current.status.as_str()
            )));
        }

        let mut next = self.bookings.clone();
        next[index].status = status;
        let updated = next[index].clone();
        commit(self.storage.as_mut(), BOOKINGS_KEY, &mut self.bookings, next)?;
        Ok(updated)
    }

    /// Replaces a booking in place, keeping its position in the list.
    pub fn replace_booking(&mut self, booking: Booking) -> Result<(), AppError> {
        let index = self.booking_index(&booking.id)?;
        let current = &self.bookings[index];
        if current.status.is_final() {
            return Err(AppError::Conflict(format!(
                "booking {} is already {}",
                current.id,
                current.status.as_str()
            )));
        }

        let mut next = self.bookings.clone();
        next[index] = booking;
        commit(self.storage.as_mut(), BOOKINGS_KEY, &mut self.bookings, next)
    }

    fn booking_index(&self, id: &str) -> Result<usize, AppError> {
        self.bookings
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| AppError::NotFound(format!("booking {id}")))
    }

    // ── Services ──

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn service(&self, id: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.id == id)
    }

    pub fn upsert_service(&mut self, service: Service) -> Result<(), AppError> {
        service.validate().map_err(AppError::Validation)?;

        let mut next = self.services.clone();
        match next.iter_mut().find(|s| s.id == service.id) {
            Some(existing) => *existing = service,
            None => next.push(service),
        }
        commit(self.storage.as_mut(), SERVICES_KEY, &mut self.services, next)
    }

    pub fn remove_service(&mut self, id: &str) -> Result<(), AppError> {
        let next: Vec<Service> = self.services.iter().filter(|s| s.id != id).cloned().collect();
        if next.len() == self.services.len() {
            return Err(AppError::NotFound(format!("service {id}")));
        }
        commit(self.storage.as_mut(), SERVICES_KEY, &mut self.services, next)
    }

    // ── Team ──

    pub fn team(&self) -> &[Barber] {
        &self.team
    }

    pub fn barber(&self, id: &str) -> Option<&Barber> {
        self.team.iter().find(|b| b.id == id)
    }

    pub fn upsert_barber(&mut self, barber: Barber) -> Result<(), AppError> {
        let mut next = self.team.clone();
        match next.iter_mut().find(|b| b.id == barber.id) {
            Some(existing) => *existing = barber,
            None => next.push(barber),
        }
        commit(self.storage.as_mut(), TEAM_KEY, &mut self.team, next)
    }

    pub fn remove_barber(&mut self, id: &str) -> Result<(), AppError> {
        let next: Vec<Barber> = self.team.iter().filter(|b| b.id != id).cloned().collect();
        if next.len() == self.team.len() {
            return Err(AppError::NotFound(format!("barber {id}")));
        }
        commit(self.storage.as_mut(), TEAM_KEY, &mut self.team, next)
    }

    // ── Settings ──

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_webhook_url(&mut self, url: String) -> Result<(), AppError> {
        let next = Settings { webhook_url: url };
        commit(self.storage.as_mut(), SETTINGS_KEY, &mut self.settings, next)
    }

    // ── Views ──

    pub fn dashboard(&self, today: NaiveDate) -> Dashboard {
        let today_bookings: Vec<Booking> = self
            .bookings
            .iter()
            .filter(|b| b.date == today && b.status != BookingStatus::Cancelled)
            .cloned()
            .collect();

        let total_revenue = self
            .bookings
            .iter()
            .filter(|b| b.status == BookingStatus::Completed)
            .map(|b| b.total_price)
            .sum();

        Dashboard {
            today_count: today_bookings.len(),
            today: today_bookings.into_iter().take(DASHBOARD_PREVIEW).collect(),
            total_revenue,
            total_bookings: self.bookings.len(),
            team_size: self.team.len(),
        }
    }

    /// Per-barber agenda for a day. Unassigned bookings show up under
    /// every barber.
    pub fn day_schedule(&self, date: NaiveDate) -> Vec<BarberDay> {
        let day = self.bookings_on(date);
        self.team
            .iter()
            .map(|barber| BarberDay {
                barber: barber.clone(),
                bookings: day
                    .iter()
                    .filter(|b| b.barber_id.as_deref().map_or(true, |id| id == barber.id))
                    .cloned()
                    .collect(),
            })
            .collect()
    }
}

/// Saves `next` under `key` and only then swaps it into `current`, so a
/// failed save leaves the in-memory state untouched.
fn commit<T: Serialize>(
    storage: &mut dyn StorageAdapter,
    key: &str,
    current: &mut T,
    next: T,
) -> Result<(), AppError> {
    let json = serde_json::to_string(&next)?;
    storage.save(key, &json).map_err(|e| {
        tracing::error!(key, error = %e, "failed to persist store");
        AppError::Storage(e.to_string())
    })?;
    *current = next;
    Ok(())
}

fn load_or<T: DeserializeOwned>(
    storage: &dyn StorageAdapter,
    key: &str,
    default: impl FnOnce() -> T,
) -> anyhow::Result<T> {
    match storage.load(key)? {
        Some(json) => serde_json::from_str(&json).with_context(|| format!("corrupt {key} in storage")),
        None => Ok(default()),
    }
}
