use std::env;
use std::time::Duration;

use anyhow::Context;

use crate::catalog;
use crate::models::OpeningHours;

/// Longest slot interval accepted: one slot per day.
pub const MAX_SLOT_INTERVAL_MINUTES: u32 = 24 * 60;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    /// Seeds the stored webhook URL on first start; admins change it later.
    pub webhook_url: String,
    /// Base URL used to build management links in notifications.
    pub public_url: String,
    pub slot_interval_minutes: u32,
    pub webhook_retries: u32,
    pub webhook_backoff: Duration,
    pub opening_hours: OpeningHours,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let slot_interval_minutes = check_slot_interval(
            env::var("SLOT_INTERVAL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(20),
        )?;

        let opening_hours = match env::var("OPENING_HOURS_FILE") {
            Ok(path) => {
                let json = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read opening hours from {path}"))?;
                OpeningHours::from_json(&json)
                    .with_context(|| format!("invalid opening hours in {path}"))?
            }
            Err(_) => catalog::default_opening_hours(),
        };

        Ok(Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "barberbook.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            webhook_url: env::var("WEBHOOK_URL").unwrap_or_default(),
            public_url: env::var("PUBLIC_URL").unwrap_or_default(),
            slot_interval_minutes,
            webhook_retries: env::var("WEBHOOK_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
            webhook_backoff: Duration::from_millis(
                env::var("WEBHOOK_BACKOFF_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(1000),
            ),
            opening_hours,
        })
    }
}

fn check_slot_interval(minutes: u32) -> anyhow::Result<u32> {
    anyhow::ensure!(
        (1..=MAX_SLOT_INTERVAL_MINUTES).contains(&minutes),
        "SLOT_INTERVAL_MINUTES must be between 1 and {MAX_SLOT_INTERVAL_MINUTES}, got {minutes}"
    );
    Ok(minutes)
}
