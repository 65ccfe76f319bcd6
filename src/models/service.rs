use serde::{Deserialize, Serialize};

/// Longest single service, in minutes.
pub const MAX_SERVICE_DURATION: u32 = 8 * 60;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Service {
    pub id: String,
    pub name: String,
    /// Minutes.
    pub duration: u32,
    pub price: f64,
    pub category: ServiceCategory,
}

impl Service {
    /// Checks the fields an admin can get wrong; the message is user-facing.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() || self.name.trim().is_empty() {
            return Err("service id and name are required".to_string());
        }
        if self.duration == 0 || self.duration > MAX_SERVICE_DURATION {
            return Err(format!(
                "service duration must be between 1 and {MAX_SERVICE_DURATION} minutes"
            ));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err("service price must be a non-negative amount".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ServiceCategory {
    Classic,
    Premium,
    Other,
}

/// Duration and price of a selection of services.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ServiceTotals {
    pub duration: u32,
    pub price: f64,
}

impl ServiceTotals {
    /// `None` when the combined duration does not fit in a `u32`.
    pub fn of<'a>(services: impl IntoIterator<Item = &'a Service>) -> Option<Self> {
        services
            .into_iter()
            .try_fold(ServiceTotals::default(), |acc, s| {
                Some(ServiceTotals {
                    duration: acc.duration.checked_add(s.duration)?,
                    price: acc.price + s.price,
                })
            })
    }
}
