use chrono::Weekday;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Barber {
    pub id: String,
    pub name: String,
    pub role: String,
    /// Weekdays the barber is in the shop.
    pub availability: Vec<Weekday>,
    pub color: String,
    pub image_url: String,
}

impl Barber {
    pub fn works_on(&self, weekday: Weekday) -> bool {
        self.availability.contains(&weekday)
    }
}
