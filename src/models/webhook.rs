use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEvent {
    NewBooking,
    BookingCancelled,
    BookingModified,
    TestConnection,
}

/// Event body POSTed to the configured webhook URL.
///
/// Field names match what downstream automations already consume.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebhookPayload {
    pub event: WebhookEvent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<String>,
    pub timestamp: String,
    #[serde(rename = "cliente")]
    pub customer: CustomerInfo,
    #[serde(rename = "appuntamento", skip_serializing_if = "Option::is_none")]
    pub appointment: Option<AppointmentInfo>,
    #[serde(rename = "link_gestione", skip_serializing_if = "Option::is_none")]
    pub management_link: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerInfo {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "cognome")]
    pub surname: String,
    #[serde(rename = "telefono")]
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppointmentInfo {
    #[serde(rename = "data")]
    pub date: String,
    #[serde(rename = "ora")]
    pub time: String,
    #[serde(rename = "barbiere")]
    pub barber: String,
    #[serde(rename = "servizi")]
    pub services: Vec<String>,
    #[serde(rename = "durata_totale")]
    pub total_duration: u32,
    #[serde(rename = "prezzo_totale")]
    pub total_price: f64,
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
