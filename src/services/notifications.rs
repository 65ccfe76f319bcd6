use chrono::Utc;

use crate::models::webhook::format_timestamp;
use crate::models::{
    AppointmentInfo, Barber, Booking, CustomerInfo, Service, WebhookEvent, WebhookPayload,
};

/// Shown as the barber when the customer did not pick one.
pub const ANY_BARBER: &str = "Qualunque";

pub fn booking_payload(
    event: WebhookEvent,
    booking: &Booking,
    services: &[Service],
    team: &[Barber],
    public_url: &str,
) -> WebhookPayload {
    let barber = booking
        .barber_id
        .as_deref()
        .and_then(|id| team.iter().find(|b| b.id == id))
        .map(|b| b.name.clone())
        .unwrap_or_else(|| ANY_BARBER.to_string());

    let service_names = booking
        .service_ids
        .iter()
        .filter_map(|id| services.iter().find(|s| &s.id == id))
        .map(|s| s.name.clone())
        .collect();

    WebhookPayload {
        event,
        booking_id: Some(booking.id.clone()),
        timestamp: format_timestamp(Utc::now()),
        customer: CustomerInfo {
            name: booking.customer_name.clone(),
            surname: booking.customer_surname.clone(),
            phone: booking.phone.clone(),
            email: booking.email.clone().filter(|e| !e.is_empty()),
        },
        appointment: Some(AppointmentInfo {
            date: booking.date.format("%Y-%m-%d").to_string(),
            time: booking.time.clone(),
            barber,
            services: service_names,
            total_duration: booking.total_duration,
            total_price: booking.total_price,
        }),
        management_link: management_link(public_url, &booking.id),
    }
}

pub fn test_payload() -> WebhookPayload {
    WebhookPayload {
        event: WebhookEvent::TestConnection,
        booking_id: None,
        timestamp: format_timestamp(Utc::now()),
        customer: CustomerInfo {
            name: "Test".to_string(),
            surname: "Connection".to_string(),
            phone: "+39 000 0000000".to_string(),
            email: None,
        },
        appointment: None,
        management_link: None,
    }
}

fn management_link(public_url: &str, booking_id: &str) -> Option<String> {
    let base = public_url.trim_end_matches('/');
    if base.is_empty() {
        return None;
    }
    Some(format!("{base}/booking/{booking_id}"))
}
