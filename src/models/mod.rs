pub mod barber;
pub mod booking;
pub mod hours;
pub mod service;
pub mod webhook;

pub use barber::Barber;
pub use booking::{Booking, BookingChanges, BookingStatus};
pub use hours::{DayHours, OpeningHours, WorkingWindow};
pub use service::{Service, ServiceCategory, ServiceTotals};
pub use webhook::{AppointmentInfo, CustomerInfo, WebhookEvent, WebhookPayload};
