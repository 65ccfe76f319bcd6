pub mod bookings;
pub mod notifications;
pub mod scheduling;
pub mod slots;
pub mod webhook;
