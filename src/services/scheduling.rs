use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::models::{Barber, Booking, BookingStatus, OpeningHours};
use crate::services::slots;

#[derive(Debug, PartialEq, Eq)]
pub enum SchedulingError {
    ShopClosed { date: NaiveDate },
    SlotNotOffered { time: String },
    UnknownBarber { id: String },
    BarberAbsent { name: String },
    Conflict,
}

impl std::fmt::Display for SchedulingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulingError::ShopClosed { date } => {
                write!(f, "the shop is closed on {date}")
            }
            SchedulingError::SlotNotOffered { time } => {
                write!(f, "{time} is not an available appointment time on that day")
            }
            SchedulingError::UnknownBarber { id } => write!(f, "unknown barber: {id}"),
            SchedulingError::BarberAbsent { name } => {
                write!(f, "{name} does not work on that day")
            }
            SchedulingError::Conflict => {
                write!(f, "that time is already booked, please pick a different one")
            }
        }
    }
}

/// A proposed appointment.
#[derive(Debug, Clone, Copy)]
pub struct SlotRequest<'a> {
    pub date: NaiveDate,
    pub time: &'a str,
    pub duration_minutes: u32,
    pub barber_id: Option<&'a str>,
    /// Booking being moved, ignored when looking for conflicts.
    pub exclude_id: Option<&'a str>,
}

pub fn validate_booking_time(
    hours: &OpeningHours,
    interval_minutes: u32,
    team: &[Barber],
    bookings: &[Booking],
    request: &SlotRequest<'_>,
) -> Result<(), SchedulingError> {
    let weekday = request.date.weekday();
    if hours.is_closed(weekday) {
        return Err(SchedulingError::ShopClosed { date: request.date });
    }

    if !slots::is_offered(hours, request.date, request.time, interval_minutes) {
        return Err(SchedulingError::SlotNotOffered {
            time: request.time.to_string(),
        });
    }

    let Some(barber_id) = request.barber_id else {
        // Unassigned bookings are shared by the whole team.
        return Ok(());
    };

    let barber = team
        .iter()
        .find(|b| b.id == barber_id)
        .ok_or_else(|| SchedulingError::UnknownBarber {
            id: barber_id.to_string(),
        })?;

    if !barber.works_on(weekday) {
        return Err(SchedulingError::BarberAbsent {
            name: barber.name.clone(),
        });
    }

    let Some(start) = parse_start(request.date, request.time) else {
        return Err(SchedulingError::SlotNotOffered {
            time: request.time.to_string(),
        });
    };

    if overlaps_booking(
        bookings,
        barber_id,
        start,
        request.duration_minutes,
        request.exclude_id,
    ) {
        return Err(SchedulingError::Conflict);
    }

    Ok(())
}

/// The entries of `slots` where an appointment of `duration_minutes` with
/// `barber_id` would clash with a live booking. Mirrors the conflict check
/// of [`validate_booking_time`].
pub fn taken_slots(
    slots: &[String],
    bookings: &[Booking],
    date: NaiveDate,
    barber_id: &str,
    duration_minutes: u32,
) -> Vec<String> {
    slots
        .iter()
        .filter(|slot| {
            parse_start(date, slot).is_some_and(|start| {
                overlaps_booking(bookings, barber_id, start, duration_minutes, None)
            })
        })
        .cloned()
        .collect()
}

fn overlaps_booking(
    bookings: &[Booking],
    barber_id: &str,
    start: NaiveDateTime,
    duration_minutes: u32,
    exclude_id: Option<&str>,
) -> bool {
    let end = start + Duration::minutes(i64::from(duration_minutes.max(1)));

    bookings.iter().any(|booking| {
        if booking.status == BookingStatus::Cancelled
            || booking.date != start.date()
            || booking.barber_id.as_deref() != Some(barber_id)
            || Some(booking.id.as_str()) == exclude_id
        {
            return false;
        }
        let Some(other_start) = parse_start(booking.date, &booking.time) else {
            return false;
        };
        let other_end = other_start + Duration::minutes(i64::from(booking.total_duration.max(1)));
        // Overlap: other starts before proposed ends AND other ends after proposed starts
        other_start < end && other_end > start
    })
}

fn parse_start(date: NaiveDate, time: &str) -> Option<NaiveDateTime> {
    NaiveTime::parse_from_str(time, "%H:%M")
        .ok()
        .map(|t| date.and_time(t))
}
