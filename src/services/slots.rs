use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Timelike};

use crate::models::{OpeningHours, WorkingWindow};

/// Bookable start times for a sequence of working windows.
///
/// Each open window yields `open`, `open + interval`, ... for as long as the
/// start is strictly before `close`; whether the last slot fits entirely
/// inside the window is not checked. Windows are concatenated in order and
/// overlapping windows may repeat a slot. An interval of zero is treated as
/// one minute.
pub fn generate_slots(windows: &[WorkingWindow], interval_minutes: u32) -> Vec<String> {
    let step = interval_minutes.max(1);
    let mut slots = Vec::new();

    for window in windows {
        let (open, close) = match window {
            WorkingWindow::Open { open, close } => (minutes_of(open), minutes_of(close)),
            WorkingWindow::Closed => continue,
        };

        let mut current = open;
        while current < close {
            slots.push(format!("{:02}:{:02}", current / 60, current % 60));
            match current.checked_add(step) {
                Some(next) => current = next,
                None => break,
            }
        }
    }

    slots
}

/// Slots for a calendar date, resolved through the weekly hours table.
pub fn slots_for_date(hours: &OpeningHours, date: NaiveDate, interval_minutes: u32) -> Vec<String> {
    generate_slots(&hours.hours_for(date.weekday()).windows(), interval_minutes)
}

/// The next `days` dates starting at `today` on which the shop is open.
pub fn bookable_dates(hours: &OpeningHours, today: NaiveDate, days: u32) -> Vec<NaiveDate> {
    (0..days)
        .map(|offset| today + Duration::days(i64::from(offset)))
        .filter(|date| !hours.is_closed(date.weekday()))
        .collect()
}

/// Whether `time` is one of the slots offered on `date`.
pub fn is_offered(hours: &OpeningHours, date: NaiveDate, time: &str, interval_minutes: u32) -> bool {
    slots_for_date(hours, date, interval_minutes)
        .iter()
        .any(|slot| slot == time)
}

fn minutes_of(t: &NaiveTime) -> u32 {
    t.hour() * 60 + t.minute()
}
