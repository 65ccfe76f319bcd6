use std::collections::HashMap;

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

/// Marker used in configuration for a window with no service.
pub const CLOSED_SENTINEL: &str = "CHIUSO";

const TIME_FORMAT: &str = "%H:%M";

/// One contiguous service window of a day, e.g. the morning shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawWindow", into = "RawWindow")]
pub enum WorkingWindow {
    Closed,
    Open { open: NaiveTime, close: NaiveTime },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawWindow {
    open: String,
    close: String,
}

impl WorkingWindow {
    pub fn parse(open: &str, close: &str) -> anyhow::Result<Self> {
        if open == CLOSED_SENTINEL || close == CLOSED_SENTINEL {
            return Ok(WorkingWindow::Closed);
        }
        Ok(WorkingWindow::Open {
            open: parse_time(open)?,
            close: parse_time(close)?,
        })
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, WorkingWindow::Closed)
    }
}

impl TryFrom<RawWindow> for WorkingWindow {
    type Error = anyhow::Error;

    fn try_from(raw: RawWindow) -> Result<Self, Self::Error> {
        WorkingWindow::parse(&raw.open, &raw.close)
    }
}

impl From<WorkingWindow> for RawWindow {
    fn from(window: WorkingWindow) -> Self {
        match window {
            WorkingWindow::Closed => RawWindow {
                open: CLOSED_SENTINEL.to_string(),
                close: CLOSED_SENTINEL.to_string(),
            },
            WorkingWindow::Open { open, close } => RawWindow {
                open: open.format(TIME_FORMAT).to_string(),
                close: close.format(TIME_FORMAT).to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayHours {
    pub morning: WorkingWindow,
    pub afternoon: WorkingWindow,
}

impl DayHours {
    pub const CLOSED: DayHours = DayHours {
        morning: WorkingWindow::Closed,
        afternoon: WorkingWindow::Closed,
    };

    pub fn windows(&self) -> [WorkingWindow; 2] {
        [self.morning, self.afternoon]
    }

    pub fn is_closed(&self) -> bool {
        self.morning.is_closed() && self.afternoon.is_closed()
    }
}

/// Weekly opening hours.
///
/// Lookups never fail: a weekday missing from the table resolves to the
/// fallback day's hours, and a missing fallback day resolves to a closed day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpeningHours {
    days: HashMap<Weekday, DayHours>,
}

impl OpeningHours {
    pub const FALLBACK_DAY: Weekday = Weekday::Mon;

    pub fn new(days: HashMap<Weekday, DayHours>) -> Self {
        Self { days }
    }

    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        let hours: OpeningHours = serde_json::from_str(s)?;
        Ok(hours)
    }

    pub fn hours_for(&self, weekday: Weekday) -> &DayHours {
        self.days
            .get(&weekday)
            .or_else(|| self.days.get(&Self::FALLBACK_DAY))
            .unwrap_or(&DayHours::CLOSED)
    }

    pub fn is_closed(&self, weekday: Weekday) -> bool {
        self.hours_for(weekday).is_closed()
    }

    /// Human readable table, Monday first.
    pub fn to_human_readable(&self) -> String {
        let mut day = Weekday::Mon;
        let mut lines = Vec::with_capacity(7);
        for _ in 0..7 {
            let hours = self.hours_for(day);
            let text = if hours.is_closed() {
                "closed".to_string()
            } else {
                hours
                    .windows()
                    .iter()
                    .filter_map(|w| match w {
                        WorkingWindow::Open { open, close } => Some(format!(
                            "{}-{}",
                            open.format(TIME_FORMAT),
                            close.format(TIME_FORMAT)
                        )),
                        WorkingWindow::Closed => None,
                    })
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            lines.push(format!("{day}: {text}"));
            day = day.succ();
        }
        lines.join("; ")
    }
}

fn parse_time(s: &str) -> anyhow::Result<NaiveTime> {
    NaiveTime::parse_from_str(s, TIME_FORMAT)
        .map_err(|_| anyhow::anyhow!("invalid time of day: {s}"))
}
