//! System clock

use chrono::{Local, NaiveDateTime};

use super::Clock;

/// Reads local system time; no timezone configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Format a timestamp as 12-hour time with an AM/PM marker, e.g. `03:04 PM`
#[must_use]
pub fn spoken_time(at: NaiveDateTime) -> String {
    at.format("%I:%M %p").to_string()
}
