//! C5: "is it office hours" — Mon-Fri 09:00-17:00 US-Eastern, with a UTC
//! fallback if the Eastern zone table can't be resolved.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use std::str::FromStr;

const EASTERN_TZ_NAME: &str = "America/New_York";

pub struct BusinessHours;

impl BusinessHours {
    pub fn new() -> Self {
        Self
    }

    /// True iff `now` falls on a business day, Mon-Fri 09:00-17:00 in the
    /// relevant zone. Business-day check ignores clock time.
    pub fn is_office_hours(&self, now: DateTime<Utc>) -> bool {
        match chrono_tz::Tz::from_str(EASTERN_TZ_NAME) {
            Ok(tz) => {
                let local = now.with_timezone(&tz);
                Self::is_business_day(local.weekday()) && Self::in_clock_window(local.hour(), local.minute(), 9, 17)
            }
            Err(_) => {
                tracing::warn!("could not resolve {EASTERN_TZ_NAME}; falling back to UTC 14:00-22:00");
                Self::is_business_day(now.weekday()) && Self::in_clock_window(now.hour(), now.minute(), 14, 22)
            }
        }
    }

    fn is_business_day(weekday: Weekday) -> bool {
        !matches!(weekday, Weekday::Sat | Weekday::Sun)
    }

    /// `start_hour:00 <= time <= end_hour:00`, inclusive of the boundary
    /// minute so exactly 09:00 and 17:00 both count as office hours.
    fn in_clock_window(hour: u32, minute: u32, start_hour: u32, end_hour: u32) -> bool {
        let minutes_of_day = hour * 60 + minute;
        minutes_of_day >= start_hour * 60 && minutes_of_day <= end_hour * 60
    }
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self::new()
    }
}
