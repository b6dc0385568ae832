//! Wall-clock source and the date math behind the daily task reset.

use chrono::{DateTime, Days, Local, NaiveDate, NaiveTime, TimeZone, Timelike};

pub const DEFAULT_RESET_HOUR: u32 = 6;

pub trait Clock {
    fn now(&self) -> DateTime<Local>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// `date` at `hour:00:00` local time.
///
/// Falls forward to the first valid local time when the hour is skipped by a
/// DST change and takes the earlier instant when it is repeated.
pub fn reset_instant_on(date: NaiveDate, hour: u32) -> DateTime<Local> {
    let time = NaiveTime::from_hms_opt(hour.min(23), 0, 0).unwrap_or_default();
    let mut naive = date.and_time(time);
    // DST gaps are at most a few hours; step until the wall time exists.
    for _ in 0..=24 {
        if let Some(instant) = Local.from_local_datetime(&naive).earliest() {
            return instant;
        }
        naive += chrono::Duration::minutes(15);
    }
    Local.from_utc_datetime(&date.and_time(time))
}

pub fn todays_reset_instant(now: DateTime<Local>, hour: u32) -> DateTime<Local> {
    reset_instant_on(now.date_naive(), hour)
}

/// Today's boundary if it is still ahead of `now`, else tomorrow's.
pub fn next_reset_after(now: DateTime<Local>, hour: u32) -> DateTime<Local> {
    let today = todays_reset_instant(now, hour);
    if today > now {
        return today;
    }
    match now.date_naive().checked_add_days(Days::new(1)) {
        Some(tomorrow) => reset_instant_on(tomorrow, hour),
        None => today,
    }
}

/// True when the last wipe predates today's boundary and the boundary has passed.
pub fn is_reset_due(last_reset: DateTime<Local>, now: DateTime<Local>, hour: u32) -> bool {
    let boundary = todays_reset_instant(now, hour);
    last_reset < boundary && now >= boundary
}

/// `HH:MM` of a boundary, for display.
pub fn format_boundary(instant: DateTime<Local>) -> String {
    format!("{:02}:{:02}", instant.hour(), instant.minute())
}
