//! Wall-clock helpers. Attendance dates and times are local to the school,
//! offset from UTC by `UTC_OFFSET_MINUTES`.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use util::config;

pub fn to_local(at: DateTime<Utc>) -> NaiveDateTime {
    at.naive_utc() + Duration::minutes(config::utc_offset_minutes() as i64)
}

pub fn local_now() -> NaiveDateTime {
    to_local(Utc::now())
}

pub fn local_today() -> NaiveDate {
    local_now().date()
}
