//! Local civil time helpers (WIB, fixed UTC+7)

use chrono::{DateTime, FixedOffset, NaiveDateTime, SubsecRound, Utc};

/// WIB is UTC+7 with no daylight saving
const WIB_OFFSET_SECS: i32 = 7 * 3600;

pub fn wib_offset() -> FixedOffset {
    FixedOffset::east_opt(WIB_OFFSET_SECS).expect("Invalid WIB offset")
}

/// Current WIB civil time truncated to whole seconds
pub fn now_wib() -> NaiveDateTime {
    to_wib(Utc::now())
}

pub fn to_wib(instant: DateTime<Utc>) -> NaiveDateTime {
    instant.with_timezone(&wib_offset()).naive_local().trunc_subsecs(0)
}

/// Spreadsheet / display format of a report timestamp
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}
