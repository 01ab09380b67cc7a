//! Civil-time handling for New York trip records
//!
//! Raw TLC timestamps are naive wall-clock times in America/New_York. Buckets
//! are stored as UTC epoch microseconds tagged with that zone.

use chrono::{Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::America::New_York;
use chrono_tz::{OffsetComponents, Tz};

pub const CIVIL_TZ: Tz = New_York;
pub const CIVIL_TZ_NAME: &str = "America/New_York";

pub const MICROS_PER_HOUR: i64 = 3_600_000_000;

/// Resolve a naive local time to a UTC instant (epoch microseconds).
///
/// Ambiguous fall-back times resolve to the standard-time occurrence.
/// Spring-forward times that do not exist are shifted forward by one hour.
pub fn localize(naive: NaiveDateTime) -> i64 {
    match CIVIL_TZ.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.timestamp_micros(),
        LocalResult::Ambiguous(early, late) => {
            if early.offset().dst_offset() == Duration::zero() {
                early.timestamp_micros()
            } else {
                late.timestamp_micros()
            }
        }
        LocalResult::None => {
            let shifted = naive + Duration::hours(1);
            match CIVIL_TZ.from_local_datetime(&shifted) {
                LocalResult::Single(dt) => dt.timestamp_micros(),
                LocalResult::Ambiguous(_, late) => late.timestamp_micros(),
                // Never produced by New York rules; fall back to reading as UTC
                LocalResult::None => shifted.and_utc().timestamp_micros(),
            }
        }
    }
}

/// Floor a UTC instant to the start of its hour.
///
/// New York offsets are whole hours, so this is also the local hour start.
#[inline]
pub fn floor_to_hour(utc_micros: i64) -> i64 {
    utc_micros - utc_micros.rem_euclid(MICROS_PER_HOUR)
}

/// Hourly bucket for a naive local timestamp given as epoch microseconds.
pub fn hour_bucket(naive_micros: i64) -> Option<i64> {
    let naive = chrono::DateTime::from_timestamp_micros(naive_micros)?.naive_utc();
    Some(floor_to_hour(localize(naive)))
}

/// Last instant that still receives the fare-policy adjustment:
/// 2022-12-19T00:00:00 America/New_York, in UTC epoch microseconds.
pub fn fare_cutover_micros() -> i64 {
    let naive = NaiveDate::from_ymd_opt(2022, 12, 19)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();
    localize(naive)
}
