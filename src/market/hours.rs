//! US equity regular trading hours.
//!
//! Eastern time is derived from the US daylight saving rule (second Sunday
//! of March to first Sunday of November, switching at 02:00 local). Exchange
//! holidays are not modeled.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc, Weekday};

use crate::config::{MARKET_CLOSE_HOUR, MARKET_CLOSE_MINUTE, MARKET_OPEN_HOUR, MARKET_OPEN_MINUTE};

const EDT_OFFSET_SECS: i32 = -4 * 3600;
const EST_OFFSET_SECS: i32 = -5 * 3600;

fn nth_sunday(year: i32, month: u32, n: u8) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, Weekday::Sun, n)
}

/// UTC instants at which daylight saving starts and ends in `year`.
fn dst_bounds(year: i32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    // 02:00 EST is 07:00 UTC; 02:00 EDT is 06:00 UTC.
    let start = nth_sunday(year, 3, 2)?.and_hms_opt(7, 0, 0)?;
    let end = nth_sunday(year, 11, 1)?.and_hms_opt(6, 0, 0)?;
    Some((Utc.from_utc_datetime(&start), Utc.from_utc_datetime(&end)))
}

/// Offset of US Eastern time from UTC at `instant`.
pub fn eastern_offset(instant: DateTime<Utc>) -> FixedOffset {
    let in_dst = dst_bounds(instant.year())
        .map(|(start, end)| instant >= start && instant < end)
        .unwrap_or(false);
    let secs = if in_dst { EDT_OFFSET_SECS } else { EST_OFFSET_SECS };
    // Both constants are well within the valid range.
    FixedOffset::east_opt(secs).unwrap_or_else(|| Utc.fix())
}

/// `instant` in US Eastern time.
pub fn to_eastern(instant: DateTime<Utc>) -> DateTime<FixedOffset> {
    instant.with_timezone(&eastern_offset(instant))
}

/// True on weekdays between 09:30 (inclusive) and 16:00 (exclusive) Eastern.
pub fn is_market_open(instant: DateTime<Utc>) -> bool {
    let local = to_eastern(instant);
    if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
        return false;
    }

    let (Some(open), Some(close)) = (
        NaiveTime::from_hms_opt(MARKET_OPEN_HOUR, MARKET_OPEN_MINUTE, 0),
        NaiveTime::from_hms_opt(MARKET_CLOSE_HOUR, MARKET_CLOSE_MINUTE, 0),
    ) else {
        return false;
    };

    let time = local.time();
    time >= open && time < close
}

/// The Eastern trading date for `instant`.
pub fn trading_date(instant: DateTime<Utc>) -> NaiveDate {
    to_eastern(instant).date_naive()
}
