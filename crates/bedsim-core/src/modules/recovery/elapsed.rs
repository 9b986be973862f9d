use chrono::{Datelike, NaiveDate};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn parse_treatment_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT).ok()
}

/// Whole months from `start` to `end`.
///
/// Counts calendar months and drops the last one when `end`'s day of month
/// is before `start`'s. `end` before `start` yields `None`.
pub fn months_between(start: NaiveDate, end: NaiveDate) -> Option<u32> {
    if end < start {
        return None;
    }

    let years = i64::from(end.year()) - i64::from(start.year());
    let months = i64::from(end.month()) - i64::from(start.month());
    let mut elapsed = years * 12 + months;
    if end.day() < start.day() {
        elapsed -= 1;
    }

    u32::try_from(elapsed).ok()
}

pub fn months_between_dates(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<u32> {
    months_between(start?, end?)
}

/// Same as [`months_between`] for `YYYY-MM-DD` text; unparsable dates yield
/// `None`.
pub fn months_between_text(start: &str, end: &str) -> Option<u32> {
    months_between(parse_treatment_date(start)?, parse_treatment_date(end)?)
}
