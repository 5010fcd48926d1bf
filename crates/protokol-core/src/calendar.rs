//! Calendar arithmetic for protocol dates.
//!
//! All protocol dates are plain calendar dates (`NaiveDate`), so weekend
//! detection and business-day stepping never cross a timezone or DST
//! boundary. Month keys use the `YYYY-MM` form shared with the store.

use chrono::{Datelike, Days, NaiveDate, Weekday};

use crate::error::{ProtocolError, Result};

/// Polish month names, indexed by `month0`. Used for document headers.
const MONTH_NAMES: [&str; 12] = [
    "Styczeń",
    "Luty",
    "Marzec",
    "Kwiecień",
    "Maj",
    "Czerwiec",
    "Lipiec",
    "Sierpień",
    "Wrzesień",
    "Październik",
    "Listopad",
    "Grudzień",
];

/// True for Saturday and Sunday.
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// The next business day strictly after `date`.
///
/// Always increments first, then skips forward over a weekend, so the
/// result is never `date` itself even when `date` is a weekday.
pub fn next_business_day(date: NaiveDate) -> NaiveDate {
    let mut next = date + Days::new(1);
    while is_weekend(next) {
        next = next + Days::new(1);
    }
    next
}

/// Advance a weekend date to the following Monday; weekdays pass through.
///
/// Used to fix up operator-entered return dates.
pub fn normalize_to_business_day(date: NaiveDate) -> NaiveDate {
    let mut day = date;
    while is_weekend(day) {
        day = day + Days::new(1);
    }
    day
}

/// The `YYYY-MM` month key a date belongs to.
pub fn month_key_of(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Validate and normalize a month key.
///
/// Accepts `YYYY-MM` and the sloppy `YYYY-M` form (padded to two
/// digits); anything else is rejected.
pub fn normalize_month(raw: &str) -> Result<String> {
    let value = raw.trim();
    let (year, month) = value
        .split_once('-')
        .ok_or_else(|| ProtocolError::InvalidInput(format!("Invalid month: {value:?}")))?;
    if year.len() != 4 || year.chars().any(|c| !c.is_ascii_digit()) {
        return Err(ProtocolError::InvalidInput(format!(
            "Invalid month: {value:?}"
        )));
    }
    let month_num: u32 = month
        .parse()
        .map_err(|_| ProtocolError::InvalidInput(format!("Invalid month: {value:?}")))?;
    if !(1..=12).contains(&month_num) || month.len() > 2 {
        return Err(ProtocolError::InvalidInput(format!(
            "Invalid month: {value:?}"
        )));
    }
    Ok(format!("{year}-{month_num:02}"))
}

/// Parse an ISO `YYYY-MM-DD` calendar date.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ProtocolError::InvalidInput(format!("Invalid date: {:?}", raw.trim())))
}

/// Render a date in the `dd.mm.yyyy` form used on printed protocols.
pub fn display_date(date: NaiveDate) -> String {
    format!(
        "{:02}.{:02}.{:04}",
        date.day(),
        date.month(),
        date.year()
    )
}

/// Human label for a month key, e.g. `"Marzec 2024"`.
///
/// Falls back to the raw key when it does not parse.
pub fn month_label(month_key: &str) -> String {
    let Some((year, month)) = month_key.split_once('-') else {
        return month_key.to_string();
    };
    match month.parse::<usize>() {
        Ok(m) if (1..=12).contains(&m) => format!("{} {}", MONTH_NAMES[m - 1], year),
        _ => month_key.to_string(),
    }
}
