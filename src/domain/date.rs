// Request date handling
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateRangeError {
    #[error("start_date and end_date parameters are required")]
    Missing,
    #[error("Invalid date format. Use DDMMYYYY.")]
    InvalidFormat,
}

/// Inclusive query window in the upstream API's timestamp format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

impl DateRange {
    /// Build a range from raw `DDMMYYYY` query parameters. Empty strings
    /// count as missing.
    pub fn from_query(start: Option<&str>, end: Option<&str>) -> Result<Self, DateRangeError> {
        let (start, end) = match (start, end) {
            (Some(s), Some(e)) if !s.is_empty() && !e.is_empty() => (s, e),
            _ => return Err(DateRangeError::Missing),
        };

        Ok(Self {
            start: convert_date_format(start)?,
            end: convert_date_format(end)?,
        })
    }
}

/// Leading day or month field of `width` digits, if it is in `1..=max`
fn leading_field(digits: &str, width: usize, max: u32) -> Option<u32> {
    let value: u32 = digits.get(..width)?.parse().ok()?;
    (1..=max).contains(&value).then_some(value)
}

/// `DDMMYYYY` -> `YYYY-MM-DDT00:00:00Z`
///
/// Day and month may drop their leading zero (`6082024` is 6 August 2024).
/// Two-digit fields are tried first, then one-digit ones; the year is always
/// the last four digits.
pub fn convert_date_format(input: &str) -> Result<String, DateRangeError> {
    if !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DateRangeError::InvalidFormat);
    }

    let (day, month, year) = [(2, 2), (2, 1), (1, 2), (1, 1)]
        .into_iter()
        .find_map(|(day_width, month_width)| {
            let day = leading_field(input, day_width, 31)?;
            let month = leading_field(&input[day_width..], month_width, 12)?;
            let year = &input[day_width + month_width..];
            (year.len() == 4).then_some((day, month, year))
        })
        .ok_or(DateRangeError::InvalidFormat)?;

    let year: i32 = year.parse().map_err(|_| DateRangeError::InvalidFormat)?;
    if year < 1 {
        return Err(DateRangeError::InvalidFormat);
    }

    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or(DateRangeError::InvalidFormat)?;
    Ok(date.format("%Y-%m-%dT00:00:00Z").to_string())
}
