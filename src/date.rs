use crate::error::{Result, ScrapeError};
use serde::Deserialize;
use time::macros::format_description;
use time::{Date, Month, PrimitiveDateTime};

/// A date as it reaches the resolver: raw "YYYY MM DD" text from an input
/// file, or an already-parsed date from the interactive prompts.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum DateInput {
    Text(String),
    Date(Date),
}

impl From<String> for DateInput {
    fn from(s: String) -> Self {
        DateInput::Text(s)
    }
}

impl From<Date> for DateInput {
    fn from(d: Date) -> Self {
        DateInput::Date(d)
    }
}

impl DateInput {
    pub fn resolve(&self) -> Result<Date> {
        match self {
            DateInput::Text(s) => parse_ymd(s),
            DateInput::Date(d) => Ok(*d),
        }
    }
}

/// Parse a whitespace-separated "YYYY MM DD" string.
pub fn parse_ymd(s: &str) -> Result<Date> {
    let parts: Vec<_> = s.split_whitespace().collect();
    if parts.len() != 3 {
        return Err(ScrapeError::date(s, format!("expected 3 fields (YYYY MM DD), got {}", parts.len())));
    }
    let year: i32 = parts[0].parse().map_err(|_| ScrapeError::date(s, "invalid year"))?;
    let month: u8 = parts[1].parse().map_err(|_| ScrapeError::date(s, "invalid month"))?;
    let day: u8 = parts[2].parse().map_err(|_| ScrapeError::date(s, "invalid day"))?;
    let month = Month::try_from(month).map_err(|_| ScrapeError::date(s, "month must be 01..12"))?;
    Date::from_calendar_date(year, month, day).map_err(|e| ScrapeError::date(s, e.to_string()))
}

/// Same day next month, clamped to the last day of a shorter month.
/// December rolls over into January of the following year.
pub fn add_one_month(date: Date) -> Date {
    let (year, month) = match date.month() {
        Month::December => (date.year() + 1, Month::January),
        m => (date.year(), m.next()),
    };
    let day = date.day().min(month.length(year));
    Date::from_calendar_date(year, month, day).unwrap_or(date)
}

/// Window bounds compare against the start of the day.
#[inline]
pub fn day_start(date: Date) -> PrimitiveDateTime {
    date.midnight()
}

/// "YYYY-MM-DD HH:MM:SS", the layout written to the CSV.
pub fn format_timestamp(ts: PrimitiveDateTime) -> String {
    let fmt = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    ts.format(&fmt).unwrap_or_else(|_| ts.to_string())
}

/// Render a date the way the prompts ask for it.
pub fn format_ymd(date: Date) -> String {
    format!("{:04} {:02} {:02}", date.year(), u8::from(date.month()), date.day())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn parses_space_separated_date() {
        assert_eq!(parse_ymd("2022 06 15").unwrap(), date!(2022 - 06 - 15));
        assert_eq!(parse_ymd("  2022   6  5 ").unwrap(), date!(2022 - 06 - 05));
    }

    #[test]
    fn rejects_wrong_arity_and_bad_fields() {
        assert!(matches!(parse_ymd("2022 13"), Err(ScrapeError::DateParse { .. })));
        assert!(parse_ymd("2022 13 01").is_err());
        assert!(parse_ymd("2022 02 30").is_err());
        assert!(parse_ymd("twenty 01 01").is_err());
        assert!(parse_ymd("").is_err());
        assert!(parse_ymd("2022 01 01 10").is_err());
    }

    #[test]
    fn one_month_later_clamps_and_rolls_over() {
        assert_eq!(add_one_month(date!(2022 - 01 - 01)), date!(2022 - 02 - 01));
        assert_eq!(add_one_month(date!(2022 - 01 - 31)), date!(2022 - 02 - 28));
        assert_eq!(add_one_month(date!(2024 - 01 - 30)), date!(2024 - 02 - 29));
        assert_eq!(add_one_month(date!(2022 - 12 - 15)), date!(2023 - 01 - 15));
    }

    #[test]
    fn timestamp_layout() {
        assert_eq!(format_timestamp(datetime!(2022-01-20 09:05:03)), "2022-01-20 09:05:03");
        assert_eq!(format_ymd(date!(2022 - 03 - 04)), "2022 03 04");
    }

    #[test]
    fn date_input_resolves_both_shapes() {
        let text: DateInput = serde_json::from_str("\"2022 01 02\"").unwrap();
        assert_eq!(text.resolve().unwrap(), date!(2022 - 01 - 02));
        assert_eq!(DateInput::from(date!(2021 - 05 - 06)).resolve().unwrap(), date!(2021 - 05 - 06));
    }
}
