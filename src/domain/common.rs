use chrono::{Datelike, NaiveDate};
use uuid::Uuid;

/// Identifies entities that expose a stable unique identifier.
pub trait Identifiable {
    fn id(&self) -> Uuid;
}

/// Provides access to a human-friendly entity name.
pub trait NamedEntity {
    fn name(&self) -> &str;
}

/// Supplies a presentation-ready label for UI or logs.
pub trait Displayable {
    fn display_label(&self) -> String;
}

/// Formats a date as its calendar-month key, e.g. `2024-07`.
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Parses a `YYYY-MM` month key into its year and month components.
pub fn parse_month_key(value: &str) -> Option<(i32, u32)> {
    let (year, month) = value.split_once('-')?;
    if year.len() != 4 || month.len() != 2 {
        return None;
    }
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    if (1..=12).contains(&month) {
        Some((year, month))
    } else {
        None
    }
}

/// Moves a date by whole calendar months, clamping the day to the first.
pub fn shift_month_start(date: NaiveDate, months: i32) -> NaiveDate {
    let index = date.year() * 12 + date.month() as i32 - 1 + months;
    let year = index.div_euclid(12);
    let month = index.rem_euclid(12) as u32 + 1;
    // Day 1 of any month is always valid.
    NaiveDate::from_ymd_opt(year, month, 1).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_key_pads_components() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(month_key(date), "2024-03");
    }

    #[test]
    fn parse_month_key_rejects_bad_input() {
        assert_eq!(parse_month_key("2024-07"), Some((2024, 7)));
        assert_eq!(parse_month_key("2024-13"), None);
        assert_eq!(parse_month_key("24-07"), None);
        assert_eq!(parse_month_key("garbage"), None);
    }

    #[test]
    fn shift_month_start_crosses_year_boundaries() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(
            shift_month_start(date, -2),
            NaiveDate::from_ymd_opt(2023, 11, 1).unwrap()
        );
        assert_eq!(
            shift_month_start(date, 12),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
        );
    }
}
