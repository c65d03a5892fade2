use time::{format_description::FormatItem, macros::format_description, Date, OffsetDateTime};

use crate::error::ApiError;

static DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// The calendar day entries and summaries are attributed to. Clients in other
/// timezones pass their local date explicitly.
pub fn today_utc() -> Date {
    OffsetDateTime::now_utc().date()
}

pub fn parse_iso_date(s: &str) -> Result<Date, ApiError> {
    Date::parse(s, DATE_FORMAT)
        .map_err(|_| ApiError::Validation(format!("invalid date: {s} (expected YYYY-MM-DD)")))
}

/// Query/body dates are optional; absent means "today".
pub fn resolve(date: Option<&str>) -> Result<Date, ApiError> {
    match date {
        Some(s) => parse_iso_date(s),
        None => Ok(today_utc()),
    }
}

pub fn format_iso_date(date: Date) -> String {
    date.format(DATE_FORMAT)
        .unwrap_or_else(|_| date.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn parses_iso_dates() {
        assert_eq!(parse_iso_date("2025-03-09").unwrap(), date!(2025 - 03 - 09));
    }

    #[test]
    fn rejects_malformed_dates() {
        for bad in ["2025-13-01", "09-03-2025", "yesterday", "2025/03/09", ""] {
            assert!(parse_iso_date(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn resolve_defaults_to_today() {
        assert_eq!(resolve(None).unwrap(), today_utc());
        assert_eq!(
            resolve(Some("2024-12-31")).unwrap(),
            date!(2024 - 12 - 31)
        );
    }

    #[test]
    fn formats_round_trip() {
        let d = date!(2025 - 01 - 02);
        assert_eq!(format_iso_date(d), "2025-01-02");
        assert_eq!(parse_iso_date(&format_iso_date(d)).unwrap(), d);
    }
}
