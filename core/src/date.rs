//! Date normalization for booking requests.
//!
//! Requests carry dates as `DD.MM.YY` tokens. This module turns such a token
//! into a canonical [`NaiveDate`] (four-digit year, no time component) and
//! rejects anything malformed, impossible, or already in the past.
//!
//! The two-digit year always expands into the 2000-2099 century.

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// `DD.MM.YY`, ASCII digits only.
#[allow(clippy::expect_used, reason = "constant pattern, covered by a unit test")]
static DATE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{2})\.([0-9]{2})\.([0-9]{2})$").expect("date token regex is valid")
});

/// Errors produced while normalizing a date token.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateError {
    /// The token does not have the `DD.MM.YY` shape.
    #[error("Malformed date, expected DD.MM.YY")]
    MalformedDate,

    /// The token has the right shape but names no real calendar day.
    #[error("Invalid calendar date")]
    InvalidCalendarDate,

    /// The date lies strictly before the day the request is evaluated.
    #[error("Date is in the past")]
    PastDate,
}

/// Parse a `DD.MM.YY` token into a calendar date without the past-date check.
///
/// # Errors
///
/// - [`DateError::MalformedDate`] when the token is not exactly `DD.MM.YY`
/// - [`DateError::InvalidCalendarDate`] when day/month/year form no real date
pub fn parse_date_token(token: &str) -> Result<NaiveDate, DateError> {
    let captures = DATE_TOKEN.captures(token).ok_or(DateError::MalformedDate)?;

    let field = |index: usize| -> Result<u32, DateError> {
        captures
            .get(index)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .ok_or(DateError::MalformedDate)
    };

    let day = field(1)?;
    let month = field(2)?;
    let year = 2000 + i32::try_from(field(3)?).map_err(|_| DateError::MalformedDate)?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or(DateError::InvalidCalendarDate)
}

/// Normalize a `DD.MM.YY` token against the evaluation day.
///
/// Used by both booking creation and cancellation: a date equal to `today`
/// is accepted, anything earlier is not.
///
/// # Errors
///
/// Everything [`parse_date_token`] returns, plus [`DateError::PastDate`].
pub fn normalize(token: &str, today: NaiveDate) -> Result<NaiveDate, DateError> {
    let date = parse_date_token(token)?;
    if date < today {
        return Err(DateError::PastDate);
    }
    Ok(date)
}

/// Render a canonical date back into the `DD.MM.YY` form users type.
#[must_use]
pub fn format_date_token(date: NaiveDate) -> String {
    date.format("%d.%m.%y").to_string()
}

/// ISO-8601 week number (Monday start) of a date.
#[must_use]
pub fn iso_week(date: NaiveDate) -> u32 {
    date.iso_week().week()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn date_token_pattern_compiles() {
        let pattern = LazyLock::force(&DATE_TOKEN);
        assert!(pattern.is_match("01.02.25"));
        assert!(!pattern.is_match("1.2.25"));
    }

    #[test]
    fn accepts_well_formed_future_date() {
        let today = ymd(2025, 6, 10);
        assert_eq!(normalize("25.12.25", today), Ok(ymd(2025, 12, 25)));
    }

    #[test]
    fn accepts_today() {
        let today = ymd(2025, 6, 10);
        assert_eq!(normalize("10.06.25", today), Ok(today));
    }

    #[test]
    fn rejects_yesterday() {
        let today = ymd(2025, 6, 10);
        assert_eq!(normalize("09.06.25", today), Err(DateError::PastDate));
    }

    #[test]
    fn rejects_wrong_shape() {
        let today = ymd(2025, 6, 10);
        for token in ["1-2-03", "1.2.03", "01.02.2003", "01.02.03 ", "", "aa.bb.cc", "01/02/03"] {
            assert_eq!(normalize(token, today), Err(DateError::MalformedDate), "{token}");
        }
    }

    #[test]
    fn rejects_non_ascii_digits() {
        // Arabic-Indic digits match `\d` but not the booking format.
        assert_eq!(parse_date_token("٠١.٠٢.٢٥"), Err(DateError::MalformedDate));
    }

    #[test]
    fn rejects_impossible_days() {
        assert_eq!(parse_date_token("31.13.99"), Err(DateError::InvalidCalendarDate));
        assert_eq!(parse_date_token("31.02.24"), Err(DateError::InvalidCalendarDate));
        assert_eq!(parse_date_token("00.01.25"), Err(DateError::InvalidCalendarDate));
    }

    #[test]
    fn calendar_check_runs_before_past_check() {
        let today = ymd(2099, 12, 31);
        assert_eq!(normalize("30.02.25", today), Err(DateError::InvalidCalendarDate));
    }

    #[test]
    fn leap_day_is_valid_only_in_leap_years() {
        assert_eq!(parse_date_token("29.02.24"), Ok(ymd(2024, 2, 29)));
        assert_eq!(parse_date_token("29.02.25"), Err(DateError::InvalidCalendarDate));
    }

    #[test]
    fn year_expands_into_this_century() {
        assert_eq!(parse_date_token("01.01.00"), Ok(ymd(2000, 1, 1)));
        assert_eq!(parse_date_token("31.12.99"), Ok(ymd(2099, 12, 31)));
    }

    #[test]
    fn format_round_trips_display_form() {
        assert_eq!(format_date_token(ymd(2025, 1, 5)), "05.01.25");
    }

    #[test]
    fn iso_week_uses_monday_start() {
        // 2024-12-30 is a Monday belonging to ISO week 1 of 2025.
        assert_eq!(iso_week(ymd(2024, 12, 30)), 1);
        assert_eq!(iso_week(ymd(2025, 6, 10)), 24);
        // 2021-01-03 is a Sunday still in week 53 of 2020.
        assert_eq!(iso_week(ymd(2021, 1, 3)), 53);
    }

    proptest! {
        #[test]
        fn every_real_date_in_range_parses(offset in 0i64..36_524) {
            let date = ymd(2000, 1, 1) + chrono::Duration::days(offset);
            prop_assert_eq!(parse_date_token(&format_date_token(date)), Ok(date));
        }

        #[test]
        fn arbitrary_text_never_panics(token in ".{0,12}") {
            let _ = parse_date_token(&token);
        }

        #[test]
        fn past_check_is_strict(offset in 1i64..3_000) {
            let today = ymd(2030, 6, 15);
            let past = today - chrono::Duration::days(offset);
            prop_assume!(past.year() >= 2000);
            prop_assert_eq!(normalize(&format_date_token(past), today), Err(DateError::PastDate));
        }
    }
}
