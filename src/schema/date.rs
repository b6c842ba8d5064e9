//! Check-off date parsing
//!
//! Check-offs are recorded with an optional time of day, which is irrelevant to
//! streaks. Every accepted form is truncated to its calendar date.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};

use super::ValidationError;

/// Date-only format used by the snapshot schema
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Date-time forms accepted alongside plain dates
const DATE_TIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];

/// Parse a check-off date, truncating any time of day
pub fn parse_check_off_date(value: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
        return Ok(date);
    }

    for format in DATE_TIME_FORMATS {
        if let Ok(date_time) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(date_time.date());
        }
    }

    // Offset timestamps keep the calendar date of their own offset
    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.date_naive())
        .map_err(|_| ValidationError::InvalidDate {
            value: value.to_string(),
            reason: "expected YYYY-MM-DD, optionally followed by a time of day".to_string(),
        })
}

/// Today's calendar date in the user's local time zone
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse a check-off date and reject dates after `today`
pub fn validate_check_off_date(value: &str, today: NaiveDate) -> Result<NaiveDate, ValidationError> {
    let date = parse_check_off_date(value)?;
    if date > today {
        return Err(ValidationError::FutureDate { date, today });
    }
    Ok(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn test_parse_plain_date() {
        assert_eq!(parse_check_off_date("2021-11-02").unwrap(), date("2021-11-02"));
        assert_eq!(parse_check_off_date(" 2021-11-02 ").unwrap(), date("2021-11-02"));
    }

    #[test]
    fn test_parse_truncates_time_of_day() {
        assert_eq!(parse_check_off_date("2021-11-03 19:27").unwrap(), date("2021-11-03"));
        assert_eq!(parse_check_off_date("2021-11-03 23:59:59").unwrap(), date("2021-11-03"));
        assert_eq!(parse_check_off_date("2021-11-03T05:21:00").unwrap(), date("2021-11-03"));
        assert_eq!(
            parse_check_off_date("2021-11-03T23:30:00-05:00").unwrap(),
            date("2021-11-03")
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for value in ["", "yesterday", "2021-13-01", "2021-02-30", "11/03/2021"] {
            let err = parse_check_off_date(value).unwrap_err();
            assert!(matches!(err, ValidationError::InvalidDate { .. }), "{value}");
        }
    }

    #[test]
    fn test_local_today_is_not_in_the_future() {
        let today = local_today();
        let stamped = today.format(DATE_FORMAT).to_string();
        assert_eq!(validate_check_off_date(&stamped, today).unwrap(), today);

        let tomorrow = (today + chrono::Duration::days(1)).format(DATE_FORMAT).to_string();
        assert!(validate_check_off_date(&tomorrow, today).is_err());
    }

    #[test]
    fn test_future_dates_rejected() {
        let today = date("2021-11-30");
        assert!(validate_check_off_date("2021-11-30 08:21", today).is_ok());

        let err = validate_check_off_date("2021-12-01", today).unwrap_err();
        assert!(matches!(err, ValidationError::FutureDate { .. }));
        assert!(err.to_string().contains("2021-12-01"));
    }
}
