use chrono::{DateTime, Datelike, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike};
use chrono_tz::Tz;

use super::error::DateFormatError;

/// Annotation the roster export appends to local times.
const LOCAL_TIME_MARKER: &str = "(LT)";

const DATE_TIME_LAYOUT: &str = "%d/%m/%Y %H:%M";
const DATE_LAYOUT: &str = "%d/%m/%Y";

/// A roster date and time of day, interpreted in the calendar's zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    pub fn date(&self) -> NaiveDate {
        self.0.date()
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn naive(&self) -> NaiveDateTime {
        self.0
    }

    /// Attach `tz` to the wall-clock value. Ambiguous times (DST fall-back)
    /// resolve to the earlier instant; skipped times are rejected.
    pub fn localize(&self, tz: Tz) -> Result<DateTime<Tz>, DateFormatError> {
        match tz.from_local_datetime(&self.0) {
            LocalResult::Single(value) => Ok(value),
            LocalResult::Ambiguous(earliest, _) => Ok(earliest),
            LocalResult::None => Err(DateFormatError {
                input: format!("{} ({})", self.0.format(DATE_TIME_LAYOUT), tz.name()),
            }),
        }
    }
}

/// Parses `dd/mm/yyyy HH:MM` or `dd/mm/yyyy`, ignoring a trailing `(LT)`.
pub fn parse_date(value: &str) -> Result<Timestamp, DateFormatError> {
    let trimmed = value.trim();
    let cleaned = trimmed
        .strip_suffix(LOCAL_TIME_MARKER)
        .unwrap_or(trimmed)
        .trim();

    if let Ok(date_time) = NaiveDateTime::parse_from_str(cleaned, DATE_TIME_LAYOUT) {
        return Ok(Timestamp(date_time));
    }
    if let Ok(date) = NaiveDate::parse_from_str(cleaned, DATE_LAYOUT) {
        return Ok(Timestamp(date.and_time(NaiveTime::MIN)));
    }
    Err(DateFormatError {
        input: cleaned.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd_hm(timestamp: &Timestamp) -> (i32, u32, u32, u32, u32) {
        let naive = timestamp.naive();
        (
            naive.year(),
            naive.month(),
            naive.day(),
            naive.hour(),
            naive.minute(),
        )
    }

    #[test]
    fn test_parse_date_and_time() {
        let parsed = parse_date("01/06/2024 08:00").unwrap();
        assert_eq!(ymd_hm(&parsed), (2024, 6, 1, 8, 0));

        let parsed = parse_date("31/12/2023 23:59").unwrap();
        assert_eq!(ymd_hm(&parsed), (2023, 12, 31, 23, 59));
    }

    #[test]
    fn test_date_only_defaults_to_midnight() {
        let parsed = parse_date("15/03/2024").unwrap();
        assert_eq!(ymd_hm(&parsed), (2024, 3, 15, 0, 0));
    }

    #[test]
    fn test_local_time_marker_is_stripped() {
        let parsed = parse_date("  02/07/2024 14:35 (LT) ").unwrap();
        assert_eq!(ymd_hm(&parsed), (2024, 7, 2, 14, 35));

        let parsed = parse_date("02/07/2024 (LT)").unwrap();
        assert_eq!(ymd_hm(&parsed), (2024, 7, 2, 0, 0));
    }

    #[test]
    fn test_two_digit_year_is_taken_literally() {
        let parsed = parse_date("01/06/24 08:00").unwrap();
        assert_eq!(parsed.year(), 24);
        assert_eq!(parsed.month(), 6);
    }

    #[test]
    fn test_unparseable_dates_are_rejected() {
        for input in ["2024-13-40", "", "32/01/2024", "01/13/2024 10:00", "01/06/2024 25:00"] {
            let err = parse_date(input).unwrap_err();
            assert_eq!(err.input, input.trim());
        }
    }

    #[test]
    fn test_trailing_garbage_is_rejected() {
        assert!(parse_date("01/06/2024 08:00 extra").is_err());
    }

    #[test]
    fn test_localize_in_madrid() {
        let summer = parse_date("01/06/2024 08:00").unwrap();
        let local = summer.localize(chrono_tz::Europe::Madrid).unwrap();
        assert_eq!(local.naive_utc().hour(), 6);

        // 02:30 on the last Sunday of March does not exist in Madrid.
        let skipped = parse_date("31/03/2024 02:30").unwrap();
        assert!(skipped.localize(chrono_tz::Europe::Madrid).is_err());

        // 02:30 on the last Sunday of October happens twice; the first wins.
        let repeated = parse_date("27/10/2024 02:30").unwrap();
        let local = repeated.localize(chrono_tz::Europe::Madrid).unwrap();
        assert_eq!(local.naive_utc().hour(), 0);
    }
}
