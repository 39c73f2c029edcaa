//! Field validators: pure, storage-free, one per constrained field.
//!
//! Each returns the structured failure for its field; callers accumulate
//! every failure into one `EngineError::Invalid` rather than stopping at
//! the first.

use std::sync::LazyLock;

use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use regex::Regex;
use rust_decimal::Decimal;

use crate::limits::*;
use crate::model::duration_from_fields;

use super::error::{FieldIssue, IssueCode};

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(\d{2}\) \d{4,5}-\d{4}$").unwrap());

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());

pub(crate) fn name(field: &'static str, value: &str) -> Result<(), FieldIssue> {
    if value.trim().is_empty() {
        return Err(FieldIssue::new(field, IssueCode::Required, "must not be empty"));
    }
    if value.chars().count() > MAX_NAME_LEN {
        return Err(FieldIssue::new(
            field,
            IssueCode::TooLong,
            format!("must be at most {MAX_NAME_LEN} characters"),
        ));
    }
    Ok(())
}

pub(crate) fn text(field: &'static str, value: Option<&str>) -> Result<(), FieldIssue> {
    match value {
        Some(v) if v.chars().count() > MAX_TEXT_LEN => Err(FieldIssue::new(
            field,
            IssueCode::TooLong,
            format!("must be at most {MAX_TEXT_LEN} characters"),
        )),
        _ => Ok(()),
    }
}

pub(crate) fn email(value: &str) -> Result<(), FieldIssue> {
    if EMAIL_RE.is_match(value) {
        Ok(())
    } else {
        Err(FieldIssue::new(
            "email",
            IssueCode::InvalidFormat,
            "not a valid email address",
        ))
    }
}

pub(crate) fn phone(value: &str) -> Result<(), FieldIssue> {
    if PHONE_RE.is_match(value) {
        Ok(())
    } else {
        Err(FieldIssue::new(
            "phone",
            IssueCode::InvalidFormat,
            "expected format: (11) 99999-9999",
        ))
    }
}

/// Checksum-free national id check: exactly 11 digits (mask characters are
/// ignored, the stored value keeps whatever mask was typed) and not all
/// digits identical.
pub(crate) fn national_id(value: &str) -> Result<(), FieldIssue> {
    let digits: Vec<char> = value.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != 11 {
        return Err(FieldIssue::new(
            "national_id",
            IssueCode::InvalidFormat,
            "must contain exactly 11 digits",
        ));
    }
    if digits.iter().all(|&c| c == digits[0]) {
        return Err(FieldIssue::new(
            "national_id",
            IssueCode::InvalidFormat,
            "all digits are identical",
        ));
    }
    Ok(())
}

pub(crate) fn birth_date(date: NaiveDate, today: NaiveDate) -> Result<(), FieldIssue> {
    if date > today {
        return Err(FieldIssue::new(
            "birth_date",
            IssueCode::FutureDate,
            "birth date cannot be in the future",
        ));
    }
    let mut age = today.year() - date.year();
    if (today.month(), today.day()) < (date.month(), date.day()) {
        age -= 1;
    }
    if age < MIN_CLIENT_AGE_YEARS {
        return Err(FieldIssue::new(
            "birth_date",
            IssueCode::TooYoung,
            format!("client must be at least {MIN_CLIENT_AGE_YEARS} year(s) old"),
        ));
    }
    Ok(())
}

pub(crate) fn booking_date(date: NaiveDate, today: NaiveDate) -> Result<(), FieldIssue> {
    if date < today {
        Err(FieldIssue::new(
            "date",
            IssueCode::PastDate,
            "cannot book a past date",
        ))
    } else {
        Ok(())
    }
}

pub(crate) fn window(start: NaiveTime, end: NaiveTime) -> Result<(), FieldIssue> {
    if end <= start {
        Err(FieldIssue::new(
            "end_time",
            IssueCode::InvalidWindow,
            "end time must be after start time",
        ))
    } else {
        Ok(())
    }
}

pub(crate) fn money(field: &'static str, value: Decimal) -> Result<(), FieldIssue> {
    if value < Decimal::ZERO {
        Err(FieldIssue::new(field, IssueCode::Negative, "must not be negative"))
    } else {
        Ok(())
    }
}

/// The two bounded duration inputs, combined. Out-of-range fields are
/// reported individually; a zero total is its own failure.
pub(crate) fn duration_fields(hours: i64, minutes: i64) -> Result<Duration, Vec<FieldIssue>> {
    let mut issues = Vec::new();
    if !(0..=MAX_DURATION_HOURS).contains(&hours) {
        issues.push(FieldIssue::new(
            "duration_hours",
            IssueCode::OutOfRange,
            format!("must be between 0 and {MAX_DURATION_HOURS}"),
        ));
    }
    if !(0..=MAX_DURATION_MINUTES).contains(&minutes) {
        issues.push(FieldIssue::new(
            "duration_minutes",
            IssueCode::OutOfRange,
            format!("must be between 0 and {MAX_DURATION_MINUTES}"),
        ));
    }
    if !issues.is_empty() {
        return Err(issues);
    }
    match duration_from_fields(hours, minutes) {
        Some(d) if d > Duration::zero() => Ok(d),
        _ => Err(vec![FieldIssue::new(
            "duration",
            IssueCode::EmptyDuration,
            "duration must be greater than zero",
        )]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn national_id_accepts_eleven_distinct_digits() {
        assert!(national_id("123.456.789-09").is_ok());
        assert!(national_id("12345678909").is_ok()); // unmasked, still 11 digits
    }

    #[test]
    fn national_id_rejects_wrong_digit_count() {
        let err = national_id("123.456.789-0").unwrap_err(); // 10 digits
        assert_eq!(err.code, IssueCode::InvalidFormat);
        assert!(national_id("123.456.789-091").is_err()); // 12 digits
        assert!(national_id("").is_err());
    }

    #[test]
    fn national_id_rejects_identical_digits() {
        let err = national_id("111.111.111-11").unwrap_err();
        assert_eq!(err.code, IssueCode::InvalidFormat);
        assert!(err.message.contains("identical"));
    }

    #[test]
    fn phone_format() {
        assert!(phone("(11) 99999-9999").is_ok());
        assert!(phone("(11) 9999-9999").is_ok()); // landline, 4 digits
        assert!(phone("11 99999-9999").is_err());
        assert!(phone("(11)99999-9999").is_err());
    }

    #[test]
    fn email_format() {
        assert!(email("maria@example.com").is_ok());
        assert!(email("not-an-email").is_err());
        assert!(email("a@b").is_err());
    }

    #[test]
    fn birth_date_rules() {
        let today = d(2025, 3, 10);
        assert!(birth_date(d(1990, 6, 15), today).is_ok());
        assert_eq!(
            birth_date(d(2025, 3, 11), today).unwrap_err().code,
            IssueCode::FutureDate
        );
        // Born five months ago: age 0.
        assert_eq!(
            birth_date(d(2024, 10, 1), today).unwrap_err().code,
            IssueCode::TooYoung
        );
        // Exactly one year old today.
        assert!(birth_date(d(2024, 3, 10), today).is_ok());
    }

    #[test]
    fn booking_date_rules() {
        let today = d(2025, 3, 10);
        assert!(booking_date(today, today).is_ok()); // same day allowed
        assert!(booking_date(d(2025, 3, 11), today).is_ok());
        assert_eq!(
            booking_date(d(2025, 3, 9), today).unwrap_err().code,
            IssueCode::PastDate
        );
    }

    #[test]
    fn window_end_after_start() {
        assert!(window(t(14, 0), t(14, 30)).is_ok());
        assert_eq!(
            window(t(14, 0), t(14, 0)).unwrap_err().code,
            IssueCode::InvalidWindow
        );
        assert!(window(t(14, 30), t(14, 0)).is_err());
    }

    #[test]
    fn duration_fields_accumulate_both_range_issues() {
        let issues = duration_fields(24, 60).unwrap_err();
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.code == IssueCode::OutOfRange));
    }

    #[test]
    fn duration_fields_reject_zero_total() {
        let issues = duration_fields(0, 0).unwrap_err();
        assert_eq!(issues[0].code, IssueCode::EmptyDuration);
        assert!(duration_fields(0, 30).is_ok());
    }

    #[test]
    fn money_sign() {
        assert!(money("price", Decimal::ZERO).is_ok());
        assert!(money("price", Decimal::new(5000, 2)).is_ok());
        assert_eq!(
            money("price", Decimal::new(-1, 2)).unwrap_err().code,
            IssueCode::Negative
        );
    }

    #[test]
    fn field_issue_serializes_for_presentation() {
        let issue = FieldIssue::new("phone", IssueCode::InvalidFormat, "bad format");
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["field"], "phone");
        assert_eq!(json["code"], "invalid_format");
        assert_eq!(json["message"], "bad format");
    }
}
