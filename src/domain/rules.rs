//! Field-level validation rules shared by the form schemas and the typed
//! records.

use chrono::NaiveDate;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use super::errors::{DomainError, DomainResult};

pub const DESCRIPTION_MIN_LEN: usize = 10;
pub const DATE_FORMAT: &str = "%d/%m/%Y";

pub const MSG_REQUIRED: &str = "Required field";
pub const MSG_INVALID_DATE: &str = "Invalid date, use DD/MM/YYYY";
pub const MSG_FUTURE_DATE: &str = "Date cannot be in the future";
pub const MSG_DATE_ORDER: &str = "End date must be on or after the start date";
pub const MSG_CURRENT_JOB_END: &str = "A current job ends at present";
pub const MSG_INVALID_EMAIL: &str = "Invalid e-mail address";
pub const MSG_INVALID_URL: &str = "Invalid address";
pub const MSG_INVALID_CHOICE: &str = "Select one of the options";

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
static URL_RE: OnceLock<Regex> = OnceLock::new();
static PHONE_RE: OnceLock<Regex> = OnceLock::new();
static DATE_RE: OnceLock<Regex> = OnceLock::new();

fn email_re() -> &'static Regex {
    EMAIL_RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"))
}

fn url_re() -> &'static Regex {
    URL_RE.get_or_init(|| {
        Regex::new(r"(?i)^(https?://)?[a-z0-9-]+(\.[a-z0-9-]+)*\.[a-z]{2,}(/\S*)?$").expect("valid url regex")
    })
}

fn phone_re() -> &'static Regex {
    PHONE_RE.get_or_init(|| Regex::new(r"^[0-9()+\s-]+$").expect("valid phone regex"))
}

/// Two-digit day and month, four-digit year, in either accepted order.
fn date_re() -> &'static Regex {
    DATE_RE.get_or_init(|| {
        Regex::new(r"^(\d{2}/\d{2}/\d{4}|\d{4}-\d{2}-\d{2})$").expect("valid date regex")
    })
}

/// Per-field validation messages, keyed by the field's schema key.
///
/// Only the first message recorded for a field is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: BTreeMap<&'static str, String>,
}

impl FieldErrors {
    pub fn insert(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.errors.iter().map(|(field, message)| (*field, message.as_str()))
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// Parses a `DD/MM/YYYY` date, also accepting ISO `YYYY-MM-DD`.
///
/// # Examples
///
/// ```
/// use cvwiz::domain::parse_date;
///
/// let date = parse_date("09/05/2022").unwrap();
/// assert_eq!(date.to_string(), "2022-05-09");
/// assert!(parse_date("31/02/2022").is_err());
/// ```
pub fn parse_date(input: &str) -> DomainResult<NaiveDate> {
    let trimmed = input.trim();
    if !date_re().is_match(trimmed) {
        return Err(DomainError::InvalidDate(trimmed.to_string()));
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y-%m-%d"))
        .map_err(|_| DomainError::InvalidDate(trimmed.to_string()))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Formats a phone number to the `(99) 9999-9999` / `(99) 99999-9999`
/// mask when it has the expected number of digits.
pub fn format_phone(input: &str, digits: usize) -> DomainResult<String> {
    if !phone_re().is_match(input.trim()) {
        return Err(DomainError::InvalidPhone(input.to_string()));
    }
    let numbers: String = input.chars().filter(char::is_ascii_digit).collect();
    if numbers.len() != digits {
        return Err(DomainError::InvalidPhone(input.to_string()));
    }
    let (area, rest) = numbers.split_at(2);
    let (head, tail) = rest.split_at(rest.len() - 4);
    Ok(format!("({area}) {head}-{tail}"))
}

pub fn phone_mask(digits: usize) -> String {
    let middle = "9".repeat(digits.saturating_sub(6));
    format!("(99) {middle}-9999")
}

pub fn is_valid_email(input: &str) -> bool {
    email_re().is_match(input.trim())
}

pub fn is_valid_url(input: &str) -> bool {
    url_re().is_match(input.trim())
}

pub fn check_required(errors: &mut FieldErrors, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        errors.insert(field, MSG_REQUIRED);
    }
}

pub fn check_min_len(errors: &mut FieldErrors, field: &'static str, value: &str, min: usize) {
    if value.trim().chars().count() < min {
        errors.insert(field, format!("Must contain at least {min} characters"));
    }
}

pub fn check_not_in_future(errors: &mut FieldErrors, field: &'static str, date: NaiveDate, today: NaiveDate) {
    if date > today {
        errors.insert(field, MSG_FUTURE_DATE);
    }
}

pub fn check_date_order(errors: &mut FieldErrors, end_field: &'static str, start: NaiveDate, end: NaiveDate) {
    if end < start {
        errors.insert(end_field, MSG_DATE_ORDER);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2023, 12, 1).unwrap();
        assert_eq!(parse_date("01/12/2023").unwrap(), expected);
        assert_eq!(parse_date(" 2023-12-01 ").unwrap(), expected);
        assert_eq!(
            parse_date("12/2023"),
            Err(DomainError::InvalidDate("12/2023".to_string()))
        );
        assert_eq!(format_date(expected), "01/12/2023");
    }

    #[test]
    fn test_parse_date_requires_four_digit_year() {
        assert!(parse_date("01/01/20").is_err());
        assert!(parse_date("1/1/2020").is_err());
        assert!(parse_date("20-01-01").is_err());
    }

    #[test]
    fn test_format_phone() {
        assert_eq!(format_phone("1133334444", 10).unwrap(), "(11) 3333-4444");
        assert_eq!(format_phone("(11) 98888-7777", 11).unwrap(), "(11) 98888-7777");
        assert!(format_phone("113333444", 10).is_err());
        assert!(format_phone("11 3333 abcd", 10).is_err());
        assert_eq!(phone_mask(10), "(99) 9999-9999");
        assert_eq!(phone_mask(11), "(99) 99999-9999");
    }

    #[test]
    fn test_email_and_url() {
        assert!(is_valid_email("ana@example.com"));
        assert!(!is_valid_email("ana@example"));
        assert!(!is_valid_email("ana example@x.com"));
        assert!(is_valid_url("https://github.com/ana"));
        assert!(is_valid_url("linkedin.com/in/ana"));
        assert!(!is_valid_url("not a url"));
    }

    #[test]
    fn test_field_errors_keep_first_message() {
        let mut errors = FieldErrors::default();
        errors.insert("startDate", MSG_REQUIRED);
        errors.insert("startDate", MSG_FUTURE_DATE);
        errors.insert("endDate", MSG_DATE_ORDER);
        assert_eq!(errors.get("startDate"), Some(MSG_REQUIRED));
        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors.to_string(),
            format!("endDate: {MSG_DATE_ORDER}; startDate: {MSG_REQUIRED}")
        );
    }

    #[test]
    fn test_min_len_counts_characters() {
        let mut errors = FieldErrors::default();
        check_min_len(&mut errors, "description", "ações ações", 10);
        assert!(errors.is_empty());
        check_min_len(&mut errors, "description", "   short   ", 10);
        assert!(errors.get("description").is_some());
    }
}
