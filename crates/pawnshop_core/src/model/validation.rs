//! Field validation rules for client records.
//!
//! # Responsibility
//! - Provide one pure, stateless check per client field.
//! - Report the offending field and rule through `ClientValidationError`.
//!
//! # Invariants
//! - Checks never mutate input and never consult stored records.
//! - Date-dependent checks take `today` explicitly in their `_on` variants.

use crate::model::client::{age_between, ClientId, Gender};
use chrono::{Local, Months, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 255;
pub const EMAIL_MAX_CHARS: usize = 255;
pub const PHONE_DIGITS: usize = 11;
pub const MIN_AGE: i32 = 14;
pub const MAX_AGE: i32 = 150;

static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Zа-яА-ЯёЁ\- ]+$").expect("valid name regex"));
static PASSPORT_SERIES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}$").expect("valid passport series regex"));
static PASSPORT_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{6}$").expect("valid passport number regex"));
// WHATWG "valid e-mail address" grammar.
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"#,
    )
    .expect("valid email regex")
});

/// Name-like field identifier used in validation messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameField {
    LastName,
    FirstName,
    Patronymic,
}

impl NameField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LastName => "last_name",
            Self::FirstName => "first_name",
            Self::Patronymic => "patronymic",
        }
    }
}

/// Single-field rule violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientValidationError {
    /// Required name field is empty or whitespace-only.
    EmptyName(NameField),
    /// Name contains something other than letters, hyphens and spaces.
    InvalidNameCharacters(NameField),
    /// Name length (in characters) is outside `[2, 255]`.
    NameLength { field: NameField, length: usize },
    /// Passport series is not exactly 4 digits.
    InvalidPassportSeries(String),
    /// Passport number is not exactly 6 digits.
    InvalidPassportNumber(String),
    /// Phone number does not contain exactly 11 digits.
    InvalidPhoneNumber { digits: usize },
    /// Email is longer than 255 characters.
    EmailTooLong { length: usize },
    /// Email does not match mailbox-address grammar.
    InvalidEmail(String),
    /// Birth date lies after today.
    BirthDateInFuture(NaiveDate),
    /// Birth date lies more than 150 years in the past.
    BirthDateTooOld(NaiveDate),
    /// Derived age is outside `[14, 150]`.
    AgeOutOfRange { age: i32 },
    /// Identity is negative.
    NegativeId(ClientId),
    /// Gender label/code is not one of the defined values.
    InvalidGender(String),
}

impl Display for ClientValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName(field) => write!(f, "{} cannot be empty", field.as_str()),
            Self::InvalidNameCharacters(field) => write!(
                f,
                "{} may contain only letters, hyphens and spaces",
                field.as_str()
            ),
            Self::NameLength { field, length } => write!(
                f,
                "{} must be {NAME_MIN_CHARS}..={NAME_MAX_CHARS} characters, got {length}",
                field.as_str()
            ),
            Self::InvalidPassportSeries(value) => {
                write!(f, "passport_series must be exactly 4 digits, got `{value}`")
            }
            Self::InvalidPassportNumber(value) => {
                write!(f, "passport_number must be exactly 6 digits, got `{value}`")
            }
            Self::InvalidPhoneNumber { digits } => write!(
                f,
                "phone_number must contain {PHONE_DIGITS} digits, got {digits}"
            ),
            Self::EmailTooLong { length } => write!(
                f,
                "email cannot exceed {EMAIL_MAX_CHARS} characters, got {length}"
            ),
            Self::InvalidEmail(value) => write!(f, "email has invalid format: `{value}`"),
            Self::BirthDateInFuture(date) => {
                write!(f, "birth_date cannot be in the future: {date}")
            }
            Self::BirthDateTooOld(date) => write!(
                f,
                "birth_date cannot be more than {MAX_AGE} years ago: {date}"
            ),
            Self::AgeOutOfRange { age } => write!(
                f,
                "client age must be within {MIN_AGE}..={MAX_AGE}, got {age}"
            ),
            Self::NegativeId(id) => write!(f, "id cannot be negative, got {id}"),
            Self::InvalidGender(value) => write!(f, "gender has invalid value `{value}`"),
        }
    }
}

impl Error for ClientValidationError {}

pub fn validate_last_name(value: &str) -> Result<(), ClientValidationError> {
    validate_name(value, NameField::LastName, true)
}

pub fn validate_first_name(value: &str) -> Result<(), ClientValidationError> {
    validate_name(value, NameField::FirstName, true)
}

/// Empty input is accepted; anything else follows the required-name rules.
pub fn validate_patronymic(value: &str) -> Result<(), ClientValidationError> {
    validate_name(value, NameField::Patronymic, false)
}

pub fn validate_passport_series(value: &str) -> Result<(), ClientValidationError> {
    if PASSPORT_SERIES_RE.is_match(value) {
        Ok(())
    } else {
        Err(ClientValidationError::InvalidPassportSeries(
            value.to_string(),
        ))
    }
}

pub fn validate_passport_number(value: &str) -> Result<(), ClientValidationError> {
    if PASSPORT_NUMBER_RE.is_match(value) {
        Ok(())
    } else {
        Err(ClientValidationError::InvalidPassportNumber(
            value.to_string(),
        ))
    }
}

/// Counts digits only; separators such as `+`, spaces and brackets are ignored.
pub fn validate_phone_number(value: &str) -> Result<(), ClientValidationError> {
    let digits = digits_only(value).len();
    if digits == PHONE_DIGITS {
        Ok(())
    } else {
        Err(ClientValidationError::InvalidPhoneNumber { digits })
    }
}

/// Empty input means "no email" and is accepted.
pub fn validate_email(value: &str) -> Result<(), ClientValidationError> {
    if value.is_empty() {
        return Ok(());
    }

    let length = value.chars().count();
    if length > EMAIL_MAX_CHARS {
        return Err(ClientValidationError::EmailTooLong { length });
    }

    if !EMAIL_RE.is_match(value) {
        return Err(ClientValidationError::InvalidEmail(value.to_string()));
    }

    Ok(())
}

pub fn validate_birth_date(value: NaiveDate) -> Result<(), ClientValidationError> {
    validate_birth_date_on(value, Local::now().date_naive())
}

/// Birth-date rules evaluated against a caller-provided `today`.
pub fn validate_birth_date_on(
    value: NaiveDate,
    today: NaiveDate,
) -> Result<(), ClientValidationError> {
    if value > today {
        return Err(ClientValidationError::BirthDateInFuture(value));
    }

    let oldest_allowed = today.checked_sub_months(Months::new(MAX_AGE as u32 * 12));
    if oldest_allowed.is_some_and(|oldest| value < oldest) {
        return Err(ClientValidationError::BirthDateTooOld(value));
    }

    let age = age_between(value, today);
    if !(MIN_AGE..=MAX_AGE).contains(&age) {
        return Err(ClientValidationError::AgeOutOfRange { age });
    }

    Ok(())
}

pub fn validate_id(value: ClientId) -> Result<(), ClientValidationError> {
    if value < 0 {
        Err(ClientValidationError::NegativeId(value))
    } else {
        Ok(())
    }
}

/// Parses a gender label (`Male`/`Female`) or store code (`M`/`F`).
pub fn validate_gender(value: &str) -> Result<Gender, ClientValidationError> {
    Gender::from_label(value)
        .or_else(|| Gender::from_code(value))
        .ok_or_else(|| ClientValidationError::InvalidGender(value.to_string()))
}

/// Strips every non-digit character.
pub fn digits_only(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

fn validate_name(
    value: &str,
    field: NameField,
    required: bool,
) -> Result<(), ClientValidationError> {
    if required && value.trim().is_empty() {
        return Err(ClientValidationError::EmptyName(field));
    }
    if !required && value.is_empty() {
        return Ok(());
    }

    if !NAME_RE.is_match(value) {
        return Err(ClientValidationError::InvalidNameCharacters(field));
    }

    let length = value.chars().count();
    if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&length) {
        return Err(ClientValidationError::NameLength { field, length });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{digits_only, validate_name, ClientValidationError, NameField};

    #[test]
    fn digits_only_strips_separators() {
        assert_eq!(digits_only("+7 (999) 000-00-00"), "79990000000");
        assert_eq!(digits_only("no digits"), "");
    }

    #[test]
    fn whitespace_only_required_name_is_empty() {
        assert_eq!(
            validate_name("   ", NameField::LastName, true),
            Err(ClientValidationError::EmptyName(NameField::LastName))
        );
    }

    #[test]
    fn cyrillic_length_counts_characters_not_bytes() {
        assert!(validate_name("Ёж", NameField::FirstName, true).is_ok());
        assert_eq!(
            validate_name("Ж", NameField::FirstName, true),
            Err(ClientValidationError::NameLength {
                field: NameField::FirstName,
                length: 1
            })
        );
    }
}
