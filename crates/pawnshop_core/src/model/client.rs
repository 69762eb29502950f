//! Client domain model.
//!
//! # Responsibility
//! - Define the canonical customer record and its public summary projection.
//! - Provide derived values (age, full name, normalized phone) that are never
//!   persisted.
//!
//! # Invariants
//! - `id == 0` means "not yet assigned by a repository".
//! - Empty optional strings are represented as `None`.
//! - Age is always derived from `birth_date`, never stored.

use crate::model::validation::{self, ClientValidationError};
use chrono::{Datelike, Local, NaiveDate};
use std::fmt::{Display, Formatter};

/// Stable integer identity assigned by a repository on `add`.
pub type ClientId = i64;

/// Identity value carried by records that were never persisted.
pub const UNASSIGNED_ID: ClientId = 0;

/// Client gender.
///
/// Only two values are accepted; "unspecified" is rejected at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Enumerated label used by the file encodings.
    pub fn label(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }

    /// Single-character code used by the relational store.
    pub fn code(self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
        }
    }

    /// Parses a store code (`M`/`F`, case-insensitive).
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "M" | "m" => Some(Self::Male),
            "F" | "f" => Some(Self::Female),
            _ => None,
        }
    }

    /// Parses an enumerated label (`Male`/`Female`, case-insensitive).
    pub fn from_label(label: &str) -> Option<Self> {
        let trimmed = label.trim();
        if trimmed.eq_ignore_ascii_case("male") {
            Some(Self::Male)
        } else if trimmed.eq_ignore_ascii_case("female") {
            Some(Self::Female)
        } else {
            None
        }
    }
}

impl Display for Gender {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Full customer record.
///
/// Fields are plain data; repositories enforce `validate()` and uniqueness
/// before anything is persisted, and hand out clones so stored values are
/// only ever replaced as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    pub id: ClientId,
    pub last_name: String,
    pub first_name: String,
    pub patronymic: Option<String>,
    /// Exactly 4 decimal digits.
    pub passport_series: String,
    /// Exactly 6 decimal digits.
    pub passport_number: String,
    /// Stored as entered; 11 digits once non-digits are stripped.
    pub phone_number: String,
    pub email: Option<String>,
    pub birth_date: NaiveDate,
    pub gender: Gender,
}

impl Client {
    /// Creates a transient record with no identity and no optional fields.
    ///
    /// This constructor does not validate; call `validate()` or hand the
    /// record to a repository.
    pub fn new(
        last_name: impl Into<String>,
        first_name: impl Into<String>,
        passport_series: impl Into<String>,
        passport_number: impl Into<String>,
        phone_number: impl Into<String>,
        birth_date: NaiveDate,
        gender: Gender,
    ) -> Self {
        Self {
            id: UNASSIGNED_ID,
            last_name: last_name.into(),
            first_name: first_name.into(),
            patronymic: None,
            passport_series: passport_series.into(),
            passport_number: passport_number.into(),
            phone_number: phone_number.into(),
            email: None,
            birth_date,
            gender,
        }
    }

    /// Sets the patronymic; an empty value clears it.
    pub fn with_patronymic(mut self, patronymic: impl Into<String>) -> Self {
        self.patronymic = non_empty(patronymic.into());
        self
    }

    /// Sets the email; an empty value clears it.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = non_empty(email.into());
        self
    }

    /// Returns a copy of this record carrying the given identity.
    pub fn with_id(mut self, id: ClientId) -> Self {
        self.id = id;
        self
    }

    /// Turns `Some("")` optionals into `None`, the form repositories store.
    pub fn normalized(mut self) -> Self {
        self.patronymic = self.patronymic.and_then(non_empty);
        self.email = self.email.and_then(non_empty);
        self
    }

    /// Runs every field check and returns the first violation.
    pub fn validate(&self) -> Result<(), ClientValidationError> {
        self.validate_on(Local::now().date_naive())
    }

    /// Same as `validate()`, with birth-date rules evaluated against `today`.
    pub fn validate_on(&self, today: NaiveDate) -> Result<(), ClientValidationError> {
        validation::validate_last_name(&self.last_name)?;
        validation::validate_first_name(&self.first_name)?;
        validation::validate_patronymic(self.patronymic.as_deref().unwrap_or(""))?;
        validation::validate_passport_series(&self.passport_series)?;
        validation::validate_passport_number(&self.passport_number)?;
        validation::validate_phone_number(&self.phone_number)?;
        validation::validate_email(self.email.as_deref().unwrap_or(""))?;
        validation::validate_birth_date_on(self.birth_date, today)?;
        validation::validate_id(self.id)?;
        Ok(())
    }

    /// Returns `true` only when every field check passes.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Full years as of today.
    pub fn age(&self) -> i32 {
        self.age_on(Local::now().date_naive())
    }

    /// Full years as of `today`.
    pub fn age_on(&self, today: NaiveDate) -> i32 {
        age_between(self.birth_date, today)
    }

    /// Phone number with every non-digit removed.
    pub fn normalized_phone(&self) -> String {
        validation::digits_only(&self.phone_number)
    }

    /// `"Last First Patronymic"` with trailing space trimmed.
    pub fn full_name(&self) -> String {
        format!(
            "{} {} {}",
            self.last_name,
            self.first_name,
            self.patronymic.as_deref().unwrap_or("")
        )
        .trim()
        .to_string()
    }

    /// `"series number"`.
    pub fn full_passport(&self) -> String {
        format!("{} {}", self.passport_series, self.passport_number)
    }

    /// One-line description including every public attribute.
    pub fn full_info(&self) -> String {
        format!(
            "{}, gender: {}, passport: {}, phone: {}, email: {}, age: {}",
            self.full_name(),
            self.gender,
            self.full_passport(),
            self.phone_number,
            self.email.as_deref().unwrap_or(""),
            self.age()
        )
    }

    /// Projection used by paginated listings.
    pub fn summary(&self) -> ClientSummary {
        ClientSummary {
            id: self.id,
            last_name: self.last_name.clone(),
            first_name: self.first_name.clone(),
            patronymic: self.patronymic.clone(),
            passport_series: self.passport_series.clone(),
            passport_number: self.passport_number.clone(),
            phone_number: self.phone_number.clone(),
        }
    }
}

impl Display for Client {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.full_name())
    }
}

/// Public-facing projection of a `Client`.
///
/// Omits email, birth date and gender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSummary {
    pub id: ClientId,
    pub last_name: String,
    pub first_name: String,
    pub patronymic: Option<String>,
    pub passport_series: String,
    pub passport_number: String,
    pub phone_number: String,
}

impl From<&Client> for ClientSummary {
    fn from(value: &Client) -> Self {
        value.summary()
    }
}

/// Full years between `birth_date` and `today`.
///
/// One year is subtracted when today's month/day precedes the birthday.
pub fn age_between(birth_date: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth_date.year();
    if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
        age -= 1;
    }
    age
}

pub(crate) fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{age_between, Client, Gender};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn age_is_reduced_before_birthday() {
        assert_eq!(age_between(date(2000, 6, 15), date(2020, 6, 14)), 19);
        assert_eq!(age_between(date(2000, 6, 15), date(2020, 6, 15)), 20);
        assert_eq!(age_between(date(2000, 2, 29), date(2021, 2, 28)), 20);
        assert_eq!(age_between(date(2000, 2, 29), date(2021, 3, 1)), 21);
    }

    #[test]
    fn optional_setters_normalize_empty_values() {
        let client = Client::new(
            "Ivanov",
            "Ivan",
            "1234",
            "567890",
            "79990000000",
            date(1990, 1, 1),
            Gender::Male,
        )
        .with_patronymic("")
        .with_email("");

        assert_eq!(client.patronymic, None);
        assert_eq!(client.email, None);
        assert_eq!(client.full_name(), "Ivanov Ivan");
    }

    #[test]
    fn gender_codes_and_labels_parse() {
        assert_eq!(Gender::from_code("M"), Some(Gender::Male));
        assert_eq!(Gender::from_code("f"), Some(Gender::Female));
        assert_eq!(Gender::from_code("U"), None);
        assert_eq!(Gender::from_label("FEMALE"), Some(Gender::Female));
        assert_eq!(Gender::from_label("unspecified"), None);
    }
}
