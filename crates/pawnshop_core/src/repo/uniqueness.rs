//! Cross-record uniqueness rules.
//!
//! # Invariants
//! - Checks run in a fixed order: passport pair, normalized phone, email.
//! - Only the first violation is reported.
//! - Email is only compared when the candidate has a non-empty one.

use crate::model::client::{Client, ClientId};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Field combination that another stored client already uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UniquenessViolation {
    Passport { series: String, number: String },
    /// Carries the digits-only phone.
    Phone(String),
    Email(String),
}

impl Display for UniquenessViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Passport { .. } => {
                write!(f, "a client with these passport details already exists")
            }
            Self::Phone(_) => write!(f, "a client with this phone number already exists"),
            Self::Email(_) => write!(f, "a client with this email already exists"),
        }
    }
}

impl Error for UniquenessViolation {}

/// Scans `existing` for a record colliding with `candidate`.
///
/// The record carrying `exclude_id` (the one being replaced by an update) is
/// skipped.
pub fn check_uniqueness<'a>(
    candidate: &Client,
    existing: impl IntoIterator<Item = &'a Client>,
    exclude_id: Option<ClientId>,
) -> Result<(), UniquenessViolation> {
    let others: Vec<&Client> = existing
        .into_iter()
        .filter(|client| Some(client.id) != exclude_id)
        .collect();

    if others.iter().any(|client| {
        client.passport_series == candidate.passport_series
            && client.passport_number == candidate.passport_number
    }) {
        return Err(UniquenessViolation::Passport {
            series: candidate.passport_series.clone(),
            number: candidate.passport_number.clone(),
        });
    }

    let phone = candidate.normalized_phone();
    if others.iter().any(|client| client.normalized_phone() == phone) {
        return Err(UniquenessViolation::Phone(phone));
    }

    if let Some(email) = candidate.email.as_deref().filter(|email| !email.is_empty()) {
        if others
            .iter()
            .any(|client| client.email.as_deref() == Some(email))
        {
            return Err(UniquenessViolation::Email(email.to_string()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{check_uniqueness, UniquenessViolation};
    use crate::model::client::{Client, Gender};
    use chrono::NaiveDate;

    fn client(id: i64, series: &str, number: &str, phone: &str, email: Option<&str>) -> Client {
        let mut client = Client::new(
            "Ivanov",
            "Ivan",
            series,
            number,
            phone,
            NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            Gender::Male,
        )
        .with_id(id);
        client.email = email.map(str::to_string);
        client
    }

    #[test]
    fn passport_is_reported_before_phone_and_email() {
        let stored = vec![client(1, "1234", "567890", "79990000000", Some("a@b.ru"))];
        let candidate = client(0, "1234", "567890", "79990000000", Some("a@b.ru"));

        let err = check_uniqueness(&candidate, &stored, None).unwrap_err();
        assert!(matches!(err, UniquenessViolation::Passport { .. }));
    }

    #[test]
    fn phone_is_compared_after_normalization() {
        let stored = vec![client(1, "1234", "567890", "+7 (999) 000-00-00", None)];
        let candidate = client(0, "4321", "098765", "79990000000", None);

        let err = check_uniqueness(&candidate, &stored, None).unwrap_err();
        assert_eq!(err, UniquenessViolation::Phone("79990000000".to_string()));
    }

    #[test]
    fn missing_email_never_conflicts() {
        let stored = vec![client(1, "1234", "567890", "79990000000", None)];
        let candidate = client(0, "4321", "098765", "79991111111", None);

        assert!(check_uniqueness(&candidate, &stored, None).is_ok());
    }

    #[test]
    fn empty_email_never_conflicts() {
        let stored = vec![client(1, "1234", "567890", "79990000000", Some(""))];
        let candidate = client(0, "4321", "098765", "79991111111", Some(""));

        assert!(check_uniqueness(&candidate, &stored, None).is_ok());
    }

    #[test]
    fn excluded_record_is_ignored() {
        let stored = vec![client(1, "1234", "567890", "79990000000", Some("a@b.ru"))];
        let candidate = client(0, "1234", "567890", "79990000000", Some("a@b.ru"));

        assert!(check_uniqueness(&candidate, &stored, Some(1)).is_ok());
    }
}
