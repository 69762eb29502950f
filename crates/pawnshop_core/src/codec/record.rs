//! Wire representation shared by the JSON and YAML encodings.

use crate::model::client::{non_empty, Client, ClientId};
use crate::model::validation::{self, ClientValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Field names as written to disk.
pub const FIELD_NAMES: [&str; 10] = [
    "id",
    "lastName",
    "firstName",
    "patronymic",
    "passportSeries",
    "passportNumber",
    "phoneNumber",
    "email",
    "birthDate",
    "gender",
];

/// One client as stored in a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRecord {
    pub id: ClientId,
    pub last_name: String,
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patronymic: Option<String>,
    pub passport_series: String,
    pub passport_number: String,
    pub phone_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(with = "iso_date_time")]
    pub birth_date: NaiveDate,
    /// Enumerated label, `Male` or `Female`.
    pub gender: String,
}

impl From<&Client> for ClientRecord {
    fn from(value: &Client) -> Self {
        Self {
            id: value.id,
            last_name: value.last_name.clone(),
            first_name: value.first_name.clone(),
            patronymic: value.patronymic.clone(),
            passport_series: value.passport_series.clone(),
            passport_number: value.passport_number.clone(),
            phone_number: value.phone_number.clone(),
            email: value.email.clone(),
            birth_date: value.birth_date,
            gender: value.gender.label().to_string(),
        }
    }
}

impl TryFrom<ClientRecord> for Client {
    type Error = ClientValidationError;

    fn try_from(value: ClientRecord) -> Result<Self, Self::Error> {
        let gender = validation::validate_gender(&value.gender)?;
        let client = Client {
            id: value.id,
            last_name: value.last_name,
            first_name: value.first_name,
            patronymic: value.patronymic.and_then(non_empty),
            passport_series: value.passport_series,
            passport_number: value.passport_number,
            phone_number: value.phone_number,
            email: value.email.and_then(non_empty),
            birth_date: value.birth_date,
            gender,
        };
        client.validate()?;
        Ok(client)
    }
}

/// Maps any spelling of a known field (`LASTNAME`, `last_name`, `lastName`)
/// to its on-disk name.
pub fn canonical_field_name(key: &str) -> Option<&'static str> {
    let folded: String = key
        .chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect();
    FIELD_NAMES
        .iter()
        .copied()
        .find(|name| name.to_lowercase() == folded)
}

/// `YYYY-MM-DDT00:00:00` on write; date-time, RFC 3339 or plain date on read.
mod iso_date_time {
    use chrono::{DateTime, NaiveDate, NaiveDateTime};
    use serde::{Deserialize, Deserializer, Serializer};

    const WRITE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    pub fn serialize<S>(value: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let midnight = value.and_time(chrono::NaiveTime::MIN);
        serializer.serialize_str(&midnight.format(WRITE_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid ISO-8601 birth date `{raw}`"))
        })
    }

    pub(super) fn parse(raw: &str) -> Option<NaiveDate> {
        let trimmed = raw.trim();
        if let Ok(value) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(value.date());
        }
        if let Ok(value) = DateTime::parse_from_rfc3339(trimmed) {
            return Some(value.date_naive());
        }
        NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok()
    }
}

#[cfg(test)]
mod tests {
    use super::canonical_field_name;
    use super::iso_date_time::parse as parse_date;
    use chrono::NaiveDate;

    #[test]
    fn canonical_field_name_ignores_case_and_underscores() {
        assert_eq!(canonical_field_name("LASTNAME"), Some("lastName"));
        assert_eq!(canonical_field_name("passport_series"), Some("passportSeries"));
        assert_eq!(canonical_field_name("Id"), Some("id"));
        assert_eq!(canonical_field_name("nickname"), None);
    }

    #[test]
    fn parse_date_accepts_date_time_and_plain_date() {
        let expected = NaiveDate::from_ymd_opt(1990, 5, 12);
        assert_eq!(parse_date("1990-05-12T00:00:00"), expected);
        assert_eq!(parse_date("1990-05-12T00:00:00.0000000"), expected);
        assert_eq!(parse_date("1990-05-12T10:30:00+03:00"), expected);
        assert_eq!(parse_date("1990-05-12"), expected);
        assert_eq!(parse_date("12.05.1990"), None);
    }
}
