//! File encodings for client collections.
//!
//! # Responsibility
//! - Turn a client sequence into bytes and back for flat-file backends.
//! - Keep wire naming (camelCase keys, ISO date-time, gender labels) in one
//!   place shared by every encoding.
//!
//! # Invariants
//! - Decoding goes through `Client::try_from(ClientRecord)`, so every decoded
//!   client has passed field validation.
//! - Absent optional fields are omitted on encode and read back as `None`.

use crate::model::client::Client;
use crate::model::validation::ClientValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod json;
pub mod record;
mod yaml;

pub use json::JsonCodec;
pub use record::ClientRecord;
pub use yaml::YamlCodec;

pub type CodecResult<T> = Result<T, CodecError>;

/// Encoding/decoding failure for a client file.
#[derive(Debug)]
pub enum CodecError {
    Json(serde_json::Error),
    Yaml(serde_yaml::Error),
    /// JSON top-level value is not an array of objects.
    UnexpectedShape(&'static str),
    /// Record at `index` decoded but failed field validation.
    InvalidRecord {
        index: usize,
        source: ClientValidationError,
    },
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "json: {err}"),
            Self::Yaml(err) => write!(f, "yaml: {err}"),
            Self::UnexpectedShape(expected) => {
                write!(f, "unexpected document shape: expected {expected}")
            }
            Self::InvalidRecord { index, source } => {
                write!(f, "record #{index} is invalid: {source}")
            }
        }
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::Yaml(err) => Some(err),
            Self::UnexpectedShape(_) => None,
            Self::InvalidRecord { source, .. } => Some(source),
        }
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<serde_yaml::Error> for CodecError {
    fn from(value: serde_yaml::Error) -> Self {
        Self::Yaml(value)
    }
}

/// Serializer/deserializer pair for one file encoding.
pub trait ClientCodec {
    /// Short format name used in logs (`json`, `yaml`).
    fn format_name(&self) -> &'static str;
    /// Serializes the full sequence, preserving order.
    fn encode(&self, clients: &[Client]) -> CodecResult<Vec<u8>>;
    /// Deserializes a non-empty document into validated clients.
    fn decode(&self, bytes: &[u8]) -> CodecResult<Vec<Client>>;
}

pub(crate) fn records_to_clients(records: Vec<ClientRecord>) -> CodecResult<Vec<Client>> {
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            Client::try_from(record).map_err(|source| CodecError::InvalidRecord { index, source })
        })
        .collect()
}
