//! JSON encoding: a pretty-printed array of camelCase objects.
//!
//! Keys are matched case-insensitively on read.

use super::record::{canonical_field_name, ClientRecord};
use super::{records_to_clients, ClientCodec, CodecError, CodecResult};
use crate::model::client::Client;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl ClientCodec for JsonCodec {
    fn format_name(&self) -> &'static str {
        "json"
    }

    fn encode(&self, clients: &[Client]) -> CodecResult<Vec<u8>> {
        let records: Vec<ClientRecord> = clients.iter().map(ClientRecord::from).collect();
        Ok(serde_json::to_vec_pretty(&records)?)
    }

    fn decode(&self, bytes: &[u8]) -> CodecResult<Vec<Client>> {
        let document: Value = serde_json::from_slice(bytes)?;
        let Value::Array(items) = document else {
            return Err(CodecError::UnexpectedShape("array of client objects"));
        };

        let normalized = items
            .into_iter()
            .map(normalize_keys)
            .collect::<CodecResult<Vec<Value>>>()?;
        let records: Vec<ClientRecord> = serde_json::from_value(Value::Array(normalized))?;
        records_to_clients(records)
    }
}

fn normalize_keys(item: Value) -> CodecResult<Value> {
    let Value::Object(fields) = item else {
        return Err(CodecError::UnexpectedShape("array of client objects"));
    };

    let mut normalized = Map::with_capacity(fields.len());
    for (key, value) in fields {
        let key = canonical_field_name(&key).map_or(key, str::to_string);
        normalized.insert(key, value);
    }
    Ok(Value::Object(normalized))
}
