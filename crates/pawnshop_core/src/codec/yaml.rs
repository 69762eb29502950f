//! YAML encoding: a block sequence of camelCase mappings.

use super::record::ClientRecord;
use super::{records_to_clients, ClientCodec, CodecResult};
use crate::model::client::Client;

#[derive(Debug, Clone, Copy, Default)]
pub struct YamlCodec;

impl ClientCodec for YamlCodec {
    fn format_name(&self) -> &'static str {
        "yaml"
    }

    fn encode(&self, clients: &[Client]) -> CodecResult<Vec<u8>> {
        let records: Vec<ClientRecord> = clients.iter().map(ClientRecord::from).collect();
        Ok(serde_yaml::to_string(&records)?.into_bytes())
    }

    fn decode(&self, bytes: &[u8]) -> CodecResult<Vec<Client>> {
        let records: Vec<ClientRecord> = serde_yaml::from_slice(bytes)?;
        records_to_clients(records)
    }
}

#[cfg(test)]
mod tests {
    use super::YamlCodec;
    use crate::codec::{ClientCodec, CodecError};

    #[test]
    fn decode_reads_omitted_optionals_as_none() {
        let document = b"- id: 1
  lastName: Petrov
  firstName: Petr
  passportSeries: '4321'
  passportNumber: '098765'
  phoneNumber: '79991112233'
  birthDate: 1985-03-01T00:00:00
  gender: Male
";
        let clients = YamlCodec.decode(document).unwrap();
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].email, None);
        assert_eq!(clients[0].passport_number, "098765");
    }

    #[test]
    fn decode_rejects_invalid_record() {
        let document = b"- id: 1
  lastName: P
  firstName: Petr
  passportSeries: '4321'
  passportNumber: '098765'
  phoneNumber: '79991112233'
  birthDate: 1985-03-01T00:00:00
  gender: Male
";
        let err = YamlCodec.decode(document).unwrap_err();
        assert!(matches!(err, CodecError::InvalidRecord { index: 0, .. }));
    }
}
