//! In-memory client collection shared by cache-backed repositories.
//!
//! # Responsibility
//! - Hold the ordered client sequence and implement the contract's CRUD,
//!   paging, search and ordering rules over it.
//! - Stay storage-agnostic: callers decide when to flush.
//!
//! # Invariants
//! - Identities are unique and non-negative.
//! - Every stored client passed `validate()` and the uniqueness checker.
//! - A failed mutation leaves the sequence untouched.

use crate::model::client::{Client, ClientId, ClientSummary};
use crate::model::validation::digits_only;
use crate::repo::client_repo::{RepoError, RepoResult};
use crate::repo::uniqueness::check_uniqueness;
use std::cmp::Ordering;
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientCollection {
    clients: Vec<Client>,
}

impl ClientCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopts clients read from storage, rejecting duplicate identities and
    /// records that collide on a uniqueness rule.
    pub fn from_clients(clients: Vec<Client>) -> RepoResult<Self> {
        let mut seen = HashSet::with_capacity(clients.len());
        for (index, client) in clients.iter().enumerate() {
            if !seen.insert(client.id) {
                return Err(RepoError::InvalidData(format!(
                    "duplicate client id {} at record #{index}",
                    client.id
                )));
            }
            check_uniqueness(client, &clients[..index], None).map_err(|err| {
                RepoError::InvalidData(format!("record #{index} (id {}): {err}", client.id))
            })?;
        }
        Ok(Self { clients })
    }

    pub fn as_slice(&self) -> &[Client] {
        &self.clients
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Identity the next `add` will assign: max stored identity + 1, or 1.
    pub fn next_id(&self) -> ClientId {
        self.clients
            .iter()
            .map(|client| client.id)
            .max()
            .map_or(1, |max| max + 1)
    }

    pub fn get(&self, id: ClientId) -> RepoResult<&Client> {
        self.clients
            .iter()
            .find(|client| client.id == id)
            .ok_or(RepoError::NotFound(id))
    }

    pub fn short_list(&self, offset: usize, count: usize) -> RepoResult<Vec<ClientSummary>> {
        if count == 0 {
            return Err(RepoError::InvalidPageSize(count));
        }
        Ok(self
            .clients
            .iter()
            .skip(offset)
            .take(count)
            .map(Client::summary)
            .collect())
    }

    pub fn add(&mut self, candidate: &Client) -> RepoResult<Client> {
        candidate.validate()?;
        check_uniqueness(candidate, &self.clients, None)?;

        let stored = candidate.clone().normalized().with_id(self.next_id());
        self.clients.push(stored.clone());
        Ok(stored)
    }

    pub fn update(&mut self, id: ClientId, candidate: &Client) -> RepoResult<Client> {
        let index = self.position(id).ok_or(RepoError::NotFound(id))?;
        let replacement = candidate.clone().normalized().with_id(id);
        replacement.validate()?;
        check_uniqueness(&replacement, &self.clients, Some(id))?;

        self.clients[index] = replacement.clone();
        Ok(replacement)
    }

    pub fn delete(&mut self, id: ClientId) -> bool {
        match self.position(id) {
            Some(index) => {
                self.clients.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn search_by_last_name(&self, needle: &str) -> Vec<Client> {
        let needle = needle.to_lowercase();
        self.clients
            .iter()
            .filter(|client| client.last_name.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    pub fn search_by_phone(&self, phone: &str) -> Vec<Client> {
        let digits = digits_only(phone);
        self.clients
            .iter()
            .filter(|client| client.normalized_phone() == digits)
            .cloned()
            .collect()
    }

    /// Stable in-place sort.
    pub fn sort_by_cmp(&mut self, compare: &dyn Fn(&Client, &Client) -> Ordering) {
        self.clients.sort_by(|a, b| compare(a, b));
    }

    pub fn clear(&mut self) {
        self.clients.clear();
    }

    fn position(&self, id: ClientId) -> Option<usize> {
        self.clients.iter().position(|client| client.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::ClientCollection;
    use crate::model::client::{Client, Gender};
    use crate::repo::client_repo::RepoError;
    use chrono::NaiveDate;

    fn client(last_name: &str, series: &str, phone: &str) -> Client {
        Client::new(
            last_name,
            "Ivan",
            series,
            "567890",
            phone,
            NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            Gender::Male,
        )
    }

    #[test]
    fn next_id_follows_max_identity() {
        let mut collection = ClientCollection::new();
        assert_eq!(collection.next_id(), 1);

        collection.add(&client("Ivanov", "1111", "79990000001")).unwrap();
        collection.add(&client("Petrov", "2222", "79990000002")).unwrap();
        collection.add(&client("Sidorov", "3333", "79990000003")).unwrap();
        assert!(collection.delete(2));
        assert_eq!(collection.next_id(), 4);

        assert!(collection.delete(3));
        assert_eq!(collection.next_id(), 2);
    }

    #[test]
    fn from_clients_rejects_duplicate_ids() {
        let first = client("Ivanov", "1111", "79990000001").with_id(5);
        let second = client("Petrov", "2222", "79990000002").with_id(5);

        let err = ClientCollection::from_clients(vec![first, second]).unwrap_err();
        assert!(matches!(err, RepoError::InvalidData(message) if message.contains("duplicate")));
    }

    #[test]
    fn from_clients_rejects_conflicting_records() {
        let first = client("Ivanov", "1111", "79990000001").with_id(1);
        let second = client("Petrov", "2222", "+7 999 000 00 01").with_id(2);

        let err = ClientCollection::from_clients(vec![first, second]).unwrap_err();
        assert!(matches!(err, RepoError::InvalidData(_)));
    }

    #[test]
    fn failed_update_leaves_collection_untouched() {
        let mut collection = ClientCollection::new();
        collection.add(&client("Ivanov", "1111", "79990000001")).unwrap();
        collection.add(&client("Petrov", "2222", "79990000002")).unwrap();
        let before = collection.clone();

        let err = collection
            .update(2, &client("Petrov", "1111", "79990000002"))
            .unwrap_err();
        assert!(matches!(err, RepoError::Conflict(_)));
        assert_eq!(collection, before);
    }
}
