//! Client use-case service.
//!
//! # Responsibility
//! - Provide storage-agnostic entry points for client registration, lookup,
//!   paging and search.
//! - Delegate persistence to a `ClientRepository` implementation.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/uniqueness contracts.

use crate::model::client::{Client, ClientId, ClientSummary};
use crate::model::validation::digits_only;
use crate::repo::client_repo::{ClientRepository, ClientRepositoryExt, RepoResult};

const DEFAULT_PAGE_SIZE: usize = 20;

/// One page of summaries plus the total number of stored clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientPage {
    pub items: Vec<ClientSummary>,
    pub offset: usize,
    pub total: usize,
}

/// Use-case service wrapper over any client repository.
pub struct ClientService<R: ClientRepository> {
    repo: R,
}

impl<R: ClientRepository> ClientService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn into_repository(self) -> R {
        self.repo
    }

    /// Registers a new client and returns the stored copy with its identity.
    pub fn register(&mut self, candidate: &Client) -> RepoResult<Client> {
        self.repo.add(candidate)
    }

    /// Replaces the client at `id` as a whole.
    pub fn replace(&mut self, id: ClientId, candidate: &Client) -> RepoResult<Client> {
        self.repo.update(id, candidate)
    }

    pub fn remove(&mut self, id: ClientId) -> RepoResult<bool> {
        self.repo.delete(id)
    }

    pub fn get(&self, id: ClientId) -> RepoResult<Client> {
        self.repo.get_by_id(id)
    }

    /// Page of summaries; `page_size` of `None` uses the default of 20.
    pub fn page(&self, offset: usize, page_size: Option<usize>) -> RepoResult<ClientPage> {
        let items = self
            .repo
            .get_short_list(offset, page_size.unwrap_or(DEFAULT_PAGE_SIZE))?;
        let total = self.repo.count()?;
        Ok(ClientPage {
            items,
            offset,
            total,
        })
    }

    /// Free-text lookup: phone search when the query is mostly digits,
    /// last-name search otherwise.
    pub fn find(&self, query: &str) -> RepoResult<Vec<Client>> {
        if looks_like_phone(query) {
            self.repo.search_by_phone(query)
        } else {
            self.repo.search_by_last_name(query.trim())
        }
    }

    pub fn sort_by_last_name(&mut self, ascending: bool) -> RepoResult<()> {
        self.repo.sort_by_last_name(ascending)
    }
}

fn looks_like_phone(query: &str) -> bool {
    let digits = digits_only(query).len();
    let letters = query.chars().filter(|c| c.is_alphabetic()).count();
    digits > 0 && letters == 0
}

#[cfg(test)]
mod tests {
    use super::looks_like_phone;

    #[test]
    fn phone_detection_ignores_separators() {
        assert!(looks_like_phone("+7 (999) 000-00-00"));
        assert!(!looks_like_phone("Ivanov"));
        assert!(!looks_like_phone("   "));
    }
}
