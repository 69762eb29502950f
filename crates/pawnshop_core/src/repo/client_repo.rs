//! Client repository contract shared by every storage backend.
//!
//! # Responsibility
//! - Define the CRUD/query surface callers use regardless of storage.
//! - Define the semantic error taxonomy (validation, conflict, not found,
//!   storage) returned by all backends.
//!
//! # Invariants
//! - Write paths call `Client::validate()` and the uniqueness checker before
//!   any storage effect.
//! - Identity misses surface as `RepoError::NotFound`, except `delete`, which
//!   reports them as `Ok(false)`.

use crate::codec::CodecError;
use crate::db::DbError;
use crate::model::client::{Client, ClientId, ClientSummary};
use crate::model::validation::ClientValidationError;
use crate::repo::uniqueness::UniquenessViolation;
use std::cmp::Ordering;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for client persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Candidate failed a field rule.
    Validation(ClientValidationError),
    /// Candidate collides with another stored client.
    Conflict(UniquenessViolation),
    /// No client carries this identity.
    NotFound(ClientId),
    /// Page size must be positive.
    InvalidPageSize(usize),
    /// Backend file could not be read or written.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Backend file content is malformed.
    Codec(CodecError),
    Db(DbError),
    /// Stored state violates a record or collection invariant.
    InvalidData(String),
    /// Operation has no meaning for this backend.
    Unsupported(&'static str),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "invalid client: {err}"),
            Self::Conflict(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "client not found: {id}"),
            Self::InvalidPageSize(count) => {
                write!(f, "page size must be greater than 0, got {count}")
            }
            Self::Io { path, source } => write!(f, "i/o on `{}`: {source}", path.display()),
            Self::Codec(err) => write!(f, "malformed client file: {err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted client data: {message}"),
            Self::Unsupported(operation) => {
                write!(f, "operation `{operation}` is not supported by this backend")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "client repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "client repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "client repository requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Conflict(err) => Some(err),
            Self::Io { source, .. } => Some(source),
            Self::Codec(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_)
            | Self::InvalidPageSize(_)
            | Self::InvalidData(_)
            | Self::Unsupported(_)
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_)
            | Self::MissingRequiredColumn { .. } => None,
        }
    }
}

impl From<ClientValidationError> for RepoError {
    fn from(value: ClientValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<UniquenessViolation> for RepoError {
    fn from(value: UniquenessViolation) -> Self {
        Self::Conflict(value)
    }
}

impl From<CodecError> for RepoError {
    fn from(value: CodecError) -> Self {
        Self::Codec(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for client CRUD, paging, search and ordering.
///
/// The trait is object safe so callers can pick a backend at runtime
/// (`Box<dyn ClientRepository>`); typed sorting helpers live in
/// `ClientRepositoryExt`.
pub trait ClientRepository {
    /// Reloads state from durable storage. No-op for stores without a cache.
    fn load(&mut self) -> RepoResult<()>;
    /// Flushes state to durable storage. No-op for stores without a cache.
    fn save(&self) -> RepoResult<()>;

    fn get_by_id(&self, id: ClientId) -> RepoResult<Client>;
    /// Up to `count` summaries in stored order, starting at `offset`.
    ///
    /// `count == 0` is rejected; an `offset` past the end yields an empty page.
    fn get_short_list(&self, offset: usize, count: usize) -> RepoResult<Vec<ClientSummary>>;
    /// Snapshot of every client in stored order.
    fn get_all(&self) -> RepoResult<Vec<Client>>;

    fn get_all_short(&self) -> RepoResult<Vec<ClientSummary>> {
        Ok(self.get_all()?.iter().map(Client::summary).collect())
    }

    /// Validates, checks uniqueness, assigns the next identity and persists.
    fn add(&mut self, candidate: &Client) -> RepoResult<Client>;
    /// Replaces the whole record at `id`; the candidate's own `id` is ignored.
    fn update(&mut self, id: ClientId, candidate: &Client) -> RepoResult<Client>;
    /// Returns `false` when nothing carries `id`.
    fn delete(&mut self, id: ClientId) -> RepoResult<bool>;
    fn count(&self) -> RepoResult<usize>;

    /// Case-insensitive substring match on last name.
    fn search_by_last_name(&self, needle: &str) -> RepoResult<Vec<Client>>;
    /// Exact match after reducing both sides to digits.
    fn search_by_phone(&self, phone: &str) -> RepoResult<Vec<Client>>;

    /// Stable reorder of the stored sequence.
    ///
    /// Only cache-backed stores keep an order of their own. The relational
    /// backend always reads in identity order and returns
    /// `RepoError::Unsupported` here instead of silently ignoring the call.
    fn sort_by_cmp(&mut self, compare: &dyn Fn(&Client, &Client) -> Ordering) -> RepoResult<()>;
    /// Removes every client; the next `add` is assigned identity 1.
    fn clear(&mut self) -> RepoResult<()>;
}

impl<R: ClientRepository + ?Sized> ClientRepository for Box<R> {
    fn load(&mut self) -> RepoResult<()> {
        (**self).load()
    }

    fn save(&self) -> RepoResult<()> {
        (**self).save()
    }

    fn get_by_id(&self, id: ClientId) -> RepoResult<Client> {
        (**self).get_by_id(id)
    }

    fn get_short_list(&self, offset: usize, count: usize) -> RepoResult<Vec<ClientSummary>> {
        (**self).get_short_list(offset, count)
    }

    fn get_all(&self) -> RepoResult<Vec<Client>> {
        (**self).get_all()
    }

    fn get_all_short(&self) -> RepoResult<Vec<ClientSummary>> {
        (**self).get_all_short()
    }

    fn add(&mut self, candidate: &Client) -> RepoResult<Client> {
        (**self).add(candidate)
    }

    fn update(&mut self, id: ClientId, candidate: &Client) -> RepoResult<Client> {
        (**self).update(id, candidate)
    }

    fn delete(&mut self, id: ClientId) -> RepoResult<bool> {
        (**self).delete(id)
    }

    fn count(&self) -> RepoResult<usize> {
        (**self).count()
    }

    fn search_by_last_name(&self, needle: &str) -> RepoResult<Vec<Client>> {
        (**self).search_by_last_name(needle)
    }

    fn search_by_phone(&self, phone: &str) -> RepoResult<Vec<Client>> {
        (**self).search_by_phone(phone)
    }

    fn sort_by_cmp(&mut self, compare: &dyn Fn(&Client, &Client) -> Ordering) -> RepoResult<()> {
        (**self).sort_by_cmp(compare)
    }

    fn clear(&mut self) -> RepoResult<()> {
        (**self).clear()
    }
}

/// Typed ordering helpers available on every repository.
pub trait ClientRepositoryExt: ClientRepository {
    /// Stable sort by any orderable projection of a client.
    ///
    /// Descending order keeps equal keys in their current relative order.
    fn sort_by<K, F>(&mut self, key: F, ascending: bool) -> RepoResult<()>
    where
        K: Ord,
        F: Fn(&Client) -> K,
    {
        if ascending {
            self.sort_by_cmp(&|a, b| key(a).cmp(&key(b)))
        } else {
            self.sort_by_cmp(&|a, b| key(b).cmp(&key(a)))
        }
    }

    /// Case-insensitive, with `ё` ordered as `е`.
    fn sort_by_last_name(&mut self, ascending: bool) -> RepoResult<()> {
        self.sort_by(|client| last_name_sort_key(&client.last_name), ascending)
    }

    fn sort_by_birth_date(&mut self, ascending: bool) -> RepoResult<()> {
        self.sort_by(|client| client.birth_date, ascending)
    }

    fn sort_by_id(&mut self, ascending: bool) -> RepoResult<()> {
        self.sort_by(|client| client.id, ascending)
    }

    fn sort_by_age(&mut self, ascending: bool) -> RepoResult<()> {
        self.sort_by(Client::age, ascending)
    }
}

impl<R: ClientRepository + ?Sized> ClientRepositoryExt for R {}

/// Lowercased last name with `ё` folded to `е`.
///
/// Raw code points put `Ё` (U+0401) ahead of the whole `А..Я` block.
pub fn last_name_sort_key(last_name: &str) -> String {
    last_name.to_lowercase().replace('ё', "е")
}
