//! Core client registry for the pawnshop back office.
//! This crate owns client validation, uniqueness and persistence rules; every
//! storage backend goes through the same repository contract.

pub mod codec;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use codec::{ClientCodec, CodecError, JsonCodec, YamlCodec};
pub use config::{open_repository, open_repository_at, BackendKind, RepositoryConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::client::{Client, ClientId, ClientSummary, Gender};
pub use model::validation::ClientValidationError;
pub use repo::client_repo::{ClientRepository, ClientRepositoryExt, RepoError, RepoResult};
pub use repo::file_repo::{FileClientRepository, JsonClientRepository, YamlClientRepository};
pub use repo::sqlite_repo::SqliteClientRepository;
pub use repo::uniqueness::UniquenessViolation;
pub use service::client_service::{ClientPage, ClientService};

/// Minimal health-check API used by the CLI smoke run.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
