//! Repository construction parameters.
//!
//! # Responsibility
//! - Describe which backend to open and where its data lives.
//! - Build a ready repository behind the backend-neutral contract.
//!
//! # Invariants
//! - Backend inference from a path is purely extension-based.

use crate::codec::{JsonCodec, YamlCodec};
use crate::repo::client_repo::{ClientRepository, RepoResult};
use crate::repo::file_repo::FileClientRepository;
use crate::repo::sqlite_repo::SqliteClientRepository;
use log::info;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Storage backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Json,
    Yaml,
    Sqlite,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Sqlite => "sqlite",
        }
    }

    /// Maps a file extension (case-insensitive) to a backend.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "db" | "sqlite" | "sqlite3" => Some(Self::Sqlite),
            _ => None,
        }
    }
}

/// Where and how a client repository stores its data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    pub backend: BackendKind,
    /// Data file for file backends, database file for SQLite.
    pub path: PathBuf,
}

impl RepositoryConfig {
    pub fn new(backend: BackendKind, path: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            path: path.into(),
        }
    }

    /// Infers the backend from the path extension.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let backend = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(BackendKind::from_extension)
            .ok_or_else(|| ConfigError::UnknownExtension(path.clone()))?;
        Ok(Self { backend, path })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Path extension does not name a supported backend.
    UnknownExtension(PathBuf),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownExtension(path) => write!(
                f,
                "cannot infer backend from `{}`; expected .json, .yaml/.yml or .db/.sqlite/.sqlite3",
                path.display()
            ),
        }
    }
}

impl Error for ConfigError {}

/// Opens the configured backend behind the shared contract.
pub fn open_repository(config: &RepositoryConfig) -> RepoResult<Box<dyn ClientRepository>> {
    info!(
        "event=repo_open module=config status=start backend={}",
        config.backend.as_str()
    );
    let repo: Box<dyn ClientRepository> = match config.backend {
        BackendKind::Json => Box::new(FileClientRepository::open(&config.path, JsonCodec)?),
        BackendKind::Yaml => Box::new(FileClientRepository::open(&config.path, YamlCodec)?),
        BackendKind::Sqlite => Box::new(SqliteClientRepository::open(&config.path)?),
    };
    Ok(repo)
}

/// Convenience for `open_repository(&RepositoryConfig::from_path(path)?)`.
pub fn open_repository_at(path: impl AsRef<Path>) -> Result<Box<dyn ClientRepository>, Box<dyn Error>> {
    let config = RepositoryConfig::from_path(path.as_ref())?;
    Ok(open_repository(&config)?)
}

#[cfg(test)]
mod tests {
    use super::{BackendKind, ConfigError, RepositoryConfig};
    use std::path::PathBuf;

    #[test]
    fn from_path_infers_backend_by_extension() {
        let cases = [
            ("clients.json", BackendKind::Json),
            ("clients.YAML", BackendKind::Yaml),
            ("clients.yml", BackendKind::Yaml),
            ("pawnshop.sqlite3", BackendKind::Sqlite),
            ("pawnshop.db", BackendKind::Sqlite),
        ];
        for (path, expected) in cases {
            let config = RepositoryConfig::from_path(path).unwrap();
            assert_eq!(config.backend, expected, "path {path}");
        }
    }

    #[test]
    fn from_path_rejects_unknown_extension() {
        let err = RepositoryConfig::from_path("clients.csv").unwrap_err();
        assert_eq!(err, ConfigError::UnknownExtension(PathBuf::from("clients.csv")));
    }

    #[test]
    fn config_deserializes_from_snake_case_json() {
        let config: RepositoryConfig =
            serde_json::from_str(r#"{"backend":"sqlite","path":"/var/lib/pawnshop.db"}"#).unwrap();
        assert_eq!(config.backend, BackendKind::Sqlite);
        assert_eq!(config.path, PathBuf::from("/var/lib/pawnshop.db"));
    }
}
