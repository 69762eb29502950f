//! Flat-file client repository.
//!
//! # Responsibility
//! - Keep the whole client collection in memory and mirror it to one file.
//! - Delegate encoding to a `ClientCodec` (JSON or YAML).
//!
//! # Invariants
//! - The file is rewritten after every successful mutation (add, update,
//!   delete of an existing id, clear, sort).
//! - A mutation whose write fails is not applied in memory either.
//! - A missing or blank file loads as an empty collection; anything else that
//!   cannot be decoded is a fatal error.

use crate::codec::{ClientCodec, JsonCodec, YamlCodec};
use crate::model::client::{Client, ClientId, ClientSummary};
use crate::repo::client_repo::{ClientRepository, RepoError, RepoResult};
use crate::repo::collection::ClientCollection;
use log::{debug, error, info};
use std::cmp::Ordering;
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

pub type JsonClientRepository = FileClientRepository<JsonCodec>;
pub type YamlClientRepository = FileClientRepository<YamlCodec>;

/// File-backed client repository generic over its encoding.
#[derive(Debug)]
pub struct FileClientRepository<C: ClientCodec> {
    path: PathBuf,
    codec: C,
    collection: ClientCollection,
}

impl<C: ClientCodec> FileClientRepository<C> {
    /// Binds the repository to `path` and loads its current content.
    pub fn open(path: impl Into<PathBuf>, codec: C) -> RepoResult<Self> {
        let mut repo = Self {
            path: path.into(),
            codec,
            collection: ClientCollection::new(),
        };
        repo.load()?;
        Ok(repo)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current collection rendered in this repository's encoding.
    pub fn export_string(&self) -> RepoResult<String> {
        let bytes = self.codec.encode(self.collection.as_slice())?;
        String::from_utf8(bytes).map_err(|err| {
            RepoError::InvalidData(format!(
                "{} encoder produced non UTF-8 output: {err}",
                self.codec.format_name()
            ))
        })
    }

    /// Replaces the whole collection with `content`, decoded in this
    /// repository's encoding, and saves it.
    ///
    /// Identities are taken from `content`; the next `add` continues after
    /// the largest one. A document that fails to decode, repeats an identity
    /// or violates uniqueness leaves the repository and its file unchanged.
    /// Blank content imports an empty collection.
    pub fn import_str(&mut self, content: &str) -> RepoResult<()> {
        let imported = if content.trim().is_empty() {
            ClientCollection::new()
        } else {
            ClientCollection::from_clients(self.codec.decode(content.as_bytes())?)?
        };
        let count = imported.len();
        self.commit(|collection| {
            *collection = imported;
            Ok(())
        })?;
        info!(
            "event=client_import module=repo status=ok format={} count={count}",
            self.codec.format_name()
        );
        Ok(())
    }

    /// Applies `mutation` to a copy of the collection, writes the copy and
    /// only then adopts it.
    fn commit<T>(
        &mut self,
        mutation: impl FnOnce(&mut ClientCollection) -> RepoResult<T>,
    ) -> RepoResult<T> {
        let mut next = self.collection.clone();
        let output = mutation(&mut next)?;
        self.write_collection(&next)?;
        self.collection = next;
        Ok(output)
    }

    fn write_collection(&self, collection: &ClientCollection) -> RepoResult<()> {
        let started_at = Instant::now();
        let bytes = self.codec.encode(collection.as_slice())?;

        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }

        // Write-then-rename so readers never observe a half-written file.
        let temp_path = temp_path_for(&self.path);
        let written = fs::write(&temp_path, &bytes).and_then(|()| fs::rename(&temp_path, &self.path));
        if let Err(source) = written {
            error!(
                "event=file_save module=repo status=error format={} error={}",
                self.codec.format_name(),
                source
            );
            let _ = fs::remove_file(&temp_path);
            return Err(self.io_error(source));
        }

        debug!(
            "event=file_save module=repo status=ok format={} count={} bytes={} duration_ms={}",
            self.codec.format_name(),
            collection.len(),
            bytes.len(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    fn io_error(&self, source: std::io::Error) -> RepoError {
        RepoError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl<C: ClientCodec> ClientRepository for FileClientRepository<C> {
    fn load(&mut self) -> RepoResult<()> {
        let started_at = Instant::now();
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    "event=file_load module=repo status=ok format={} count=0 reason=missing_file",
                    self.codec.format_name()
                );
                self.collection = ClientCollection::new();
                return Ok(());
            }
            Err(source) => return Err(self.io_error(source)),
        };

        let collection = if bytes.iter().all(u8::is_ascii_whitespace) {
            ClientCollection::new()
        } else {
            let decoded = self.codec.decode(&bytes).map_err(|err| {
                error!(
                    "event=file_load module=repo status=error format={} error_code=decode_failed error={}",
                    self.codec.format_name(),
                    err
                );
                err
            })?;
            ClientCollection::from_clients(decoded)?
        };

        info!(
            "event=file_load module=repo status=ok format={} count={} duration_ms={}",
            self.codec.format_name(),
            collection.len(),
            started_at.elapsed().as_millis()
        );
        self.collection = collection;
        Ok(())
    }

    fn save(&self) -> RepoResult<()> {
        self.write_collection(&self.collection)
    }

    fn get_by_id(&self, id: ClientId) -> RepoResult<Client> {
        self.collection.get(id).cloned()
    }

    fn get_short_list(&self, offset: usize, count: usize) -> RepoResult<Vec<ClientSummary>> {
        self.collection.short_list(offset, count)
    }

    fn get_all(&self) -> RepoResult<Vec<Client>> {
        Ok(self.collection.as_slice().to_vec())
    }

    fn add(&mut self, candidate: &Client) -> RepoResult<Client> {
        let stored = self.commit(|collection| collection.add(candidate))?;
        info!("event=client_add module=repo status=ok backend=file id={}", stored.id);
        Ok(stored)
    }

    fn update(&mut self, id: ClientId, candidate: &Client) -> RepoResult<Client> {
        let stored = self.commit(|collection| collection.update(id, candidate))?;
        info!("event=client_update module=repo status=ok backend=file id={id}");
        Ok(stored)
    }

    fn delete(&mut self, id: ClientId) -> RepoResult<bool> {
        if self.collection.get(id).is_err() {
            return Ok(false);
        }
        let removed = self.commit(|collection| Ok(collection.delete(id)))?;
        info!("event=client_delete module=repo status=ok backend=file id={id}");
        Ok(removed)
    }

    fn count(&self) -> RepoResult<usize> {
        Ok(self.collection.len())
    }

    fn search_by_last_name(&self, needle: &str) -> RepoResult<Vec<Client>> {
        Ok(self.collection.search_by_last_name(needle))
    }

    fn search_by_phone(&self, phone: &str) -> RepoResult<Vec<Client>> {
        Ok(self.collection.search_by_phone(phone))
    }

    fn sort_by_cmp(&mut self, compare: &dyn Fn(&Client, &Client) -> Ordering) -> RepoResult<()> {
        self.commit(|collection| {
            collection.sort_by_cmp(compare);
            Ok(())
        })
    }

    fn clear(&mut self) -> RepoResult<()> {
        self.commit(|collection| {
            collection.clear();
            Ok(())
        })?;
        info!("event=client_clear module=repo status=ok backend=file");
        Ok(())
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("clients"));
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::temp_path_for;
    use std::path::Path;

    #[test]
    fn temp_path_is_a_sibling_of_the_target() {
        assert_eq!(
            temp_path_for(Path::new("/data/clients.json")),
            Path::new("/data/clients.json.tmp")
        );
    }
}
