use std::fs;
use std::path::{Path, PathBuf};

use crate::common::{atomic, Atomic};
use crate::errors::{ErrorKind, RepoError, RepoResult};
use crate::record::Record;

/// File-backed store for one record collection.
///
/// # Purpose
/// Owns the backing JSON document and the in-memory cache of the collection.
/// The whole collection is serialized as a single JSON array of records; the
/// document lives at `{data_dir}/{name}s.json` (record type name
/// pluralized).
///
/// # Caching
/// The collection is loaded lazily, at most once per process lifetime unless
/// [invalidate](FileStore::invalidate) clears the cache. Every mutation is
/// written through to disk immediately; there is no write buffering.
///
/// # Limits
/// One `FileStore` owns its document exclusively within a process. Nothing
/// coordinates concurrent writers across processes: the last full-document
/// write wins, and the other writer's changes are silently lost. Callers
/// that share a document between processes must coordinate externally.
pub struct FileStore {
    name: String,
    file_path: PathBuf,
    cache: Atomic<Option<Vec<Record>>>,
}

impl FileStore {
    /// Creates a store for the named record type under the given data
    /// directory. Nothing is read from disk until the first access.
    pub fn new(data_dir: impl AsRef<Path>, name: &str) -> Self {
        let file_path = data_dir.as_ref().join(format!("{}s.json", name));
        FileStore {
            name: name.to_string(),
            file_path,
            cache: atomic(None),
        }
    }

    /// Returns the record type name this store was created for.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the path of the backing document.
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Checks whether the collection has been loaded into memory.
    pub fn is_loaded(&self) -> bool {
        self.cache.read().is_some()
    }

    /// Returns a snapshot of the in-memory collection, loading it from the
    /// backing document first if it has not been loaded yet.
    pub fn objects(&self) -> RepoResult<Vec<Record>> {
        if !self.is_loaded() {
            self.read()?;
        }
        let guard = self.cache.read();
        match guard.as_ref() {
            Some(records) => Ok(records.clone()),
            None => Err(RepoError::new(
                "Collection cache is not loaded",
                ErrorKind::InternalError,
            )),
        }
    }

    /// Loads and parses the backing document into the cache.
    ///
    /// # Behavior
    /// - A missing document is not an error: the collection is initialized
    ///   empty and a warning is logged; the document is created on the
    ///   first write.
    /// - An unparsable document is an error: it is logged, the cache is
    ///   left unset, and [ErrorKind::FileCorrupted] is returned. Every
    ///   subsequent access fails the same way until the document is fixed
    ///   or [invalidate](FileStore::invalidate)-and-repair happens.
    pub fn read(&self) -> RepoResult<()> {
        match fs::read_to_string(&self.file_path) {
            Ok(raw) => match serde_json::from_str::<Vec<Record>>(&raw) {
                Ok(records) => {
                    *self.cache.write() = Some(records);
                    Ok(())
                }
                Err(err) => {
                    log::error!(
                        "Error while reading {} repository: {}",
                        self.name,
                        err
                    );
                    Err(RepoError::new_with_cause(
                        &format!("{} repository is corrupted", self.name),
                        ErrorKind::FileCorrupted,
                        err.into(),
                    ))
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::warn!(
                    "{} repository does not exist. It will be created on demand",
                    self.name
                );
                *self.cache.write() = Some(Vec::new());
                Ok(())
            }
            Err(err) => {
                log::error!("Error while reading {} repository: {}", self.name, err);
                Err(err.into())
            }
        }
    }

    /// Serializes the full in-memory collection and persists it, replacing
    /// the previous document content. The data directory is created on
    /// first write. This is the only operation that touches durable
    /// storage.
    pub fn write(&self) -> RepoResult<()> {
        let records = {
            let guard = self.cache.read();
            match guard.as_ref() {
                Some(records) => records.clone(),
                None => {
                    return Err(RepoError::new(
                        "Cannot persist a collection that has not been loaded",
                        ErrorKind::InvalidOperation,
                    ))
                }
            }
        };

        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string(&records)?;
        fs::write(&self.file_path, json)?;
        Ok(())
    }

    /// Applies `f` to the in-memory collection (loading it first if
    /// needed), then writes the modified collection through to disk.
    pub fn modify<R>(&self, f: impl FnOnce(&mut Vec<Record>) -> R) -> RepoResult<R> {
        if !self.is_loaded() {
            self.read()?;
        }
        let result = {
            let mut guard = self.cache.write();
            let records = guard.get_or_insert_with(Vec::new);
            f(records)
        };
        self.write()?;
        Ok(result)
    }

    /// Clears the in-memory cache so the next access reloads the backing
    /// document.
    pub fn invalidate(&self) {
        *self.cache.write() = None;
    }
}
