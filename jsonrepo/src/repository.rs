use std::path::{Path, PathBuf};

use crate::common::{delete_by_index, Value};
use crate::enricher::Enricher;
use crate::errors::{ErrorKind, RepoError, RepoResult};
use crate::model::Model;
use crate::query::{self, QueryParams};
use crate::record::{Record, CONFLICT_FIELD, ID_FIELD};
use crate::store::FileStore;

/// The default directory holding the backing documents.
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Outcome of an [update](Repository::update) operation.
///
/// Exactly one of these is returned per update call; there is no partial
/// application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateResult {
    /// The record was replaced and persisted.
    Ok,
    /// The key-field value collides with another record.
    Conflict,
    /// No stored record carries the incoming identifier.
    NotFound,
    /// The record failed model validation.
    Invalid,
}

/// The public operation set over one file-backed record collection.
///
/// # Purpose
/// `Repository` composes the [FileStore], the identifier/uniqueness
/// consistency rules, and the query engine into the create/read/update/
/// delete surface record-oriented services call into. Identifiers are
/// assigned here on add (`max + 1`, starting at 1) and never by the caller;
/// if the model declares a key field its values are kept unique across the
/// collection by a linear scan at mutation time.
///
/// # Persistence
/// Every successful mutation writes the full collection through to the
/// backing document immediately; reads operate on the lazily loaded cache.
///
/// # Examples
///
/// ```rust,ignore
/// use jsonrepo::repository::Repository;
/// use jsonrepo::record;
///
/// let repository = Repository::builder()
///     .data_dir("./data")
///     .model(contact_model())
///     .build()?;
///
/// let stored = repository.add(record! { Name: "Alice", Email: "alice@example.com" });
/// ```
pub struct Repository {
    store: FileStore,
    model: Model,
    enricher: Option<Enricher>,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("model", &self.model.name())
            .finish_non_exhaustive()
    }
}

impl Repository {
    /// Creates a repository for the given model, with its backing document
    /// under `data_dir`.
    pub fn new(data_dir: impl AsRef<Path>, model: Model) -> Self {
        let store = FileStore::new(data_dir, &model.name());
        Repository {
            store,
            model,
            enricher: None,
        }
    }

    /// Returns a builder for configuring a repository.
    pub fn builder() -> RepositoryBuilder {
        RepositoryBuilder::new()
    }

    /// Returns the model this repository was created for.
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Returns the underlying file store.
    pub fn store(&self) -> &FileStore {
        &self.store
    }

    /// Installs the extra-data enrichment hook applied to every record
    /// returned by [get](Repository::get) and [get_all](Repository::get_all).
    pub fn set_enricher(&mut self, enricher: Enricher) {
        self.enricher = Some(enricher);
    }

    /// Adds a record to the collection.
    ///
    /// # Behavior
    /// - an invalid record is rejected with `None`; nothing is persisted
    /// - a key-field collision returns the input record flagged with
    ///   `conflict: true`, without an identifier and without persisting
    /// - otherwise the next identifier is assigned, the record is appended
    ///   and persisted, and the stored record is returned
    ///
    /// Unexpected failures during this sequence are caught, logged, and
    /// reported as `None` rather than propagated.
    pub fn add(&self, record: Record) -> Option<Record> {
        match self.try_add(record) {
            Ok(outcome) => outcome,
            Err(err) => {
                log::error!(
                    "Error adding new item in {} repository: {:?}",
                    self.store.name(),
                    err
                );
                None
            }
        }
    }

    fn try_add(&self, mut record: Record) -> RepoResult<Option<Record>> {
        if !self.model.valid(&record) {
            return Ok(None);
        }

        let objects = self.store.objects()?;
        if let Some(key) = self.model.key() {
            let incoming = record.get(&key);
            // a new record has no identifier yet, so nothing is excluded
            if Self::find_by_field(&objects, &key, &incoming, None).is_some() {
                record.put(CONFLICT_FIELD, true)?;
                return Ok(Some(record));
            }
        }

        record.put(ID_FIELD, Self::next_id(&objects))?;
        let stored = record.clone();
        self.store.modify(|records| records.push(record))?;
        Ok(Some(stored))
    }

    /// Replaces the stored record carrying the incoming record's
    /// identifier with the incoming record, persisting on success. The
    /// incoming fields entirely supersede the stored ones.
    ///
    /// # Errors
    /// Persistence failures propagate; all expected outcomes are reported
    /// through [UpdateResult].
    pub fn update(&self, record: Record) -> RepoResult<UpdateResult> {
        if !self.model.valid(&record) {
            return Ok(UpdateResult::Invalid);
        }

        let Some(id) = record.id() else {
            return Ok(UpdateResult::NotFound);
        };

        let objects = self.store.objects()?;
        if let Some(key) = self.model.key() {
            let incoming = record.get(&key);
            if Self::find_by_field(&objects, &key, &incoming, Some(id)).is_some() {
                return Ok(UpdateResult::Conflict);
            }
        }

        let Some(position) = objects.iter().position(|r| r.id() == Some(id)) else {
            return Ok(UpdateResult::NotFound);
        };
        self.store.modify(|records| records[position] = record)?;
        Ok(UpdateResult::Ok)
    }

    /// Removes the record with the given identifier. Returns `false` when
    /// no such record exists.
    pub fn remove(&self, id: u64) -> RepoResult<bool> {
        let objects = self.store.objects()?;
        match objects.iter().position(|r| r.id() == Some(id)) {
            Some(position) => {
                self.store.modify(|records| {
                    records.remove(position);
                })?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Removes the records at the given positions within the current
    /// collection ordering in a single batch, persisting once afterwards.
    /// A no-op when the position set is empty.
    pub fn remove_by_index(&self, positions: &[usize]) -> RepoResult<()> {
        if positions.is_empty() {
            return Ok(());
        }
        self.store
            .modify(|records| delete_by_index(records, positions))?;
        Ok(())
    }

    /// Returns the record with the given identifier, enriched if a hook is
    /// installed, or `None` when no such record exists.
    pub fn get(&self, id: u64) -> RepoResult<Option<Record>> {
        let objects = self.store.objects()?;
        let Some(record) = objects.into_iter().find(|r| r.id() == Some(id)) else {
            return Ok(None);
        };
        match &self.enricher {
            Some(enricher) => Ok(Some(enricher.enrich(record)?)),
            None => Ok(Some(record)),
        }
    }

    /// Returns the collection, optionally filtered and sorted.
    ///
    /// # Behavior
    /// - the enrichment hook, if installed, is applied to every record
    ///   first; stored records are never mutated by this
    /// - without parameters the (possibly enriched) collection is returned
    ///   in storage order
    /// - with parameters, filters are applied first (a filter on a field
    ///   the model does not recognize fails the whole call with
    ///   [ErrorKind::InvalidFieldName]), then sort directives; the result
    ///   is a new sequence and storage order is untouched
    pub fn get_all(&self, params: Option<&QueryParams>) -> RepoResult<Vec<Record>> {
        let mut objects = self.store.objects()?;
        if let Some(enricher) = &self.enricher {
            objects = objects
                .into_iter()
                .map(|record| enricher.enrich(record))
                .collect::<RepoResult<Vec<Record>>>()?;
        }

        let Some(params) = params else {
            return Ok(objects);
        };

        let (sort_specs, filter_specs) = query::parse(params, &self.model)?;
        let mut results: Vec<Record> = objects
            .into_iter()
            .filter(|record| query::matches_filters(record, &filter_specs))
            .collect();
        query::sort_records(&mut results, &sort_specs);
        Ok(results)
    }

    /// Returns the next assignable identifier: one more than the maximum
    /// identifier currently present, or 1 for an empty collection.
    fn next_id(objects: &[Record]) -> u64 {
        objects.iter().filter_map(|record| record.id()).max().unwrap_or(0) + 1
    }

    /// Scans for a record whose field strictly equals `value`, skipping the
    /// record with `excluded_id` so an update does not conflict with
    /// itself. `None` exclusion means no record is skipped.
    fn find_by_field<'a>(
        objects: &'a [Record],
        field: &str,
        value: &Value,
        excluded_id: Option<u64>,
    ) -> Option<&'a Record> {
        if field.is_empty() {
            return None;
        }
        objects.iter().find(|record| {
            record.get(field) == *value
                && match excluded_id {
                    Some(excluded) => record.id() != Some(excluded),
                    None => true,
                }
        })
    }
}

/// Builder for [Repository] instances.
///
/// # Examples
///
/// ```rust,ignore
/// let repository = Repository::builder()
///     .data_dir("/var/lib/app/data")
///     .model(contact_model())
///     .enricher(owner_enricher())
///     .build()?;
/// ```
pub struct RepositoryBuilder {
    data_dir: PathBuf,
    model: Option<Model>,
    enricher: Option<Enricher>,
}

impl RepositoryBuilder {
    fn new() -> Self {
        RepositoryBuilder {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            model: None,
            enricher: None,
        }
    }

    /// Sets the directory holding the backing document. Defaults to
    /// [DEFAULT_DATA_DIR].
    pub fn data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Sets the model describing the record type. Required.
    pub fn model(mut self, model: Model) -> Self {
        self.model = Some(model);
        self
    }

    /// Installs the extra-data enrichment hook.
    pub fn enricher(mut self, enricher: Enricher) -> Self {
        self.enricher = Some(enricher);
        self
    }

    /// Builds the repository.
    ///
    /// # Errors
    /// Fails with [ErrorKind::InvalidOperation] when no model was provided.
    pub fn build(self) -> RepoResult<Repository> {
        let Some(model) = self.model else {
            return Err(RepoError::new(
                "Cannot build a repository without a model",
                ErrorKind::InvalidOperation,
            ));
        };
        let mut repository = Repository::new(self.data_dir, model);
        if let Some(enricher) = self.enricher {
            repository.set_enricher(enricher);
        }
        Ok(repository)
    }
}

impl Default for RepositoryBuilder {
    fn default() -> Self {
        RepositoryBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enricher::EnricherProvider;
    use crate::model::ModelProvider;
    use crate::record;
    use std::sync::Arc;

    struct ContactModel;

    impl ModelProvider for ContactModel {
        fn name(&self) -> String {
            "Contact".to_string()
        }

        fn valid(&self, record: &Record) -> bool {
            record.get("Name").is_string()
        }

        fn key(&self) -> Option<String> {
            Some("Email".to_string())
        }

        fn field_names(&self) -> Vec<String> {
            vec!["Name".to_string(), "Email".to_string(), "Age".to_string()]
        }
    }

    // same record type without a key field declaration
    struct KeylessModel;

    impl ModelProvider for KeylessModel {
        fn name(&self) -> String {
            "Contact".to_string()
        }

        fn valid(&self, record: &Record) -> bool {
            record.get("Name").is_string()
        }

        fn field_names(&self) -> Vec<String> {
            vec!["Name".to_string(), "Email".to_string(), "Age".to_string()]
        }
    }

    struct GreetingEnricher;

    impl EnricherProvider for GreetingEnricher {
        fn name(&self) -> String {
            "GreetingEnricher".to_string()
        }

        fn enrich(&self, mut record: Record) -> RepoResult<Record> {
            let greeting = format!("Hello {}", record.get("Name"));
            record.put("Greeting", greeting)?;
            Ok(record)
        }
    }

    fn contact_repository(dir: &Path) -> Repository {
        Repository::new(dir, Model::new(Arc::new(ContactModel)))
    }

    fn seed_contacts(repository: &Repository) {
        repository
            .add(record! { Name: "Alice", Email: "alice@example.com" })
            .unwrap();
        repository
            .add(record! { Name: "Bob", Email: "bob@example.com" })
            .unwrap();
        repository
            .add(record! { Name: "Alina", Email: "alina@example.com" })
            .unwrap();
    }

    #[test]
    fn test_add_assigns_monotonic_ids() {
        let dir = tempfile::tempdir().unwrap();
        let repository = contact_repository(dir.path());

        let first = repository
            .add(record! { Name: "Alice", Email: "alice@example.com" })
            .unwrap();
        assert_eq!(first.id(), Some(1));

        let second = repository
            .add(record! { Name: "Bob", Email: "bob@example.com" })
            .unwrap();
        assert_eq!(second.id(), Some(2));
    }

    #[test]
    fn test_add_then_get_returns_equal_record() {
        let dir = tempfile::tempdir().unwrap();
        let repository = contact_repository(dir.path());

        let stored = repository
            .add(record! { Name: "Alice", Email: "alice@example.com", Age: 30 })
            .unwrap();
        let fetched = repository.get(stored.id().unwrap()).unwrap().unwrap();
        assert_eq!(fetched, stored);
        assert_eq!(fetched.get("Name"), "Alice".into());
        assert_eq!(fetched.get("Age"), 30.into());
    }

    #[test]
    fn test_add_invalid_record_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let repository = contact_repository(dir.path());

        // Name must be a string for this model
        assert!(repository.add(record! { Email: "x@y.z" }).is_none());
        assert_eq!(repository.get_all(None).unwrap().len(), 0);
    }

    #[test]
    fn test_add_key_conflict_flags_record_without_persisting() {
        let dir = tempfile::tempdir().unwrap();
        let repository = contact_repository(dir.path());
        repository
            .add(record! { Name: "Alice", Email: "alice@example.com" })
            .unwrap();

        let rejected = repository
            .add(record! { Name: "Impostor", Email: "alice@example.com" })
            .unwrap();
        assert_eq!(rejected.get(CONFLICT_FIELD), true.into());
        assert!(rejected.id().is_none());
        assert_eq!(repository.get_all(None).unwrap().len(), 1);
    }

    #[test]
    fn test_add_without_key_field_allows_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let repository = Repository::new(dir.path(), Model::new(Arc::new(KeylessModel)));

        repository
            .add(record! { Name: "Alice", Email: "same@example.com" })
            .unwrap();
        let second = repository
            .add(record! { Name: "Bob", Email: "same@example.com" })
            .unwrap();
        assert_eq!(second.id(), Some(2));
        assert_eq!(repository.get_all(None).unwrap().len(), 2);
    }

    #[test]
    fn test_add_after_removal_does_not_reuse_lower_ids() {
        let dir = tempfile::tempdir().unwrap();
        let repository = contact_repository(dir.path());
        repository
            .add(record! { Name: "Alice", Email: "alice@example.com" })
            .unwrap();
        repository
            .add(record! { Name: "Bob", Email: "bob@example.com" })
            .unwrap();

        assert!(repository.remove(1).unwrap());
        let next = repository
            .add(record! { Name: "Carol", Email: "carol@example.com" })
            .unwrap();
        assert_eq!(next.id(), Some(3));
    }

    #[test]
    fn test_remove_shrinks_collection_and_get_misses() {
        let dir = tempfile::tempdir().unwrap();
        let repository = contact_repository(dir.path());
        seed_contacts(&repository);

        assert!(repository.remove(2).unwrap());
        assert!(repository.get(2).unwrap().is_none());
        assert_eq!(repository.get_all(None).unwrap().len(), 2);
    }

    #[test]
    fn test_remove_unknown_id_returns_false() {
        let dir = tempfile::tempdir().unwrap();
        let repository = contact_repository(dir.path());
        seed_contacts(&repository);

        assert!(!repository.remove(99).unwrap());
        assert_eq!(repository.get_all(None).unwrap().len(), 3);
    }

    #[test]
    fn test_update_replaces_record_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let repository = contact_repository(dir.path());
        seed_contacts(&repository);

        let updated = record! { Id: 2, Name: "Bobby", Email: "bob@example.com" };
        assert_eq!(repository.update(updated).unwrap(), UpdateResult::Ok);

        let fetched = repository.get(2).unwrap().unwrap();
        assert_eq!(fetched.get("Name"), "Bobby".into());
        // position in storage order is preserved
        let all = repository.get_all(None).unwrap();
        assert_eq!(all[1].id(), Some(2));
    }

    #[test]
    fn test_update_is_idempotent_for_noop_change() {
        let dir = tempfile::tempdir().unwrap();
        let repository = contact_repository(dir.path());
        seed_contacts(&repository);

        let before = repository.get_all(None).unwrap();
        let unchanged = repository.get(1).unwrap().unwrap();
        assert_eq!(repository.update(unchanged).unwrap(), UpdateResult::Ok);
        assert_eq!(repository.get_all(None).unwrap(), before);
    }

    #[test]
    fn test_update_outcomes() {
        let dir = tempfile::tempdir().unwrap();
        let repository = contact_repository(dir.path());
        seed_contacts(&repository);

        // invalid: Name missing
        let invalid = record! { Id: 1, Email: "alice@example.com" };
        assert_eq!(repository.update(invalid).unwrap(), UpdateResult::Invalid);

        // conflict: takes Bob's email
        let conflicting = record! { Id: 1, Name: "Alice", Email: "bob@example.com" };
        assert_eq!(
            repository.update(conflicting).unwrap(),
            UpdateResult::Conflict
        );

        // not found: unknown id
        let unknown = record! { Id: 42, Name: "Ghost", Email: "ghost@example.com" };
        assert_eq!(repository.update(unknown).unwrap(), UpdateResult::NotFound);

        // not found: no id declared
        let keyless = record! { Name: "Nobody", Email: "nobody@example.com" };
        assert_eq!(repository.update(keyless).unwrap(), UpdateResult::NotFound);
    }

    #[test]
    fn test_update_keeps_own_key_value_without_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let repository = contact_repository(dir.path());
        seed_contacts(&repository);

        // same email as before; the uniqueness scan excludes the record itself
        let same_email = record! { Id: 1, Name: "Alice B.", Email: "alice@example.com" };
        assert_eq!(repository.update(same_email).unwrap(), UpdateResult::Ok);
    }

    #[test]
    fn test_remove_by_index_batch() {
        let dir = tempfile::tempdir().unwrap();
        let repository = contact_repository(dir.path());
        seed_contacts(&repository);

        repository.remove_by_index(&[0, 2]).unwrap();
        let all = repository.get_all(None).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].get("Name"), "Bob".into());
    }

    #[test]
    fn test_remove_by_index_empty_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let repository = contact_repository(dir.path());
        seed_contacts(&repository);

        repository.remove_by_index(&[]).unwrap();
        assert_eq!(repository.get_all(None).unwrap().len(), 3);
    }

    #[test]
    fn test_get_all_without_params_preserves_storage_order() {
        let dir = tempfile::tempdir().unwrap();
        let repository = contact_repository(dir.path());
        seed_contacts(&repository);

        let all = repository.get_all(None).unwrap();
        let names: Vec<String> = all.iter().map(|r| r.get("Name").to_string()).collect();
        assert_eq!(names, vec!["Alice", "Bob", "Alina"]);
    }

    #[test]
    fn test_get_all_wildcard_filter() {
        let dir = tempfile::tempdir().unwrap();
        let repository = contact_repository(dir.path());
        seed_contacts(&repository);

        let params = QueryParams::new().filter("Name", "Al*");
        let filtered = repository.get_all(Some(&params)).unwrap();
        let ids: Vec<u64> = filtered.iter().filter_map(|r| r.id()).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_get_all_sort_descending() {
        let dir = tempfile::tempdir().unwrap();
        let repository = contact_repository(dir.path());
        seed_contacts(&repository);

        let params = QueryParams::new().sort("Name,desc");
        let sorted = repository.get_all(Some(&params)).unwrap();
        let names: Vec<String> = sorted.iter().map(|r| r.get("Name").to_string()).collect();
        assert_eq!(names, vec!["Bob", "Alina", "Alice"]);
    }

    #[test]
    fn test_get_all_filter_and_sort_combined() {
        let dir = tempfile::tempdir().unwrap();
        let repository = contact_repository(dir.path());
        seed_contacts(&repository);

        let params = QueryParams::new().filter("Name", "Al*").sort("Name");
        let results = repository.get_all(Some(&params)).unwrap();
        let names: Vec<String> = results.iter().map(|r| r.get("Name").to_string()).collect();
        assert_eq!(names, vec!["Alice", "Alina"]);
    }

    #[test]
    fn test_get_all_invalid_filter_field_fails_whole_call() {
        let dir = tempfile::tempdir().unwrap();
        let repository = contact_repository(dir.path());
        seed_contacts(&repository);

        let params = QueryParams::new().filter("Phone", "555*");
        let result = repository.get_all(Some(&params));
        assert!(result.is_err());
        let error = result.unwrap_err();
        assert_eq!(error.kind(), &ErrorKind::InvalidFieldName);
        assert_eq!(error.message(), "Phone is not a valid filter");
    }

    #[test]
    fn test_missing_document_then_first_add_creates_it() {
        let dir = tempfile::tempdir().unwrap();
        let repository = contact_repository(dir.path());

        assert_eq!(repository.get_all(None).unwrap().len(), 0);
        assert!(!repository.store().file_path().exists());

        repository
            .add(record! { Name: "Alice", Email: "alice@example.com" })
            .unwrap();
        assert!(repository.store().file_path().exists());
    }

    #[test]
    fn test_collection_round_trips_through_document() {
        let dir = tempfile::tempdir().unwrap();
        let repository = contact_repository(dir.path());
        seed_contacts(&repository);
        let before = repository.get_all(None).unwrap();

        repository.store().invalidate();
        assert_eq!(repository.get_all(None).unwrap(), before);
    }

    #[test]
    fn test_enricher_applied_on_reads_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut repository = contact_repository(dir.path());
        seed_contacts(&repository);
        repository.set_enricher(Enricher::new(Arc::new(GreetingEnricher)));

        let fetched = repository.get(1).unwrap().unwrap();
        assert_eq!(fetched.get("Greeting"), "Hello Alice".into());

        let all = repository.get_all(None).unwrap();
        assert!(all.iter().all(|r| r.contains_key("Greeting")));

        // stored records stay untouched
        repository.store().invalidate();
        let raw = repository.store().objects().unwrap();
        assert!(raw.iter().all(|r| !r.contains_key("Greeting")));
    }

    #[test]
    fn test_builder_wires_everything() {
        let dir = tempfile::tempdir().unwrap();
        let repository = Repository::builder()
            .data_dir(dir.path())
            .model(Model::new(Arc::new(ContactModel)))
            .enricher(Enricher::new(Arc::new(GreetingEnricher)))
            .build()
            .unwrap();

        repository
            .add(record! { Name: "Alice", Email: "alice@example.com" })
            .unwrap();
        let fetched = repository.get(1).unwrap().unwrap();
        assert_eq!(fetched.get("Greeting"), "Hello Alice".into());
    }

    #[test]
    fn test_builder_requires_model() {
        let result = Repository::builder().build();
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().kind(),
            &ErrorKind::InvalidOperation
        );
    }
}
