use std::sync::Arc;

use crate::errors::RepoResult;
use crate::record::Record;

/// Contract for implementing read-side record enrichers.
///
/// # Purpose
/// Defines the interface for the optional extra-data hook that augments
/// records with computed fields before they are returned from `get` and
/// `get_all`. Enrichment produces a derived view only; the stored records
/// are never modified by it.
///
/// # Trait Methods
/// - `name()`: returns a unique identifier for the enricher
/// - `enrich()`: transforms a record after it is read from storage
///
/// # Usage
/// An enricher might join in data computed elsewhere:
/// ```text
/// struct OwnerEnricher;
///
/// impl EnricherProvider for OwnerEnricher {
///     fn name(&self) -> String {
///         "OwnerEnricher".to_string()
///     }
///
///     fn enrich(&self, mut record: Record) -> RepoResult<Record> {
///         record.put("OwnerName", lookup_owner(&record))?;
///         Ok(record)
///     }
/// }
/// ```
pub trait EnricherProvider: Send + Sync {
    /// Returns the unique name of this enricher.
    fn name(&self) -> String;

    /// Transforms a record after it has been read from storage.
    ///
    /// # Behavior
    /// Called on every record returned by a read operation. Receives the
    /// record by value (a copy of the stored one) and returns the augmented
    /// view. If this method returns an error, the read operation fails.
    fn enrich(&self, record: Record) -> RepoResult<Record>;
}

/// Wraps an enricher implementation.
///
/// Provides a type-erased, cloneable wrapper around any [EnricherProvider]
/// implementation, shared via `Arc` for polymorphic dispatch.
#[derive(Clone)]
pub struct Enricher {
    inner: Arc<dyn EnricherProvider>,
}

impl Enricher {
    /// Creates a new enricher from an implementation.
    pub fn new(inner: Arc<dyn EnricherProvider>) -> Self {
        Enricher { inner }
    }

    /// Returns the unique name of this enricher.
    pub fn name(&self) -> String {
        self.inner.name()
    }

    /// Transforms a record after it has been read from storage.
    pub fn enrich(&self, record: Record) -> RepoResult<Record> {
        self.inner.enrich(record)
    }
}
