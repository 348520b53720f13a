use std::sync::Arc;

use crate::record::{Record, ID_FIELD};

/// Contract for the external model collaborator describing one record type.
///
/// # Purpose
/// The repository treats record fields as opaque; what counts as a valid
/// record, which fields exist, and which field (if any) must be unique is
/// declared by the model. The model's name also determines where the
/// backing document lives on disk.
///
/// # Trait Methods
/// - `name()`: the record type name; the store pluralizes it to derive the
///   backing document path (`{data_dir}/{name}s.json`)
/// - `valid()`: predicate applied to every record before it is persisted
/// - `key()`: the optional field whose values must be unique across the
///   collection (besides the identifier)
/// - `field_names()`: the fields recognized for query filtering
pub trait ModelProvider: Send + Sync {
    /// Returns the record type name.
    fn name(&self) -> String;

    /// Checks whether the record is valid for this model.
    fn valid(&self, record: &Record) -> bool;

    /// Returns the field that must be unique across the collection, if any.
    fn key(&self) -> Option<String> {
        None
    }

    /// Returns the field names recognized by this model.
    fn field_names(&self) -> Vec<String>;

    /// Checks whether the given field is recognized by this model.
    ///
    /// The reserved identifier field is always recognized.
    fn has_field(&self, field: &str) -> bool {
        field == ID_FIELD || self.field_names().iter().any(|name| name == field)
    }
}

/// Wraps a model implementation.
///
/// Provides a type-erased, cloneable handle around any [ModelProvider]
/// implementation, shared via `Arc` so one model can back both the store
/// and the query engine.
#[derive(Clone)]
pub struct Model {
    inner: Arc<dyn ModelProvider>,
}

impl Model {
    /// Creates a new model handle from an implementation.
    pub fn new(inner: Arc<dyn ModelProvider>) -> Self {
        Model { inner }
    }

    /// Returns the record type name.
    pub fn name(&self) -> String {
        self.inner.name()
    }

    /// Checks whether the record is valid for this model.
    pub fn valid(&self, record: &Record) -> bool {
        self.inner.valid(record)
    }

    /// Returns the field that must be unique across the collection, if any.
    pub fn key(&self) -> Option<String> {
        self.inner.key()
    }

    /// Returns the field names recognized by this model.
    pub fn field_names(&self) -> Vec<String> {
        self.inner.field_names()
    }

    /// Checks whether the given field is recognized by this model.
    pub fn has_field(&self, field: &str) -> bool {
        self.inner.has_field(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;

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
            vec!["Name".to_string(), "Email".to_string()]
        }
    }

    #[test]
    fn test_model_delegates_to_provider() {
        let model = Model::new(Arc::new(ContactModel));
        assert_eq!(model.name(), "Contact");
        assert_eq!(model.key(), Some("Email".to_string()));
        assert!(model.valid(&record! { Name: "Alice" }));
        assert!(!model.valid(&record! { Email: "a@b.c" }));
    }

    #[test]
    fn test_has_field_recognizes_declared_fields_and_id() {
        let model = Model::new(Arc::new(ContactModel));
        assert!(model.has_field("Name"));
        assert!(model.has_field("Email"));
        assert!(model.has_field(ID_FIELD));
        assert!(!model.has_field("Phone"));
    }
}
