use std::borrow::Cow;
use std::fmt::{Debug, Display, Formatter};

use im::OrdMap;

use crate::common::Value;
use crate::errors::{ErrorKind, RepoError, RepoResult};

/// The reserved identifier field present on every stored record.
pub const ID_FIELD: &str = "Id";

/// The field set on a record returned from a rejected add to signal a
/// key-field uniqueness conflict.
pub const CONFLICT_FIELD: &str = "conflict";

/// An open-ended mapping of field names to values, persisted as one JSON
/// object inside the backing document.
///
/// # Purpose
/// `Record` is the unit of storage. Apart from the reserved [ID_FIELD]
/// (a positive integer assigned by the repository, never by the caller) all
/// fields are opaque to the store; their validity is delegated to the
/// [Model](crate::model::Model) collaborator.
///
/// # Serialization
/// Serialized transparently as its field map, so a record appears in the
/// backing document as a plain JSON object.
#[derive(Clone, PartialEq, Default, serde::Deserialize, serde::Serialize)]
#[serde(transparent)]
pub struct Record {
    data: OrdMap<String, Value>,
}

impl Record {
    /// Creates a new empty record.
    pub fn new() -> Self {
        Record { data: OrdMap::new() }
    }

    /// Checks if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the number of fields in the record.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Associates the specified [Value] with the specified field in this
    /// record. If the field already exists, its value is replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * the field name is empty
    /// * the field is the reserved [ID_FIELD] and the value is not a
    ///   positive integer (the lowest assignable id is 1, so no real record
    ///   can ever carry id 0)
    pub fn put<'a, T: Into<Value>>(
        &mut self,
        key: impl Into<Cow<'a, str>>,
        value: T,
    ) -> RepoResult<()> {
        let key = key.into();
        if key.is_empty() {
            log::error!("Record does not support empty field names");
            return Err(RepoError::new(
                "Record does not support empty field names",
                ErrorKind::InvalidOperation,
            ));
        }

        let value = value.into();
        if key == ID_FIELD && !matches!(value, Value::I64(id) if id > 0) {
            log::error!("Record id must be a positive integer, got {}", value);
            return Err(RepoError::new(
                "Record id must be a positive integer",
                ErrorKind::InvalidId,
            ));
        }

        self.data.insert(key.into_owned(), value);
        Ok(())
    }

    /// Returns the value of the specified field, or [Value::Null] if the
    /// record has no such field.
    pub fn get(&self, key: &str) -> Value {
        self.data.get(key).cloned().unwrap_or(Value::Null)
    }

    /// Returns the record identifier, if one has been assigned.
    pub fn id(&self) -> Option<u64> {
        match self.data.get(ID_FIELD) {
            Some(Value::I64(id)) if *id > 0 => Some(*id as u64),
            _ => None,
        }
    }

    /// Checks whether an identifier has been assigned to this record.
    pub fn has_id(&self) -> bool {
        self.id().is_some()
    }

    /// Checks whether the record contains the specified field.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Removes the specified field from the record.
    pub fn remove(&mut self, key: &str) {
        self.data.remove(key);
    }

    /// Returns the field names of this record.
    pub fn fields(&self) -> Vec<String> {
        self.data.keys().cloned().collect()
    }

    /// Returns an iterator over the record's fields and values.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }
}

impl Debug for Record {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for Record {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| std::fmt::Error)?;
        write!(f, "{}", json)
    }
}

/// Strips the surrounding quotes that `stringify!` leaves on string-literal
/// keys in the [record!](crate::record!) macro.
pub fn normalize(key: &str) -> String {
    key.trim_matches('"').to_string()
}

/// Creates a [Record] from field/value pairs.
///
/// # Examples
///
/// ```rust,ignore
/// use jsonrepo::record;
///
/// let empty = record! {};
/// let contact = record! {
///     Name: "Alice",
///     Email: "alice@example.com",
///     Age: 30
/// };
/// ```
#[macro_export]
macro_rules! record {
    // match an empty record
    () => {
        $crate::record::Record::new()
    };

    // match a record with field value pairs
    ($($key:tt : $value:tt),* $(,)?) => {
        {
            #[allow(unused_imports)]
            use $crate::record_value;

            let mut rec = $crate::record::Record::new();
            $(
                rec.put($crate::record::normalize(stringify!($key)), $crate::record_value!($value))
                    .expect(&format!("Failed to put value {} in record", stringify!($value)));
            )*
            rec
        }
    };
}

/// Helper macro to convert values for the [record!](crate::record!) macro.
/// Handles nested records, arrays, and expressions.
#[macro_export]
macro_rules! record_value {
    // match a nested record
    ({ $($key:tt : $value:tt),* $(,)? }) => {
        {
            $crate::common::Value::Record($crate::record!{ $($key : $value),* })
        }
    };

    // match an array of values
    ([ $($value:tt),* $(,)? ]) => {
        $crate::common::Value::Array(vec![$($crate::record_value!($value)),*])
    };

    // match an expression (variable, literal, call, parenthesized arithmetic)
    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}
