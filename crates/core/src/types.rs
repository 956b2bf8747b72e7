use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// All primary keys exposed by the console API are integer ids.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Field name -> human-readable messages, as rendered next to dialog inputs.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// An eager-loadable relation.
///
/// The console never lazily fetches a relation: a relation that was not
/// loaded alongside its parent stays [`Relation::NotLoaded`] and is treated
/// as absent. Deserializing a present JSON key (including `null`) produces
/// [`Relation::Loaded`]; a missing key falls back to `NotLoaded` via
/// `#[serde(default)]` on the owning field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Relation<T> {
    Loaded(T),
    #[default]
    NotLoaded,
}

impl<T> Relation<T> {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Relation::Loaded(_))
    }

    /// Borrow the loaded value, if any.
    pub fn loaded(&self) -> Option<&T> {
        match self {
            Relation::Loaded(value) => Some(value),
            Relation::NotLoaded => None,
        }
    }
}

impl<T> From<Option<T>> for Relation<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Relation::Loaded(value),
            None => Relation::NotLoaded,
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Relation<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Relation::Loaded)
    }
}

impl<T: Serialize> Serialize for Relation<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Relation::Loaded(value) => value.serialize(serializer),
            Relation::NotLoaded => serializer.serialize_none(),
        }
    }
}
