//! Immutable record collections and the create/update/delete actions that
//! produce new snapshots.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::GymError;
use crate::query::field::Record;
use crate::validate::Validate;

/// A change to one collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Action<T> {
    Create(T),
    Update(T),
    Delete(String),
}

impl<T: Record> Action<T> {
    /// Id of the record this action touches.
    #[must_use]
    pub fn target_id(&self) -> &str {
        match self {
            Self::Create(record) | Self::Update(record) => record.id(),
            Self::Delete(id) => id,
        }
    }

    #[must_use]
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Create(_) => "create",
            Self::Update(_) => "update",
            Self::Delete(_) => "delete",
        }
    }
}

/// An immutable snapshot of one feature's records.
///
/// Record order is insertion order. The `id -> position` index is rebuilt
/// whenever a new snapshot is produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<T> {
    records: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Record> Collection<T> {
    /// Build a snapshot from seed records.
    ///
    /// # Errors
    ///
    /// Returns [`GymError::BusinessRule`] if two records share an id.
    pub fn from_records(records: Vec<T>) -> Result<Self, GymError> {
        let index = build_index(&records)?;
        Ok(Self { records, index })
    }

    #[must_use]
    pub fn records(&self) -> &[T] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&T> {
        self.index.get(id).and_then(|&pos| self.records.get(pos))
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Look up a record, failing with [`GymError::NotFound`].
    ///
    /// # Errors
    ///
    /// Returns an error when no record has this id.
    pub fn require(&self, id: &str) -> Result<&T, GymError> {
        self.get(id)
            .ok_or_else(|| GymError::not_found(T::schema().kind, id))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.records.iter()
    }
}

impl<T: Record + Validate + Clone> Collection<T> {
    /// Apply `action` and return the resulting snapshot. `self` is left
    /// untouched on both success and failure.
    ///
    /// # Errors
    ///
    /// - [`GymError::Validation`] if a created or updated record is invalid
    /// - [`GymError::BusinessRule`] if a created record reuses an id
    /// - [`GymError::NotFound`] if an updated or deleted id does not exist
    pub fn apply(&self, action: Action<T>) -> Result<Self, GymError> {
        match action {
            Action::Create(record) => {
                record.validate().into_result()?;
                if self.contains(record.id()) {
                    return Err(GymError::rule(
                        "duplicate_id",
                        format!("{} '{}' already exists", T::schema().kind, record.id()),
                    ));
                }
                let mut records = self.records.clone();
                let mut index = self.index.clone();
                index.insert(record.id().to_string(), records.len());
                records.push(record);
                Ok(Self { records, index })
            }
            Action::Update(record) => {
                record.validate().into_result()?;
                let pos = self.position(record.id())?;
                let mut records = self.records.clone();
                records[pos] = record;
                Ok(Self {
                    records,
                    index: self.index.clone(),
                })
            }
            Action::Delete(id) => {
                let pos = self.position(&id)?;
                let mut records = self.records.clone();
                records.remove(pos);
                let index = build_index(&records)?;
                Ok(Self { records, index })
            }
        }
    }

    fn position(&self, id: &str) -> Result<usize, GymError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| GymError::not_found(T::schema().kind, id))
    }
}

impl<'a, T> IntoIterator for &'a Collection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl<T: Serialize> Serialize for Collection<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.records.serialize(serializer)
    }
}

impl<'de, T: Record + Deserialize<'de>> Deserialize<'de> for Collection<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let records = Vec::<T>::deserialize(deserializer)?;
        Self::from_records(records).map_err(serde::de::Error::custom)
    }
}

fn build_index<T: Record>(records: &[T]) -> Result<HashMap<String, usize>, GymError> {
    let mut index = HashMap::with_capacity(records.len());
    for (pos, record) in records.iter().enumerate() {
        if index.insert(record.id().to_string(), pos).is_some() {
            return Err(GymError::rule(
                "duplicate_id",
                format!("{} '{}' already exists", T::schema().kind, record.id()),
            ));
        }
    }
    Ok(index)
}
