//! Record types for storing data.

use crate::sync::Related;
use crate::{CollectionName, RecordId, RelationName, Timestamp, Version};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Metadata associated with a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// When the record was first saved (milliseconds since epoch)
    pub created_at: Timestamp,
    /// When the record was last saved (milliseconds since epoch)
    pub updated_at: Timestamp,
}

impl Metadata {
    /// Create new metadata for a freshly inserted record.
    pub fn new(timestamp: Timestamp) -> Self {
        Self {
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Update metadata for a modification.
    pub fn touch(&mut self, timestamp: Timestamp) {
        self.updated_at = timestamp;
    }
}

fn copy_enabled_default() -> bool {
    true
}

/// A data record, either in the store or held by a caller.
///
/// Besides its persisted state, a record carries two pieces of per-instance
/// state that are never serialized: the relations loaded onto it and the
/// flag that decides whether the next save copies related fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Unique identifier for this record
    pub id: RecordId,
    /// Collection this record belongs to
    pub collection: CollectionName,
    /// Version number, 0 until first saved, incremented on each save
    pub version: Version,
    /// The actual data payload (JSON object)
    pub payload: Value,
    /// Record metadata
    pub metadata: Metadata,
    /// Soft delete flag (tombstone)
    pub deleted: bool,
    #[serde(skip)]
    relations: BTreeMap<RelationName, Related>,
    #[serde(skip, default = "copy_enabled_default")]
    copy_enabled: bool,
}

impl Record {
    /// Create a new, unsaved record.
    pub fn new(
        id: impl Into<RecordId>,
        collection: impl Into<CollectionName>,
        payload: Value,
    ) -> Self {
        Self {
            id: id.into(),
            collection: collection.into(),
            version: 0,
            payload,
            metadata: Metadata::default(),
            deleted: false,
            relations: BTreeMap::new(),
            copy_enabled: true,
        }
    }

    /// Check if record is active (not deleted).
    pub fn is_active(&self) -> bool {
        !self.deleted
    }

    /// Check if record has been saved at least once.
    pub fn is_persisted(&self) -> bool {
        self.version > 0
    }

    /// Read a payload field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.payload.as_object().and_then(|obj| obj.get(field))
    }

    /// Write a payload field.
    ///
    /// A payload that is not a JSON object is replaced by an empty object
    /// before the field is written.
    pub fn set(&mut self, field: impl Into<String>, value: Value) -> &mut Self {
        if !self.payload.is_object() {
            self.payload = Value::Object(Map::new());
        }
        if let Value::Object(obj) = &mut self.payload {
            obj.insert(field.into(), value);
        }
        self
    }

    /// Mark record as deleted (tombstone).
    pub fn mark_deleted(&mut self, timestamp: Timestamp) {
        self.deleted = true;
        self.version += 1;
        self.metadata.touch(timestamp);
    }

    /// Whether the next save copies fields from related records.
    pub fn copy_enabled(&self) -> bool {
        self.copy_enabled
    }

    /// Skip related field copying for the next save only.
    ///
    /// The flag is restored once that save completes.
    pub fn disable_copy_for_next_save(&mut self) -> &mut Self {
        self.copy_enabled = false;
        self
    }

    pub(crate) fn enable_copy(&mut self) {
        self.copy_enabled = true;
    }

    /// Check if a relation is currently loaded onto this record.
    pub fn relation_loaded(&self, relation: &str) -> bool {
        self.relations.contains_key(relation)
    }

    /// Get a loaded relation.
    pub fn relation(&self, relation: &str) -> Option<&Related> {
        self.relations.get(relation)
    }

    /// Attach a loaded relation, replacing any previous value.
    pub fn set_relation(&mut self, relation: impl Into<RelationName>, related: Related) {
        self.relations.insert(relation.into(), related);
    }

    /// Drop a loaded relation so the next access has to reload it.
    pub fn unset_relation(&mut self, relation: &str) -> Option<Related> {
        self.relations.remove(relation)
    }

    /// Copy of the persisted state only, without loaded relations and with
    /// the sync flag at its default.
    pub fn detached(&self) -> Self {
        Self {
            id: self.id.clone(),
            collection: self.collection.clone(),
            version: self.version,
            payload: self.payload.clone(),
            metadata: self.metadata.clone(),
            deleted: self.deleted,
            relations: BTreeMap::new(),
            copy_enabled: true,
        }
    }
}
