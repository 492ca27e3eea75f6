//! Store - the in-memory state container.
//!
//! The Store holds all records, runs the save lifecycle around every write
//! and resolves relations between collections from its current state.

use crate::lifecycle::{HookContext, Lifecycle, LifecycleHook, SaveKind};
use crate::sync::{Related, RelationResolver};
use crate::{
    error::Result, CollectionName, EngineConfig, Error, Record, RecordId, RelationKind, Schema,
    Timestamp, Version,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// A collection of records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    records: BTreeMap<RecordId, Record>,
}

impl Collection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self {
            records: BTreeMap::new(),
        }
    }

    /// Get a record by ID.
    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.get(id)
    }

    /// Insert a record.
    pub fn insert(&mut self, record: Record) {
        self.records.insert(record.id.clone(), record);
    }

    /// Check if a record exists (including deleted).
    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    /// Get all active (non-deleted) records, ordered by ID.
    pub fn active_records(&self) -> impl Iterator<Item = &Record> {
        self.records.values().filter(|r| r.is_active())
    }

    /// Count of active records.
    pub fn len(&self) -> usize {
        self.active_records().count()
    }

    /// Check if collection has no active records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Active records whose `foreign_key` field points at `owner_id`,
    /// oldest first, ties broken by ID.
    fn referencing(&self, foreign_key: &str, owner_id: &str) -> Vec<Record> {
        let mut matches: Vec<Record> = self
            .active_records()
            .filter(|r| key_of(r.get(foreign_key)).as_deref() == Some(owner_id))
            .map(Record::detached)
            .collect();
        matches.sort_by(|a, b| {
            a.metadata
                .created_at
                .cmp(&b.metadata.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        matches
    }
}

/// A record id held in a foreign key field. Strings are used as-is and
/// integers by their decimal form; anything else references nothing.
fn key_of(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        _ => None,
    }
}

/// Result of saving a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResult {
    /// The record ID affected
    pub record_id: RecordId,
    /// Whether the record was inserted or updated
    pub kind: SaveKind,
    /// The new version of the record
    pub version: Version,
}

/// The main store holding all state.
#[derive(Debug, Clone)]
pub struct Store {
    /// Schema for validation and relations
    schema: Schema,
    /// Engine configuration
    config: EngineConfig,
    /// Collections by name
    collections: HashMap<CollectionName, Collection>,
    /// Hooks run around each save
    lifecycle: Lifecycle,
}

impl Store {
    /// Create a new store with the given schema and default configuration.
    pub fn new(schema: Schema) -> Result<Self> {
        Self::with_config(schema, EngineConfig::default())
    }

    /// Create a new store, validating the schema's relations and sync rules.
    pub fn with_config(schema: Schema, config: EngineConfig) -> Result<Self> {
        schema.validate(config.unknown_relations)?;

        // Initialize empty collections for all schema-defined collections
        let collections = schema
            .collections
            .keys()
            .map(|name| (name.clone(), Collection::new()))
            .collect();

        Ok(Self {
            schema,
            config,
            collections,
            lifecycle: Lifecycle::default(),
        })
    }

    /// Get the schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Get the configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Get the save lifecycle.
    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Add a hook that runs after the built-in ones on every save.
    pub fn register_hook(&mut self, hook: Arc<dyn LifecycleHook>) -> &mut Self {
        self.lifecycle.register(hook);
        self
    }

    /// Save a record, inserting it or updating the stored copy.
    ///
    /// Before-persist hooks run once (copying related fields among them),
    /// then the payload is validated and written. On success the caller's
    /// record takes the new version and timestamps, and after-persist hooks
    /// run. On failure nothing is written, but changes made by hooks to the
    /// caller's record are kept.
    pub fn save(&mut self, record: &mut Record, timestamp: Timestamp) -> Result<SaveResult> {
        if record.id.is_empty() {
            return Err(Error::InvalidPayload("record id must not be empty".into()));
        }

        let collection_schema = self
            .schema
            .get_collection(&record.collection)
            .ok_or_else(|| Error::CollectionNotFound(record.collection.clone()))?;

        let collection = self
            .collections
            .get(&record.collection)
            .ok_or_else(|| Error::CollectionNotFound(record.collection.clone()))?;

        let kind = match collection.get(&record.id) {
            None => SaveKind::Insert,
            Some(stored) if stored.deleted => {
                return Err(Error::OperationOnDeleted(record.id.clone()));
            }
            Some(_) => SaveKind::Update,
        };

        let ctx = HookContext {
            kind,
            schema: collection_schema,
            resolver: &*self,
        };
        self.lifecycle.before_persist(record, &ctx)?;

        if self.config.validate_payloads {
            collection_schema.validate_payload(&record.payload)?;
        }

        match kind {
            SaveKind::Insert => self.write_insert(record, timestamp)?,
            SaveKind::Update => self.write_update(record, timestamp)?,
        }

        tracing::debug!(
            collection = %record.collection,
            id = %record.id,
            %kind,
            version = record.version,
            "record saved"
        );

        self.lifecycle.after_persist(record, kind);

        Ok(SaveResult {
            record_id: record.id.clone(),
            kind,
            version: record.version,
        })
    }

    fn write_insert(&mut self, record: &mut Record, timestamp: Timestamp) -> Result<()> {
        let collection = self
            .collections
            .get_mut(&record.collection)
            .ok_or_else(|| Error::CollectionNotFound(record.collection.clone()))?;

        if collection.contains(&record.id) {
            return Err(Error::RecordAlreadyExists(record.id.clone()));
        }

        record.version = 1;
        record.deleted = false;
        record.metadata = crate::record::Metadata::new(timestamp);
        collection.insert(record.detached());

        Ok(())
    }

    fn write_update(&mut self, record: &mut Record, timestamp: Timestamp) -> Result<()> {
        let collection = self
            .collections
            .get_mut(&record.collection)
            .ok_or_else(|| Error::CollectionNotFound(record.collection.clone()))?;

        let stored = collection
            .get(&record.id)
            .ok_or_else(|| Error::RecordNotFound(record.id.clone()))?;

        // Check version
        if stored.version != record.version {
            return Err(Error::VersionMismatch {
                expected: record.version,
                actual: stored.version,
            });
        }

        record.version = stored.version + 1;
        record.metadata.created_at = stored.metadata.created_at;
        record.metadata.touch(timestamp);
        collection.insert(record.detached());

        Ok(())
    }

    /// Soft-delete a record.
    pub fn delete(
        &mut self,
        collection: &str,
        id: &str,
        base_version: Version,
        timestamp: Timestamp,
    ) -> Result<Version> {
        let collection = self
            .collections
            .get_mut(collection)
            .ok_or_else(|| Error::CollectionNotFound(collection.to_string()))?;

        let mut record = collection
            .get(id)
            .cloned()
            .ok_or_else(|| Error::RecordNotFound(id.to_string()))?;

        // Check if already deleted
        if record.deleted {
            return Err(Error::OperationOnDeleted(id.to_string()));
        }

        // Check version
        if record.version != base_version {
            return Err(Error::VersionMismatch {
                expected: base_version,
                actual: record.version,
            });
        }

        record.mark_deleted(timestamp);
        let version = record.version;
        collection.insert(record);

        Ok(version)
    }

    /// Get a record by collection and ID.
    pub fn get(&self, collection: &str, id: &str) -> Option<&Record> {
        self.collections
            .get(collection)
            .and_then(|c| c.get(id))
            .filter(|r| r.is_active())
    }

    /// An owned copy of the stored record, as a new instance would load it.
    pub fn fresh(&self, collection: &str, id: &str) -> Option<Record> {
        self.get(collection, id).map(Record::detached)
    }

    /// Get a collection by name.
    pub fn collection(&self, name: &str) -> Option<&Collection> {
        self.collections.get(name)
    }
}

impl RelationResolver for Store {
    fn has_relation(&self, entity: &Record, relation: &str) -> bool {
        self.schema
            .get_collection(&entity.collection)
            .and_then(|c| c.relation(relation))
            .is_some()
    }

    fn load(&self, entity: &Record, relation: &str) -> Result<Related> {
        let def = self
            .schema
            .get_collection(&entity.collection)
            .and_then(|c| c.relation(relation))
            .ok_or_else(|| Error::RelationNotFound {
                collection: entity.collection.clone(),
                relation: relation.to_string(),
            })?;

        let target = self
            .collections
            .get(def.target())
            .ok_or_else(|| Error::CollectionNotFound(def.target().to_string()))?;

        let related = match &def.kind {
            RelationKind::BelongsTo { foreign_key, .. } => key_of(entity.get(foreign_key))
                .and_then(|id| target.get(&id))
                .filter(|r| r.is_active())
                .map(|r| Related::One(Box::new(r.detached())))
                .unwrap_or_default(),
            RelationKind::HasOne { foreign_key, .. } => target
                .referencing(foreign_key, &entity.id)
                .into_iter()
                .next()
                .map(|r| Related::One(Box::new(r)))
                .unwrap_or_default(),
            RelationKind::HasMany { foreign_key, .. } => {
                Related::Many(target.referencing(foreign_key, &entity.id))
            }
        };

        tracing::trace!(
            collection = %entity.collection,
            id = %entity.id,
            relation,
            found = !related.is_none(),
            "relation loaded"
        );

        Ok(related)
    }
}
