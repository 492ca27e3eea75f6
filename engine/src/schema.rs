//! Schema definition and validation.
//!
//! Schemas define the fields of each collection, the relations between
//! collections, and the sync policy each collection runs before it is saved.
//! They are validated once, when a store is created.

use crate::config::UnknownRelationPolicy;
use crate::sync::SyncPolicy;
use crate::{error::Result, CollectionName, Error, RelationName, SchemaVersion};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Field types supported in schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Int,
    Float,
    Bool,
    Timestamp,
    /// Arbitrary nested JSON
    Json,
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldType::String => write!(f, "String"),
            FieldType::Int => write!(f, "Int"),
            FieldType::Float => write!(f, "Float"),
            FieldType::Bool => write!(f, "Bool"),
            FieldType::Timestamp => write!(f, "Timestamp"),
            FieldType::Json => write!(f, "Json"),
        }
    }
}

/// Definition of a field in a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDef {
    /// Field name
    pub name: String,
    /// Field type
    pub field_type: FieldType,
    /// Whether this field is required
    pub required: bool,
}

impl FieldDef {
    /// Create a new required field definition.
    pub fn required(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: true,
        }
    }

    /// Create a new optional field definition.
    pub fn optional(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: false,
        }
    }

    /// Validate a JSON value against this field definition.
    pub fn validate(&self, value: Option<&serde_json::Value>) -> Result<()> {
        match value {
            None if self.required => Err(Error::MissingRequiredField(self.name.clone())),
            None => Ok(()),
            Some(serde_json::Value::Null) if self.required => {
                Err(Error::MissingRequiredField(self.name.clone()))
            }
            Some(serde_json::Value::Null) => Ok(()),
            Some(v) => self.validate_type(v),
        }
    }

    fn validate_type(&self, value: &serde_json::Value) -> Result<()> {
        let valid = match self.field_type {
            FieldType::String => value.is_string(),
            FieldType::Int => value.is_i64() || value.is_u64(),
            FieldType::Float => value.is_f64() || value.is_i64() || value.is_u64(),
            FieldType::Bool => value.is_boolean(),
            FieldType::Timestamp => value.is_u64() || value.is_i64(),
            FieldType::Json => true, // Any JSON is valid
        };

        if valid {
            Ok(())
        } else {
            Err(Error::TypeMismatch {
                field: self.name.clone(),
                expected: self.field_type.to_string(),
                got: json_type_name(value).to_string(),
            })
        }
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "Null",
        serde_json::Value::Bool(_) => "Bool",
        serde_json::Value::Number(n) if n.is_i64() || n.is_u64() => "Int",
        serde_json::Value::Number(_) => "Float",
        serde_json::Value::String(_) => "String",
        serde_json::Value::Array(_) => "Array",
        serde_json::Value::Object(_) => "Object",
    }
}

/// How a relation finds its related records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RelationKind {
    /// The owning record stores the related record's id in `foreign_key`.
    #[serde(rename_all = "camelCase")]
    BelongsTo {
        target: CollectionName,
        foreign_key: String,
    },
    /// One record in `target` stores the owning record's id in `foreign_key`.
    #[serde(rename_all = "camelCase")]
    HasOne {
        target: CollectionName,
        foreign_key: String,
    },
    /// Any number of records in `target` store the owning record's id in
    /// `foreign_key`.
    #[serde(rename_all = "camelCase")]
    HasMany {
        target: CollectionName,
        foreign_key: String,
    },
}

/// A named relation declared on a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationDef {
    /// Relation name, referenced by sync rules
    pub name: RelationName,
    /// How related records are found
    #[serde(flatten)]
    pub kind: RelationKind,
}

impl RelationDef {
    pub fn belongs_to(
        name: impl Into<RelationName>,
        target: impl Into<CollectionName>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: RelationKind::BelongsTo {
                target: target.into(),
                foreign_key: foreign_key.into(),
            },
        }
    }

    pub fn has_one(
        name: impl Into<RelationName>,
        target: impl Into<CollectionName>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: RelationKind::HasOne {
                target: target.into(),
                foreign_key: foreign_key.into(),
            },
        }
    }

    pub fn has_many(
        name: impl Into<RelationName>,
        target: impl Into<CollectionName>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: RelationKind::HasMany {
                target: target.into(),
                foreign_key: foreign_key.into(),
            },
        }
    }

    /// Collection the related records live in.
    pub fn target(&self) -> &str {
        match &self.kind {
            RelationKind::BelongsTo { target, .. }
            | RelationKind::HasOne { target, .. }
            | RelationKind::HasMany { target, .. } => target,
        }
    }
}

/// Schema for a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSchema {
    /// Collection name
    pub name: CollectionName,
    /// Field definitions
    pub fields: Vec<FieldDef>,
    /// Relations to other collections
    #[serde(default)]
    pub relations: Vec<RelationDef>,
    /// Fields copied from related records before each save
    #[serde(default)]
    pub sync: SyncPolicy,
}

impl CollectionSchema {
    /// Create a new collection schema.
    pub fn new(name: impl Into<CollectionName>, fields: Vec<FieldDef>) -> Self {
        Self {
            name: name.into(),
            fields,
            relations: Vec::new(),
            sync: SyncPolicy::default(),
        }
    }

    /// Builder-style method to declare a relation.
    ///
    /// Declaring the same relation name twice replaces the earlier one.
    pub fn with_relation(mut self, relation: RelationDef) -> Self {
        self.relations.retain(|r| r.name != relation.name);
        self.relations.push(relation);
        self
    }

    /// Builder-style method to set the sync policy.
    pub fn with_sync(mut self, sync: SyncPolicy) -> Self {
        self.sync = sync;
        self
    }

    /// Get a relation by name.
    pub fn relation(&self, name: &str) -> Option<&RelationDef> {
        self.relations.iter().find(|r| r.name == name)
    }

    /// Validate a payload against this schema.
    pub fn validate_payload(&self, payload: &serde_json::Value) -> Result<()> {
        let obj = payload
            .as_object()
            .ok_or_else(|| Error::InvalidPayload("payload must be an object".into()))?;

        for field in &self.fields {
            field.validate(obj.get(&field.name))?;
        }

        Ok(())
    }

    fn validate_sync(&self, unknown_relations: UnknownRelationPolicy) -> Result<()> {
        for rule in self.sync.rules() {
            if rule.local_field.is_empty()
                || rule.related_field.is_empty()
                || rule.relation.is_empty()
            {
                return Err(Error::InvalidRule(format!(
                    "empty name in rule for '{}.{}'",
                    self.name, rule.local_field
                )));
            }

            if self.relation(&rule.relation).is_none()
                && unknown_relations == UnknownRelationPolicy::Reject
            {
                return Err(Error::UnknownRelation {
                    collection: self.name.clone(),
                    relation: rule.relation.clone(),
                    field: rule.local_field.clone(),
                });
            }
        }

        Ok(())
    }
}

/// Schema for the entire store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// Schema version for migrations
    pub version: SchemaVersion,
    /// Collection schemas by name
    pub collections: HashMap<CollectionName, CollectionSchema>,
}

impl Schema {
    /// Create a new schema.
    pub fn new(version: SchemaVersion) -> Self {
        Self {
            version,
            collections: HashMap::new(),
        }
    }

    /// Add a collection to the schema.
    pub fn add_collection(&mut self, collection: CollectionSchema) -> &mut Self {
        self.collections.insert(collection.name.clone(), collection);
        self
    }

    /// Builder-style method to add a collection.
    pub fn with_collection(mut self, collection: CollectionSchema) -> Self {
        self.add_collection(collection);
        self
    }

    /// Get a collection schema by name.
    pub fn get_collection(&self, name: &str) -> Option<&CollectionSchema> {
        self.collections.get(name)
    }

    /// Check relations and sync rules across all collections.
    ///
    /// Every relation must point at a declared collection. Sync rules must
    /// name a declared relation unless `unknown_relations` is
    /// [`UnknownRelationPolicy::Skip`], in which case those rules are left
    /// for the evaluator to skip.
    pub fn validate(&self, unknown_relations: UnknownRelationPolicy) -> Result<()> {
        for collection in self.collections.values() {
            for relation in &collection.relations {
                if !self.collections.contains_key(relation.target()) {
                    return Err(Error::CollectionNotFound(relation.target().to_string()));
                }
            }

            collection.validate_sync(unknown_relations)?;
        }

        Ok(())
    }
}
