//! # attrsync engine
//!
//! Copies selected field values from a related record into a record right
//! before it is saved.
//!
//! A collection declares a [`SyncPolicy`]: a list of rules mapping a local
//! field to a field on a related record, reached through a named relation.
//! Every save runs the policy once, after reloading each relation from the
//! store, so the copied values always reflect the related record's current
//! persisted state.
//!
//! ## Core Concepts
//!
//! ### Rules
//!
//! A [`SyncRule`] copies `related_field` from the record behind `relation`
//! into `local_field`. With `override_existing` (the default) the local value
//! is always replaced. Without it, the value is only filled in when the local
//! field is blank (see [`is_blank`]).
//!
//! ### Evaluator
//!
//! [`synchronize`] evaluates a policy against one record and a
//! [`RelationResolver`]. It can be called directly, but normally runs from
//! the [`FieldSyncHook`] that every [`Store`] installs in its [`Lifecycle`].
//!
//! ### Skipping one save
//!
//! [`Record::disable_copy_for_next_save`] opts exactly one save out of
//! copying. The flag is restored once that save completes.
//!
//! ## Quick Start
//!
//! ```rust
//! use attrsync_engine::{
//!     CollectionSchema, FieldDef, FieldType, Record, RelationDef, Schema, Store, SyncPolicy,
//! };
//! use serde_json::json;
//!
//! let schema = Schema::new(1)
//!     .with_collection(CollectionSchema::new(
//!         "sources",
//!         vec![
//!             FieldDef::required("name", FieldType::String),
//!             FieldDef::optional("code", FieldType::String),
//!         ],
//!     ))
//!     .with_collection(
//!         CollectionSchema::new(
//!             "targets",
//!             vec![
//!                 FieldDef::optional("source_id", FieldType::String),
//!                 FieldDef::optional("name", FieldType::String),
//!                 FieldDef::optional("code", FieldType::String),
//!             ],
//!         )
//!         .with_relation(RelationDef::belongs_to("source", "sources", "source_id"))
//!         .with_sync(
//!             SyncPolicy::new()
//!                 .copy("name", "name", "source")
//!                 .fill("code", "code", "source"),
//!         ),
//!     );
//!
//! let mut store = Store::new(schema).unwrap();
//!
//! let mut source = Record::new("src-1", "sources", json!({"name": "Acme", "code": "AC-1"}));
//! store.save(&mut source, 1000).unwrap();
//!
//! let mut target = Record::new("tgt-1", "targets", json!({"source_id": "src-1", "code": "KEEP"}));
//! store.save(&mut target, 2000).unwrap();
//!
//! assert_eq!(target.payload["name"], "Acme");
//! assert_eq!(target.payload["code"], "KEEP");
//! ```

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod record;
pub mod schema;
pub mod store;
pub mod sync;
pub mod value;

// Re-export main types at crate root
pub use config::{ConfigError, EngineConfig, UnknownRelationPolicy};
pub use error::Error;
pub use lifecycle::{FieldSyncHook, HookContext, Lifecycle, LifecycleHook, SaveKind};
pub use record::{Metadata, Record};
pub use schema::{CollectionSchema, FieldDef, FieldType, RelationDef, RelationKind, Schema};
pub use store::{Collection, SaveResult, Store};
pub use sync::{synchronize, Related, RelationResolver, RuleSet, SyncPolicy, SyncReport, SyncRule};
pub use value::is_blank;

/// Type aliases for clarity
pub type RecordId = String;
pub type CollectionName = String;
pub type FieldName = String;
pub type RelationName = String;
pub type Version = u64;
pub type Timestamp = u64;
pub type SchemaVersion = u32;
