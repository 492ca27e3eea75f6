//! Save lifecycle hooks.
//!
//! A [`Store`](crate::Store) runs its [`Lifecycle`] around every write:
//! before-persist hooks once per save, whether it inserts or updates, and
//! after-persist hooks only once the write has been committed.

use crate::schema::CollectionSchema;
use crate::sync::{synchronize, RelationResolver};
use crate::{error::Result, Record};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Whether a save creates or replaces the stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveKind {
    Insert,
    Update,
}

impl fmt::Display for SaveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveKind::Insert => write!(f, "insert"),
            SaveKind::Update => write!(f, "update"),
        }
    }
}

/// What a before-persist hook can see besides the record itself.
pub struct HookContext<'a> {
    /// Whether the pending write is an insert or an update
    pub kind: SaveKind,
    /// Schema of the record's collection
    pub schema: &'a CollectionSchema,
    /// Loads relations from the store's current state
    pub resolver: &'a dyn RelationResolver,
}

/// A callback run around a save.
pub trait LifecycleHook: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Runs before the record is validated and written. An error aborts the
    /// save; nothing is written and later hooks do not run.
    fn before_persist(&self, _record: &mut Record, _ctx: &HookContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Runs after the record has been written.
    fn after_persist(&self, _record: &mut Record, _kind: SaveKind) {}
}

/// Copies related fields according to the collection's sync policy.
///
/// Restores the record's copy flag after every successful save, so
/// [`Record::disable_copy_for_next_save`] affects exactly one save.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldSyncHook;

impl LifecycleHook for FieldSyncHook {
    fn name(&self) -> &str {
        "field-sync"
    }

    fn before_persist(&self, record: &mut Record, ctx: &HookContext<'_>) -> Result<()> {
        let report = synchronize(record, &ctx.schema.sync, ctx.resolver)?;
        if report.copied_any() {
            tracing::debug!(
                collection = %record.collection,
                id = %record.id,
                kind = %ctx.kind,
                fields = ?report.copied,
                "copied related fields"
            );
        }
        Ok(())
    }

    fn after_persist(&self, record: &mut Record, _kind: SaveKind) {
        record.enable_copy();
    }
}

/// Ordered list of hooks run around each save.
#[derive(Clone)]
pub struct Lifecycle {
    hooks: Vec<Arc<dyn LifecycleHook>>,
}

impl Default for Lifecycle {
    /// A lifecycle with only the [`FieldSyncHook`].
    fn default() -> Self {
        Self {
            hooks: vec![Arc::new(FieldSyncHook)],
        }
    }
}

impl fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.hooks.iter().map(|h| h.name()))
            .finish()
    }
}

impl Lifecycle {
    /// A lifecycle with no hooks at all.
    pub fn empty() -> Self {
        Self { hooks: Vec::new() }
    }

    /// Append a hook; it runs after the ones already registered.
    pub fn register(&mut self, hook: Arc<dyn LifecycleHook>) -> &mut Self {
        self.hooks.push(hook);
        self
    }

    /// Names of the registered hooks, in run order.
    pub fn hook_names(&self) -> Vec<&str> {
        self.hooks.iter().map(|h| h.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run every before-persist hook, stopping at the first error.
    pub fn before_persist(&self, record: &mut Record, ctx: &HookContext<'_>) -> Result<()> {
        for hook in &self.hooks {
            hook.before_persist(record, ctx).inspect_err(|err| {
                tracing::debug!(
                    hook = hook.name(),
                    collection = %record.collection,
                    id = %record.id,
                    error = %err,
                    "before-persist hook failed"
                );
            })?;
        }
        Ok(())
    }

    /// Run every after-persist hook.
    pub fn after_persist(&self, record: &mut Record, kind: SaveKind) {
        for hook in &self.hooks {
            hook.after_persist(record, kind);
        }
    }
}
