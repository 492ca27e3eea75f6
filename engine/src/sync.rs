//! Related field synchronization.
//!
//! A [`SyncPolicy`] lists which fields of a record are copied from which
//! related record. [`synchronize`] evaluates the policy against one record:
//! it reloads every referenced relation through a [`RelationResolver`] and
//! copies the related values according to each rule's override flag.
//!
//! # Override semantics
//!
//! - `override_existing = true`: the local field always takes the related value.
//! - `override_existing = false`: the related value is only copied when the
//!   local field is blank (see [`is_blank`]).
//!
//! A relation that resolves to nothing leaves its fields untouched. For a
//! collection-valued relation only the first record is used; the resolver
//! decides the order.

use crate::value::is_blank;
use crate::{error::Result, FieldName, Record, RelationName};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Copy one field from a related record into a local field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRule {
    /// Field written on the owning record
    pub local_field: FieldName,
    /// Field read from the related record
    pub related_field: FieldName,
    /// Relation the related record is reached through
    pub relation: RelationName,
    /// Replace a local value that is already set
    pub override_existing: bool,
}

impl SyncRule {
    /// Create a rule that always overwrites the local field.
    pub fn new(
        local_field: impl Into<FieldName>,
        related_field: impl Into<FieldName>,
        relation: impl Into<RelationName>,
    ) -> Self {
        Self {
            local_field: local_field.into(),
            related_field: related_field.into(),
            relation: relation.into(),
            override_existing: true,
        }
    }

    /// Set whether an existing local value is overwritten.
    pub fn with_override(mut self, override_existing: bool) -> Self {
        self.override_existing = override_existing;
        self
    }

    fn applies_to(&self, current: Option<&Value>) -> bool {
        self.override_existing || is_blank(current)
    }
}

/// The ordered set of sync rules declared for a collection.
///
/// There is at most one rule per local field. Declaring a second rule for
/// the same local field replaces the first, and the replacement takes the
/// later position in declaration order.
///
/// Serialized as a map from local field to `[related_field, relation]` or
/// `[related_field, relation, override_existing]`:
///
/// ```json
/// {
///     "name": ["name", "source"],
///     "code": ["code", "source", false]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPolicy {
    rules: Vec<SyncRule>,
}

impl SyncPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always copy `related_field` into `local_field`.
    pub fn copy(
        mut self,
        local_field: impl Into<FieldName>,
        related_field: impl Into<FieldName>,
        relation: impl Into<RelationName>,
    ) -> Self {
        self.push(SyncRule::new(local_field, related_field, relation));
        self
    }

    /// Copy `related_field` into `local_field` only when the local field is
    /// blank.
    pub fn fill(
        mut self,
        local_field: impl Into<FieldName>,
        related_field: impl Into<FieldName>,
        relation: impl Into<RelationName>,
    ) -> Self {
        self.push(SyncRule::new(local_field, related_field, relation).with_override(false));
        self
    }

    /// Add a rule, replacing any earlier rule for the same local field.
    pub fn push(&mut self, rule: SyncRule) {
        if let Some(pos) = self
            .rules
            .iter()
            .position(|r| r.local_field == rule.local_field)
        {
            let replaced = self.rules.remove(pos);
            tracing::warn!(
                local_field = %rule.local_field,
                previous_relation = %replaced.relation,
                relation = %rule.relation,
                "duplicate sync rule, keeping the last declaration"
            );
        }
        self.rules.push(rule);
    }

    /// Rules in declaration order.
    pub fn rules(&self) -> &[SyncRule] {
        &self.rules
    }

    /// Rule writing `local_field`, if any.
    pub fn rule_for(&self, local_field: &str) -> Option<&SyncRule> {
        self.rules.iter().find(|r| r.local_field == local_field)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Group the rules by relation.
    pub fn rule_set(&self) -> RuleSet<'_> {
        RuleSet::new(self)
    }
}

impl FromIterator<SyncRule> for SyncPolicy {
    fn from_iter<I: IntoIterator<Item = SyncRule>>(iter: I) -> Self {
        let mut policy = SyncPolicy::new();
        for rule in iter {
            policy.push(rule);
        }
        policy
    }
}

impl Serialize for SyncPolicy {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.rules.len()))?;
        for rule in &self.rules {
            map.serialize_entry(
                &rule.local_field,
                &(&rule.related_field, &rule.relation, rule.override_existing),
            )?;
        }
        map.end()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RuleDeclaration {
    Full(FieldName, RelationName, bool),
    Short(FieldName, RelationName),
}

struct SyncPolicyVisitor;

impl<'de> Visitor<'de> for SyncPolicyVisitor {
    type Value = SyncPolicy;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of local field to [related_field, relation, override?]")
    }

    fn visit_map<A: MapAccess<'de>>(
        self,
        mut access: A,
    ) -> std::result::Result<SyncPolicy, A::Error> {
        let mut policy = SyncPolicy::new();
        while let Some((local_field, declaration)) =
            access.next_entry::<FieldName, RuleDeclaration>()?
        {
            let rule = match declaration {
                RuleDeclaration::Full(related, relation, override_existing) => {
                    SyncRule::new(local_field, related, relation).with_override(override_existing)
                }
                RuleDeclaration::Short(related, relation) => {
                    SyncRule::new(local_field, related, relation)
                }
            };
            policy.push(rule);
        }
        Ok(policy)
    }
}

impl<'de> Deserialize<'de> for SyncPolicy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(SyncPolicyVisitor)
    }
}

/// Rules of a policy grouped by relation.
///
/// Relations iterate in name order; rules within a relation keep their
/// declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet<'a> {
    groups: BTreeMap<&'a str, Vec<&'a SyncRule>>,
}

impl<'a> RuleSet<'a> {
    pub fn new(policy: &'a SyncPolicy) -> Self {
        let mut groups: BTreeMap<&'a str, Vec<&'a SyncRule>> = BTreeMap::new();
        for rule in policy.rules() {
            groups.entry(rule.relation.as_str()).or_default().push(rule);
        }
        Self { groups }
    }

    /// Relation names referenced by the policy.
    pub fn relations(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.groups.keys().copied()
    }

    /// Rules reading from `relation`.
    pub fn rules(&self, relation: &str) -> &[&'a SyncRule] {
        self.groups.get(relation).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &[&'a SyncRule])> + '_ {
        self.groups.iter().map(|(name, rules)| (*name, rules.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// The loaded value of a relation.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Related {
    /// No related record
    #[default]
    None,
    /// A single related record
    One(Box<Record>),
    /// A collection of related records, in resolver order
    Many(Vec<Record>),
}

impl Related {
    /// The record fields are copied from: the single record, or the first
    /// record of a collection.
    pub fn first(&self) -> Option<&Record> {
        match self {
            Related::None => None,
            Related::One(record) => Some(record.as_ref()),
            Related::Many(records) => records.first(),
        }
    }

    pub fn is_none(&self) -> bool {
        self.first().is_none()
    }
}

/// Loads relations for a record.
///
/// Implementations must read the current persisted state on every call and
/// never answer from a cache. A collection-valued relation must be returned
/// in a stable order, since only its first record is used.
pub trait RelationResolver {
    /// Whether `relation` is declared for the record's collection.
    fn has_relation(&self, entity: &Record, relation: &str) -> bool;

    /// Load `relation` for `entity`.
    fn load(&self, entity: &Record, relation: &str) -> Result<Related>;
}

/// What a sync pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// The pass was skipped because copying was disabled for this save
    pub skipped: bool,
    /// Relations that were reloaded
    pub loaded: Vec<RelationName>,
    /// Relations that resolved to no record
    pub absent: Vec<RelationName>,
    /// Relations the resolver does not know about
    pub unknown: Vec<RelationName>,
    /// Local fields that received a related value
    pub copied: Vec<FieldName>,
    /// Local fields kept because they were already set
    pub kept: Vec<FieldName>,
}

impl SyncReport {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }

    /// Whether any field was written.
    pub fn copied_any(&self) -> bool {
        !self.copied.is_empty()
    }
}

/// Copy related field values into `entity` according to `policy`.
///
/// Does nothing when copying was disabled for this save; the flag is then
/// left for the save's completion hook to restore. Otherwise every relation
/// named by the policy is dropped from the entity's relation cache and
/// reloaded through `resolver`, the rules are applied, and copying is
/// re-enabled.
///
/// Resolver errors are returned as-is. Fields written for earlier relations
/// stay written in that case.
pub fn synchronize<R>(entity: &mut Record, policy: &SyncPolicy, resolver: &R) -> Result<SyncReport>
where
    R: RelationResolver + ?Sized,
{
    if !entity.copy_enabled() {
        tracing::debug!(
            collection = %entity.collection,
            id = %entity.id,
            "related field copy disabled for this save"
        );
        return Ok(SyncReport::skipped());
    }

    if policy.is_empty() {
        return Ok(SyncReport::default());
    }

    let mut report = SyncReport::default();

    for (relation, rules) in policy.rule_set().iter() {
        if !resolver.has_relation(entity, relation) {
            tracing::warn!(
                collection = %entity.collection,
                relation,
                "sync rules refer to an undeclared relation, skipping"
            );
            report.unknown.push(relation.to_string());
            continue;
        }

        entity.unset_relation(relation);
        let related = resolver.load(entity, relation)?;
        report.loaded.push(relation.to_string());

        // Read the related values before the relation moves into the cache.
        let values: Option<Vec<Value>> = related.first().map(|source| {
            rules
                .iter()
                .map(|rule| source.get(&rule.related_field).cloned().unwrap_or(Value::Null))
                .collect()
        });
        entity.set_relation(relation, related);

        let Some(values) = values else {
            tracing::trace!(
                collection = %entity.collection,
                id = %entity.id,
                relation,
                "no related record"
            );
            report.absent.push(relation.to_string());
            continue;
        };

        for (rule, value) in rules.iter().zip(values) {
            if rule.applies_to(entity.get(&rule.local_field)) {
                tracing::trace!(
                    local_field = %rule.local_field,
                    related_field = %rule.related_field,
                    relation,
                    "copying related field"
                );
                entity.set(rule.local_field.clone(), value);
                report.copied.push(rule.local_field.clone());
            } else {
                report.kept.push(rule.local_field.clone());
            }
        }
    }

    entity.enable_copy();

    tracing::debug!(
        collection = %entity.collection,
        id = %entity.id,
        copied = report.copied.len(),
        kept = report.kept.len(),
        "related fields synchronized"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use serde_json::json;
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;

    /// Resolver backed by a fixed map, counting loads.
    #[derive(Default)]
    struct MapResolver {
        relations: RefCell<HashMap<String, Related>>,
        loads: Cell<usize>,
        fail_on: Option<String>,
    }

    impl MapResolver {
        fn with(relation: &str, related: Related) -> Self {
            let resolver = Self::default();
            resolver.set(relation, related);
            resolver
        }

        fn set(&self, relation: &str, related: Related) {
            self.relations
                .borrow_mut()
                .insert(relation.to_string(), related);
        }
    }

    impl RelationResolver for MapResolver {
        fn has_relation(&self, _entity: &Record, relation: &str) -> bool {
            self.relations.borrow().contains_key(relation)
        }

        fn load(&self, entity: &Record, relation: &str) -> Result<Related> {
            self.loads.set(self.loads.get() + 1);
            if self.fail_on.as_deref() == Some(relation) {
                return Err(Error::RecordNotFound(entity.id.clone()));
            }
            Ok(self
                .relations
                .borrow()
                .get(relation)
                .cloned()
                .unwrap_or_default())
        }
    }

    fn source(name: &str, code: Option<&str>) -> Related {
        Related::One(Box::new(Record::new(
            "source-1",
            "sources",
            json!({"name": name, "code": code}),
        )))
    }

    fn policy() -> SyncPolicy {
        SyncPolicy::new()
            .copy("name", "name", "source")
            .fill("code", "code", "source")
    }

    fn target(payload: Value) -> Record {
        Record::new("target-1", "targets", payload)
    }

    #[test]
    fn override_true_replaces_existing_value() {
        let resolver = MapResolver::with("source", source("Test Source", Some("TEST001")));
        let mut entity = target(json!({"name": "Old Name"}));

        let report = synchronize(&mut entity, &policy(), &resolver).unwrap();

        assert_eq!(entity.payload["name"], "Test Source");
        assert!(report.copied.contains(&"name".to_string()));
    }

    #[test]
    fn override_false_fills_blank_value() {
        let resolver = MapResolver::with("source", source("Test Source", Some("TEST001")));

        let mut missing = target(json!({}));
        synchronize(&mut missing, &policy(), &resolver).unwrap();
        assert_eq!(missing.payload["code"], "TEST001");

        let mut null = target(json!({"code": null}));
        synchronize(&mut null, &policy(), &resolver).unwrap();
        assert_eq!(null.payload["code"], "TEST001");

        let mut empty = target(json!({"code": ""}));
        synchronize(&mut empty, &policy(), &resolver).unwrap();
        assert_eq!(empty.payload["code"], "TEST001");
    }

    #[test]
    fn override_false_keeps_existing_value() {
        let resolver = MapResolver::with("source", source("Test Source", Some("TEST001")));
        let mut entity = target(json!({"code": "EXISTING"}));

        let report = synchronize(&mut entity, &policy(), &resolver).unwrap();

        assert_eq!(entity.payload["code"], "EXISTING");
        assert_eq!(entity.payload["name"], "Test Source");
        assert_eq!(report.kept, vec!["code".to_string()]);
    }

    #[test]
    fn override_false_treats_zero_as_blank() {
        let related = Related::One(Box::new(Record::new(
            "source-1",
            "sources",
            json!({"qty": 12}),
        )));
        let resolver = MapResolver::with("source", related);
        let policy = SyncPolicy::new().fill("qty", "qty", "source");

        let mut entity = target(json!({"qty": 0}));
        synchronize(&mut entity, &policy, &resolver).unwrap();
        assert_eq!(entity.payload["qty"], 12);
    }

    #[test]
    fn empty_policy_is_noop() {
        let resolver = MapResolver::with("source", source("Test Source", None));
        let mut entity = target(json!({"name": "Keep"}));

        let report = synchronize(&mut entity, &SyncPolicy::new(), &resolver).unwrap();
        assert_eq!(report, SyncReport::default());
        assert_eq!(entity.payload, json!({"name": "Keep"}));
        assert_eq!(resolver.loads.get(), 0);

        entity.disable_copy_for_next_save();
        synchronize(&mut entity, &SyncPolicy::new(), &resolver).unwrap();
        assert_eq!(entity.payload, json!({"name": "Keep"}));
        assert_eq!(resolver.loads.get(), 0);
    }

    #[test]
    fn disabled_pass_changes_nothing_and_keeps_flag() {
        let resolver = MapResolver::with("source", source("Test Source", Some("TEST001")));
        let mut entity = target(json!({"name": "Original Name"}));
        entity.disable_copy_for_next_save();

        let report = synchronize(&mut entity, &policy(), &resolver).unwrap();

        assert!(report.skipped);
        assert_eq!(entity.payload, json!({"name": "Original Name"}));
        assert!(!entity.copy_enabled());
        assert_eq!(resolver.loads.get(), 0);
    }

    #[test]
    fn absent_relation_skips_its_rules() {
        let resolver = MapResolver::with("source", Related::None);
        let mut entity = target(json!({"name": "Keep"}));

        let report = synchronize(&mut entity, &policy(), &resolver).unwrap();

        assert_eq!(entity.payload, json!({"name": "Keep"}));
        assert_eq!(report.absent, vec!["source".to_string()]);
        assert!(!report.copied_any());
        assert!(entity.copy_enabled());
    }

    #[test]
    fn collection_relation_uses_first_record() {
        let lines = Related::Many(vec![
            Record::new("line-1", "lines", json!({"sku": "FIRST"})),
            Record::new("line-2", "lines", json!({"sku": "SECOND"})),
        ]);
        let resolver = MapResolver::with("lines", lines);
        let policy = SyncPolicy::new().copy("sku", "sku", "lines");

        let mut entity = target(json!({}));
        synchronize(&mut entity, &policy, &resolver).unwrap();

        assert_eq!(entity.payload["sku"], "FIRST");
    }

    #[test]
    fn empty_collection_is_absent() {
        let resolver = MapResolver::with("lines", Related::Many(vec![]));
        let policy = SyncPolicy::new().copy("sku", "sku", "lines");

        let mut entity = target(json!({"sku": "KEEP"}));
        let report = synchronize(&mut entity, &policy, &resolver).unwrap();

        assert_eq!(entity.payload["sku"], "KEEP");
        assert_eq!(report.absent, vec!["lines".to_string()]);
    }

    #[test]
    fn missing_related_field_copies_null() {
        let resolver = MapResolver::with("source", source("Test Source", None));
        let policy = SyncPolicy::new().copy("label", "label", "source");

        let mut entity = target(json!({"label": "Old"}));
        synchronize(&mut entity, &policy, &resolver).unwrap();

        assert_eq!(entity.payload["label"], Value::Null);
    }

    #[test]
    fn unknown_relation_is_skipped() {
        let resolver = MapResolver::with("source", source("Test Source", None));
        let policy = SyncPolicy::new()
            .copy("name", "name", "source")
            .copy("owner", "name", "sorce");

        let mut entity = target(json!({}));
        let report = synchronize(&mut entity, &policy, &resolver).unwrap();

        assert_eq!(report.unknown, vec!["sorce".to_string()]);
        assert_eq!(entity.payload["name"], "Test Source");
        assert!(entity.get("owner").is_none());
        assert_eq!(resolver.loads.get(), 1);
    }

    #[test]
    fn cached_relation_is_reloaded() {
        let resolver = MapResolver::with("source", source("Fresh", None));
        let mut entity = target(json!({}));
        entity.set_relation("source", source("Stale", None));

        synchronize(&mut entity, &policy(), &resolver).unwrap();

        assert_eq!(entity.payload["name"], "Fresh");
        assert_eq!(resolver.loads.get(), 1);
        let cached = entity.relation("source").and_then(Related::first).unwrap();
        assert_eq!(cached.payload["name"], "Fresh");
    }

    #[test]
    fn each_relation_loaded_once_per_pass() {
        let resolver = MapResolver::with("source", source("Test Source", Some("TEST001")));
        resolver.set("owner", source("Owner", None));
        let policy = policy().copy("owner_name", "name", "owner");

        let mut entity = target(json!({}));
        let report = synchronize(&mut entity, &policy, &resolver).unwrap();

        assert_eq!(resolver.loads.get(), 2);
        assert_eq!(report.loaded, vec!["owner".to_string(), "source".to_string()]);
        assert_eq!(entity.payload["owner_name"], "Owner");
    }

    #[test]
    fn resolver_error_propagates() {
        let resolver = MapResolver {
            fail_on: Some("source".into()),
            ..MapResolver::with("source", source("Test Source", None))
        };
        let mut entity = target(json!({"name": "Keep"}));

        let result = synchronize(&mut entity, &policy(), &resolver);

        assert!(matches!(result, Err(Error::RecordNotFound(_))));
        assert_eq!(entity.payload["name"], "Keep");
    }

    #[test]
    fn repeated_pass_is_stable() {
        let resolver = MapResolver::with("source", source("Test Source", Some("TEST001")));
        let mut entity = target(json!({"code": "EXISTING"}));

        synchronize(&mut entity, &policy(), &resolver).unwrap();
        let first = entity.payload.clone();
        synchronize(&mut entity, &policy(), &resolver).unwrap();

        assert_eq!(entity.payload, first);
    }

    #[test]
    fn duplicate_rule_keeps_last_declaration() {
        let policy = SyncPolicy::new()
            .copy("name", "name", "source")
            .copy("code", "code", "source")
            .fill("name", "title", "owner");

        assert_eq!(policy.len(), 2);
        let rule = policy.rule_for("name").unwrap();
        assert_eq!(rule.related_field, "title");
        assert_eq!(rule.relation, "owner");
        assert!(!rule.override_existing);
        assert_eq!(policy.rules()[1].local_field, "name");
    }

    #[test]
    fn rule_set_groups_by_relation() {
        let policy = SyncPolicy::new()
            .copy("name", "name", "source")
            .copy("owner_name", "name", "owner")
            .fill("code", "code", "source");

        let rule_set = policy.rule_set();
        assert_eq!(rule_set.len(), 2);
        assert_eq!(rule_set.relations().collect::<Vec<_>>(), vec!["owner", "source"]);

        let source_fields: Vec<_> = rule_set
            .rules("source")
            .iter()
            .map(|r| r.local_field.as_str())
            .collect();
        assert_eq!(source_fields, vec!["name", "code"]);
        assert!(rule_set.rules("missing").is_empty());
    }

    #[test]
    fn policy_from_compact_declaration() {
        let policy: SyncPolicy = serde_json::from_str(
            r#"{
                "name": ["name", "source"],
                "code": ["code", "source", false]
            }"#,
        )
        .unwrap();

        assert_eq!(policy, self::policy());
    }

    #[test]
    fn compact_declaration_duplicate_key_keeps_last() {
        let policy: SyncPolicy = serde_json::from_str(
            r#"{
                "name": ["name", "source"],
                "name": ["title", "owner", false]
            }"#,
        )
        .unwrap();

        assert_eq!(policy.len(), 1);
        assert_eq!(policy.rules()[0].related_field, "title");
    }

    #[test]
    fn compact_declaration_rejects_bad_arity() {
        let result: std::result::Result<SyncPolicy, _> =
            serde_json::from_str(r#"{"name": ["name"]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn policy_serializes_full_form() {
        let json = serde_json::to_value(policy()).unwrap();
        assert_eq!(
            json,
            json!({
                "name": ["name", "source", true],
                "code": ["code", "source", false],
            })
        );
    }

    #[test]
    fn policy_from_iterator() {
        let policy: SyncPolicy = vec![
            SyncRule::new("name", "name", "source"),
            SyncRule::new("code", "code", "source").with_override(false),
        ]
        .into_iter()
        .collect();

        assert_eq!(policy, self::policy());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn arb_value() -> impl Strategy<Value = Value> {
            prop_oneof![
                Just(Value::Null),
                Just(json!("")),
                Just(json!(0)),
                "[a-z]{1,8}".prop_map(Value::from),
                (1i64..1000).prop_map(Value::from),
            ]
        }

        proptest! {
            #[test]
            fn prop_synchronize_idempotent(
                local in arb_value(),
                related in arb_value(),
                override_existing in any::<bool>(),
            ) {
                let source = Record::new("source-1", "sources", json!({"field": related}));
                let resolver = MapResolver::with("source", Related::One(Box::new(source)));
                let rule =
                    SyncRule::new("field", "field", "source").with_override(override_existing);
                let policy: SyncPolicy = std::iter::once(rule).collect();

                let mut entity = Record::new("target-1", "targets", json!({"field": local}));
                synchronize(&mut entity, &policy, &resolver).unwrap();
                let once = entity.payload.clone();
                synchronize(&mut entity, &policy, &resolver).unwrap();

                prop_assert_eq!(&entity.payload, &once);
            }

            #[test]
            fn prop_override_semantics(
                local in arb_value(),
                related in arb_value(),
                override_existing in any::<bool>(),
            ) {
                let source = Record::new("source-1", "sources", json!({"field": related.clone()}));
                let resolver = MapResolver::with("source", Related::One(Box::new(source)));
                let rule =
                    SyncRule::new("field", "field", "source").with_override(override_existing);
                let policy: SyncPolicy = std::iter::once(rule).collect();

                let mut entity =
                    Record::new("target-1", "targets", json!({"field": local.clone()}));
                synchronize(&mut entity, &policy, &resolver).unwrap();

                let expected = if override_existing || is_blank(Some(&local)) {
                    related
                } else {
                    local
                };
                prop_assert_eq!(&entity.payload["field"], &expected);
            }
        }
    }
}
