/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Dictionary registry, version registry, and version matcher.
//!
//! `DxRegistry` is a concurrent name-keyed map of loaded dictionaries.
//! `VxRegistry` is a concurrent name-keyed map of version records.
//! `VxMatcher` groups version records by layer at construction time and
//! scans them in registration order to resolve an inbound message to the
//! version (and therefore dictionary set) it was encoded with.

use crate::error::RegistryError;
use crate::schema::Dictionary;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Concurrent name-keyed map of loaded dictionaries.
///
/// Read-mostly: dictionaries are inserted at startup and effectively
/// immutable afterward, but the registry itself tolerates insert/remove at
/// any time guarded by a reader/writer lock.
#[derive(Debug, Default)]
pub struct DxRegistry {
    dictionaries: RwLock<HashMap<String, Arc<Dictionary>>>,
}

impl DxRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a dictionary under `name`.
    ///
    /// # Errors
    /// Returns [`RegistryError::DuplicateName`] if `name` is already registered.
    pub fn insert(&self, name: impl Into<String>, dictionary: Dictionary) -> Result<(), RegistryError> {
        let name = name.into();
        let mut guard = self.dictionaries.write();
        if guard.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }
        guard.insert(name, Arc::new(dictionary));
        Ok(())
    }

    /// Returns the dictionary registered under `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<Dictionary>> {
        self.dictionaries.read().get(name).cloned()
    }

    /// Removes the dictionary registered under `name`.
    ///
    /// # Errors
    /// Returns [`RegistryError::UnknownName`] if nothing is registered under `name`.
    pub fn remove(&self, name: &str) -> Result<Arc<Dictionary>, RegistryError> {
        self.dictionaries
            .write()
            .remove(name)
            .ok_or_else(|| RegistryError::UnknownName(name.to_string()))
    }

    /// Returns a snapshot of all registered names.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.dictionaries.read().keys().cloned().collect()
    }
}

/// The layer a version record applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    /// Session-layer (transport) version, e.g. FIXT.1.1.
    Session,
    /// Application-layer version, e.g. FIX.4.4 application messages under FIXT.
    Application,
    /// A single version record spanning both layers (pre-FIXT FIX.4.x).
    Combined,
}

/// A `(tag, exact-value)` pair that must appear verbatim in a candidate
/// message for its enclosing [`MatchRule`] to be satisfied.
#[derive(Debug, Clone)]
pub struct MatchPair {
    /// The tag to match.
    pub tag: u32,
    /// The exact value the tag must carry.
    pub value: String,
}

/// A named set of `(tag, value)` pairs; a rule is satisfied when every pair
/// is present in the candidate message.
#[derive(Debug, Clone)]
pub struct MatchRule {
    /// Rule name, for diagnostics.
    pub name: String,
    /// Pairs that must all be present for the rule to match.
    pub pairs: Vec<MatchPair>,
}

impl MatchRule {
    /// Returns true if every pair of this rule is satisfied by `lookup`.
    ///
    /// String comparison is case-sensitive and byte-exact, matching FIX's
    /// ASCII wire values.
    pub fn matches(&self, lookup: &dyn Fn(u32) -> Option<&str>) -> bool {
        self.pairs
            .iter()
            .all(|pair| lookup(pair.tag) == Some(pair.value.as_str()))
    }
}

/// A binding of a protocol version to an ordered list of dictionaries and a
/// set of match rules.
#[derive(Debug, Clone)]
pub struct VersionRecord {
    /// Record name, unique within the registry.
    pub name: String,
    /// The layer this record applies to.
    pub layer: Layer,
    /// Literal BeginString(8) value for this version.
    pub begin_string: String,
    /// Literal ApplVerID(1128) value, if this version is FIXT-based.
    pub appl_ver_id: Option<String>,
    /// Match rules; the record matches a message when at least one rule's
    /// pairs are all present.
    pub rules: Vec<MatchRule>,
    /// Ordered dictionary names backing this version.
    pub dictionaries: Vec<String>,
}

impl VersionRecord {
    /// Returns true if any of this record's rules is satisfied by `lookup`.
    pub fn matches(&self, lookup: &dyn Fn(u32) -> Option<&str>) -> bool {
        self.rules.iter().any(|rule| rule.matches(lookup))
    }
}

/// Concurrent name-keyed map of [`VersionRecord`]s, preserving insertion
/// order for matcher construction.
#[derive(Debug, Default)]
pub struct VxRegistry {
    records: RwLock<Vec<VersionRecord>>,
    by_name: RwLock<HashMap<String, usize>>,
}

impl VxRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a version record, preserving registration order.
    ///
    /// # Errors
    /// Returns [`RegistryError::DuplicateName`] if the record's name is
    /// already registered.
    pub fn insert(&self, record: VersionRecord) -> Result<(), RegistryError> {
        let mut by_name = self.by_name.write();
        if by_name.contains_key(&record.name) {
            return Err(RegistryError::DuplicateName(record.name));
        }
        let mut records = self.records.write();
        by_name.insert(record.name.clone(), records.len());
        records.push(record);
        Ok(())
    }

    /// Returns the version record registered under `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<VersionRecord> {
        let by_name = self.by_name.read();
        let idx = *by_name.get(name)?;
        self.records.read().get(idx).cloned()
    }

    /// Removes the version record registered under `name`.
    ///
    /// # Errors
    /// Returns [`RegistryError::UnknownName`] if nothing is registered under `name`.
    pub fn remove(&self, name: &str) -> Result<(), RegistryError> {
        let mut by_name = self.by_name.write();
        let idx = by_name
            .remove(name)
            .ok_or_else(|| RegistryError::UnknownName(name.to_string()))?;
        self.records.write().remove(idx);
        for value in by_name.values_mut() {
            if *value > idx {
                *value -= 1;
            }
        }
        Ok(())
    }

    /// Returns a snapshot of all registered records, in registration order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<VersionRecord> {
        self.records.read().clone()
    }
}

/// Resolves an inbound message's fields to the best-matching version
/// record at a requested layer.
///
/// Built once at init from a [`VxRegistry`] snapshot, grouping records by
/// layer. `get_version` scans a layer's records in registration order and
/// returns the first whose rule-set is satisfied; this makes the matcher
/// total and deterministic for any permutation of the *set* of input
/// fields (the match predicate only checks presence, never iteration order).
#[derive(Debug, Clone)]
pub struct VxMatcher {
    session: Vec<VersionRecord>,
    application: Vec<VersionRecord>,
    combined: Vec<VersionRecord>,
}

impl VxMatcher {
    /// Builds a matcher from a registry snapshot, preserving registration
    /// order within each layer.
    #[must_use]
    pub fn from_registry(registry: &VxRegistry) -> Self {
        Self::from_records(registry.snapshot())
    }

    /// Builds a matcher directly from an already-ordered list of records.
    #[must_use]
    pub fn from_records(records: Vec<VersionRecord>) -> Self {
        let mut session = Vec::new();
        let mut application = Vec::new();
        let mut combined = Vec::new();
        for record in records {
            match record.layer {
                Layer::Session => session.push(record),
                Layer::Application => application.push(record),
                Layer::Combined => combined.push(record),
            }
        }
        Self {
            session,
            application,
            combined,
        }
    }

    /// Scans `layer`'s records in registration order, returning the first
    /// whose rule-set is satisfied by `lookup`.
    #[must_use]
    pub fn get_version(&self, layer: Layer, lookup: &dyn Fn(u32) -> Option<&str>) -> Option<&VersionRecord> {
        let records = match layer {
            Layer::Session => &self.session,
            Layer::Application => &self.application,
            Layer::Combined => &self.combined,
        };
        records.iter().find(|record| record.matches(lookup))
    }

    /// Equivalent to `get_version(Layer::Session, lookup)`.
    #[must_use]
    pub fn get_sx_version(&self, lookup: &dyn Fn(u32) -> Option<&str>) -> Option<&VersionRecord> {
        self.get_version(Layer::Session, lookup)
    }

    /// Tries `Application`, then `Combined`, then `Session`, in that order.
    #[must_use]
    pub fn get_ax_version(&self, lookup: &dyn Fn(u32) -> Option<&str>) -> Option<&VersionRecord> {
        self.get_version(Layer::Application, lookup)
            .or_else(|| self.get_version(Layer::Combined, lookup))
            .or_else(|| self.get_version(Layer::Session, lookup))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Version as DxVersion;

    #[test]
    fn test_dx_registry_insert_get_duplicate() {
        let registry = DxRegistry::new();
        registry.insert("FIX.4.4", Dictionary::new(DxVersion::Fix44)).unwrap();
        assert!(registry.get("FIX.4.4").is_some());
        assert!(matches!(
            registry.insert("FIX.4.4", Dictionary::new(DxVersion::Fix44)),
            Err(RegistryError::DuplicateName(_))
        ));
    }

    fn rule(name: &str, pairs: &[(u32, &str)]) -> MatchRule {
        MatchRule {
            name: name.to_string(),
            pairs: pairs
                .iter()
                .map(|(tag, value)| MatchPair {
                    tag: *tag,
                    value: (*value).to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_matcher_first_match_wins_in_registration_order() {
        let records = vec![
            VersionRecord {
                name: "fix42".into(),
                layer: Layer::Combined,
                begin_string: "FIX.4.2".into(),
                appl_ver_id: None,
                rules: vec![rule("bs", &[(8, "FIX.4.2")])],
                dictionaries: vec!["FIX.4.2".into()],
            },
            VersionRecord {
                name: "fix44".into(),
                layer: Layer::Combined,
                begin_string: "FIX.4.4".into(),
                appl_ver_id: None,
                rules: vec![rule("bs", &[(8, "FIX.4.4")])],
                dictionaries: vec!["FIX.4.4".into()],
            },
        ];
        let matcher = VxMatcher::from_records(records);
        let fields = [(8u32, "FIX.4.4")];
        let lookup = |tag: u32| fields.iter().find(|(t, _)| *t == tag).map(|(_, v)| *v);
        let matched = matcher.get_version(Layer::Combined, &lookup).unwrap();
        assert_eq!(matched.name, "fix44");
    }

    #[test]
    fn test_matcher_totality_independent_of_field_order() {
        let record = VersionRecord {
            name: "fixt-app44".into(),
            layer: Layer::Application,
            begin_string: "FIXT.1.1".into(),
            appl_ver_id: Some("6".into()),
            rules: vec![rule("appl", &[(1128, "6"), (35, "D")])],
            dictionaries: vec!["FIX.4.4".into()],
        };
        let matcher = VxMatcher::from_records(vec![record]);

        let order_a = [(1128u32, "6"), (35u32, "D")];
        let order_b = [(35u32, "D"), (1128u32, "6")];
        let lookup_a = |tag: u32| order_a.iter().find(|(t, _)| *t == tag).map(|(_, v)| *v);
        let lookup_b = |tag: u32| order_b.iter().find(|(t, _)| *t == tag).map(|(_, v)| *v);

        assert_eq!(
            matcher.get_ax_version(&lookup_a).map(|r| r.name.clone()),
            matcher.get_ax_version(&lookup_b).map(|r| r.name.clone())
        );
    }

    #[test]
    fn test_get_ax_version_falls_back_through_layers() {
        let session_record = VersionRecord {
            name: "fixt-session".into(),
            layer: Layer::Session,
            begin_string: "FIXT.1.1".into(),
            appl_ver_id: None,
            rules: vec![rule("bs", &[(8, "FIXT.1.1")])],
            dictionaries: vec![],
        };
        let matcher = VxMatcher::from_records(vec![session_record]);
        let fields = [(8u32, "FIXT.1.1")];
        let lookup = |tag: u32| fields.iter().find(|(t, _)| *t == tag).map(|(_, v)| *v);
        let matched = matcher.get_ax_version(&lookup).unwrap();
        assert_eq!(matched.name, "fixt-session");
    }
}
