//! Managed parameter table and the merge policy.
//!
//! Keys are always normalized names (see `name::normalize`). Values are opaque
//! YAML values and are never interpreted. BTreeMap keeps the persisted file in
//! a stable key order; nothing relies on that order for correctness.

use std::collections::btree_map;
use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::name::normalize;

/// Opaque parameter value (scalar, sequence, mapping or any nesting of them).
pub type ParamValue = Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamTable {
    entries: BTreeMap<String, ParamValue>,
}

impl ParamTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a single entry. Returns the previous value, if any.
    pub fn upsert(&mut self, name: &str, value: ParamValue) -> Option<ParamValue> {
        self.entries.insert(normalize(name), value)
    }

    /// Drop an entry (used to roll back a failed save of a new key).
    pub fn remove(&mut self, name: &str) -> Option<ParamValue> {
        self.entries.remove(&normalize(name))
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries.get(&normalize(name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, ParamValue> {
        self.entries.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    /// Fold `other` into `self`; on collision `other` wins.
    pub fn extend_from(&mut self, other: ParamTable) {
        self.entries.extend(other.entries);
    }

    /// YAML document with one top-level entry per parameter.
    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(&self.entries).context("serialize parameter table to yaml")
    }
}

impl FromIterator<(String, ParamValue)> for ParamTable {
    fn from_iter<I: IntoIterator<Item = (String, ParamValue)>>(iter: I) -> Self {
        let mut t = ParamTable::new();
        for (k, v) in iter {
            t.upsert(&k, v);
        }
        t
    }
}

impl IntoIterator for ParamTable {
    type Item = (String, ParamValue);
    type IntoIter = btree_map::IntoIter<String, ParamValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a ParamTable {
    type Item = (&'a String, &'a ParamValue);
    type IntoIter = btree_map::Iter<'a, String, ParamValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// All keys of `a` and `b`; for keys present in both, `b` wins.
///
/// Startup uses `merge(defaults, persisted)`, so saved overrides always take
/// precedence over shipped defaults.
pub fn merge(a: ParamTable, b: ParamTable) -> ParamTable {
    let mut out = a;
    out.extend_from(b);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(pairs: &[(&str, i64)]) -> ParamTable {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::from(*v)))
            .collect()
    }

    #[test]
    fn merge_right_wins() {
        let a = table(&[("/a", 1), ("/shared", 1)]);
        let b = table(&[("/b", 2), ("/shared", 2)]);
        let m = merge(a, b);
        assert_eq!(m.len(), 3);
        assert_eq!(m.get("/shared"), Some(&Value::from(2)));
        assert_eq!(m.get("a"), Some(&Value::from(1)));
        assert_eq!(m.get("/b"), Some(&Value::from(2)));
    }

    #[test]
    fn upsert_normalizes_key() {
        let mut t = ParamTable::new();
        assert!(t.upsert("foo", Value::from(1)).is_none());
        let prev = t.upsert("/foo", Value::from(2));
        assert_eq!(prev, Some(Value::from(1)));
        assert_eq!(t.len(), 1);
        assert_eq!(t.names().collect::<Vec<_>>(), vec!["/foo"]);
    }

    #[test]
    fn yaml_output_uses_plain_top_level_keys() {
        let t = table(&[("foo", 42)]);
        let s = t.to_yaml_string().unwrap();
        assert_eq!(s.trim(), "/foo: 42");
    }
}
