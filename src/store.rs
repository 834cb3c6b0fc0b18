//! Key/value store that receives loaded configuration
//!
//! The store is owned by the caller. Loaders only touch it through
//! [`ConfigStore`], so any map-like type can be used as the target.

use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;
use std::str::FromStr;

/// How loaded entries combine with keys already present in the store.
///
/// Entries are always applied in source order, so with [`MergeStrategy::Dict`]
/// the last assignment of a key wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeStrategy {
    /// Overwrite existing keys, like `dict.update`.
    #[default]
    Dict,
    /// Insert only keys the store does not already have.
    KeepExisting,
}

impl MergeStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeStrategy::Dict => "dict",
            MergeStrategy::KeepExisting => "keep-existing",
        }
    }
}

impl FromStr for MergeStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dict" => Ok(MergeStrategy::Dict),
            "keep-existing" | "keep_existing" => Ok(MergeStrategy::KeepExisting),
            other => Err(format!("Invalid merge strategy '{other}'")),
        }
    }
}

/// Mutable configuration mapping filled by a loader.
pub trait ConfigStore {
    fn get(&self, key: &str) -> Option<&Value>;

    /// Insert or replace a value, returning the previous one.
    fn insert(&mut self, key: String, value: Value) -> Option<Value>;

    fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Apply `entries` in order under `strategy`. Returns how many keys were written.
    fn merge(&mut self, entries: Vec<(String, Value)>, strategy: MergeStrategy) -> usize {
        let mut written = 0;
        for (key, value) in entries {
            if strategy == MergeStrategy::KeepExisting && self.contains_key(&key) {
                continue;
            }
            self.insert(key, value);
            written += 1;
        }
        written
    }
}

impl ConfigStore for BTreeMap<String, Value> {
    fn get(&self, key: &str) -> Option<&Value> {
        BTreeMap::get(self, key)
    }

    fn insert(&mut self, key: String, value: Value) -> Option<Value> {
        BTreeMap::insert(self, key, value)
    }
}

impl<S: BuildHasher> ConfigStore for HashMap<String, Value, S> {
    fn get(&self, key: &str) -> Option<&Value> {
        HashMap::get(self, key)
    }

    fn insert(&mut self, key: String, value: Value) -> Option<Value> {
        HashMap::insert(self, key, value)
    }
}

impl ConfigStore for Map<String, Value> {
    fn get(&self, key: &str) -> Option<&Value> {
        Map::get(self, key)
    }

    fn insert(&mut self, key: String, value: Value) -> Option<Value> {
        Map::insert(self, key, value)
    }
}
