use std::collections::BTreeMap;

use crate::error::Result;

/// Leaf-key index scoped to one parent node (plots, buildings, rooms).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionTree {
    entries: BTreeMap<String, u64>,
    modified: bool,
}

impl PartitionTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Self {
            entries: serde_json::from_slice(bytes)?,
            modified: false,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.entries)?)
    }

    pub fn find(&self, key: &str) -> Option<u64> {
        self.entries.get(key).copied()
    }

    /// First key of `keys` present in the partition
    pub fn find_first<'a, I>(&self, keys: I) -> Option<u64>
    where
        I: IntoIterator<Item = &'a String>,
    {
        keys.into_iter().find_map(|k| self.find(k))
    }

    /// Map `key` to `id`; true when the partition changed
    pub fn insert(&mut self, key: &str, id: u64) -> bool {
        if self.entries.get(key) == Some(&id) {
            return false;
        }
        self.entries.insert(key.to_string(), id);
        self.modified = true;
        true
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn mark_saved(&mut self) {
        self.modified = false;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
