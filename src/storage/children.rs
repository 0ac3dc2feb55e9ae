use std::path::Path;

use super::{decode_key, KeyStore};
use crate::error::{GazetteerError, Result};

/// Parent id -> child ids adjacency lists, packed as big-endian u64s.
pub struct ChildrenTable {
    store: KeyStore,
}

impl ChildrenTable {
    pub fn open(base_dir: &Path) -> Result<Self> {
        Ok(Self {
            store: KeyStore::open(base_dir, "chis")?,
        })
    }

    pub fn get(&self, id: u64) -> Result<Option<Vec<u64>>> {
        let Some(raw) = self.store.get(id)? else {
            return Ok(None);
        };
        if raw.len() % 8 != 0 {
            return Err(GazetteerError::CorruptRecord {
                table: "chis",
                key: id,
            });
        }
        let ids = raw
            .chunks_exact(8)
            .filter_map(decode_key)
            .collect();
        Ok(Some(ids))
    }

    pub fn add(&self, id: u64, child_ids: &[u64]) -> Result<()> {
        let mut packed = Vec::with_capacity(child_ids.len() * 8);
        for child in child_ids {
            packed.extend_from_slice(&child.to_be_bytes());
        }
        self.store.put(id, &packed)
    }

    pub fn flush(&self) -> Result<()> {
        self.store.flush()
    }

    pub fn optimize(&mut self, budget: u32) -> Result<bool> {
        self.store.optimize(budget)
    }

    pub fn close(&mut self) -> Result<()> {
        self.store.close()
    }
}
