use std::path::Path;
use tracing::info;

use super::KeyStore;
use crate::error::Result;

/// Opaque per-parent blobs, one image of a partition tree per parent node.
pub struct PartitionStore {
    store: KeyStore,
}

impl PartitionStore {
    pub fn open(base_dir: &Path) -> Result<Self> {
        let store = KeyStore::open(base_dir, "cobjs")?;
        info!("Opened partition store with {} entries", store.len()?);
        Ok(Self { store })
    }

    pub fn read_key_data(&self, parent_id: u64) -> Result<Option<Vec<u8>>> {
        Ok(self.store.get(parent_id)?.map(|v| v.to_vec()))
    }

    pub fn write_key_data(&self, parent_id: u64, data: &[u8]) -> Result<()> {
        self.store.put(parent_id, data)
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
