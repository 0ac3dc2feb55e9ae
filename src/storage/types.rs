use hashbrown::HashMap;
use std::path::Path;
use tracing::debug;

use super::KeyStore;
use crate::error::{GazetteerError, Result};

/// Shared dictionary of classifier strings ("улица", "город", ...).
///
/// Ids are persisted as `id -> name`; the reverse lookup is an in-memory
/// mirror rebuilt when the table is opened.
pub struct TypeTable {
    store: KeyStore,
    names: HashMap<u32, String>,
    ids: HashMap<String, u32>,
    max_id: u32,
}

impl TypeTable {
    pub fn open(base_dir: &Path) -> Result<Self> {
        let store = KeyStore::open(base_dir, "typs")?;
        let mut names = HashMap::new();
        let mut ids = HashMap::new();
        let mut max_id = 0u32;

        for (key, value) in store.entries()? {
            let id = u32::try_from(key).map_err(|_| GazetteerError::CorruptRecord {
                table: "typs",
                key,
            })?;
            let name = String::from_utf8(value.to_vec())
                .map_err(|_| GazetteerError::CorruptRecord { table: "typs", key })?;
            ids.insert(name.clone(), id);
            names.insert(id, name);
            max_id = max_id.max(id);
        }
        debug!("Loaded {} type names", names.len());

        Ok(Self {
            store,
            names,
            ids,
            max_id,
        })
    }

    /// Id of `name`, registering it when unknown
    pub fn intern(&mut self, name: &str) -> Result<u32> {
        if let Some(id) = self.ids.get(name) {
            return Ok(*id);
        }
        let id = self.max_id + 1;
        self.store.put(u64::from(id), name.as_bytes())?;
        self.max_id = id;
        self.ids.insert(name.to_string(), id);
        self.names.insert(id, name.to_string());
        Ok(id)
    }

    pub fn find(&self, name: &str) -> Option<u32> {
        self.ids.get(name).copied()
    }

    pub fn name(&self, id: u32) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn flush(&self) -> Result<()> {
        self.store.flush()
    }

    pub fn close(&mut self) -> Result<()> {
        self.store.close()
    }
}
