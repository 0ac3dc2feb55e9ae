//! Durable tables backing the repository.
//!
//! Every table is its own sled database in a subdirectory of the repository
//! directory. Keys are big-endian `u64`, so key order is numeric order and the
//! last key is the maximum id.

mod blobs;
mod children;
mod objects;
mod types;

pub use blobs::PartitionStore;
pub use children::ChildrenTable;
pub use objects::ObjectTable;
pub use types::TypeTable;

use sled::{Db, IVec};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::Builder;
use tracing::{debug, info};

use crate::error::{GazetteerError, Result};

pub(crate) fn encode_key(key: u64) -> [u8; 8] {
    key.to_be_bytes()
}

pub(crate) fn decode_key(bytes: &[u8]) -> Option<u64> {
    let arr: [u8; 8] = bytes.try_into().ok()?;
    Some(u64::from_be_bytes(arr))
}

/// A u64-keyed sled database living in its own directory.
pub struct KeyStore {
    name: &'static str,
    path: PathBuf,
    db: Option<Db>,
}

impl KeyStore {
    /// Open or create the store `<base_dir>/<name>`
    pub fn open(base_dir: &Path, name: &'static str) -> Result<Self> {
        let path = base_dir.join(name);
        let db = open_db(&path)?;
        debug!("Opened table {} at {}", name, path.display());
        Ok(Self {
            name,
            path,
            db: Some(db),
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn db(&self) -> Result<&Db> {
        self.db.as_ref().ok_or(GazetteerError::Closed)
    }

    pub fn get(&self, key: u64) -> Result<Option<IVec>> {
        Ok(self.db()?.get(encode_key(key))?)
    }

    pub fn put(&self, key: u64, value: &[u8]) -> Result<()> {
        self.db()?.insert(encode_key(key), value)?;
        Ok(())
    }

    /// Largest key present, 0 when empty
    pub fn max_key(&self) -> Result<u64> {
        match self.db()?.last()? {
            Some((k, _)) => decode_key(&k).ok_or(GazetteerError::CorruptRecord {
                table: self.name,
                key: 0,
            }),
            None => Ok(0),
        }
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.db()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.db()?.is_empty())
    }

    /// All entries in key order
    pub fn entries(&self) -> Result<Vec<(u64, IVec)>> {
        let mut res = Vec::new();
        for kv in self.db()?.iter() {
            let (k, v) = kv?;
            let key = decode_key(&k).ok_or(GazetteerError::CorruptRecord {
                table: self.name,
                key: 0,
            })?;
            res.push((key, v));
        }
        Ok(res)
    }

    pub fn flush(&self) -> Result<()> {
        self.db()?.flush()?;
        Ok(())
    }

    /// Rewrite the store into a fresh directory when at least `budget`
    /// percent of its on-disk size is reclaimable. Returns true when the
    /// store was rewritten.
    pub fn optimize(&mut self, budget: u32) -> Result<bool> {
        let db = self.db()?;
        db.flush()?;

        let on_disk = db.size_on_disk()?;
        let mut live: u64 = 0;
        for kv in db.iter() {
            let (k, v) = kv?;
            live += (k.len() + v.len()) as u64;
        }
        let reclaimable = on_disk.saturating_sub(live);
        let share = if on_disk == 0 {
            0
        } else {
            reclaimable.saturating_mul(100) / on_disk
        };
        if budget > 0 && share < u64::from(budget) {
            debug!(
                "Table {}: {}% reclaimable, below budget {}%",
                self.name, share, budget
            );
            return Ok(false);
        }

        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        let staging = Builder::new()
            .prefix(&format!(".{}-compact-", self.name))
            .tempdir_in(parent)?;
        let fresh_path = staging.path().join(self.name);
        let count = {
            let fresh = open_db(&fresh_path)?;
            let mut count = 0usize;
            for kv in db.iter() {
                let (k, v) = kv?;
                fresh.insert(k, v)?;
                count += 1;
            }
            fresh.flush()?;
            count
        };

        // Release the lock on the old directory before swapping it out
        self.db = None;
        fs::remove_dir_all(&self.path)?;
        fs::rename(&fresh_path, &self.path)?;
        self.db = Some(open_db(&self.path)?);

        let after = self.db()?.size_on_disk()?;
        info!(
            "Compacted table {}: {} records, {} -> {} bytes",
            self.name, count, on_disk, after
        );
        Ok(true)
    }

    /// Flush and release the store
    pub fn close(&mut self) -> Result<()> {
        if let Some(db) = self.db.take() {
            db.flush()?;
            debug!("Closed table {}", self.name);
        }
        Ok(())
    }
}

fn open_db(path: &Path) -> Result<Db> {
    // Flushing is explicit, so no background flusher holds the directory
    let db = sled::Config::new()
        .path(path)
        .flush_every_ms(None)
        .open()?;
    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_order_is_numeric() {
        let dir = tempfile::tempdir().unwrap();
        let store = KeyStore::open(dir.path(), "t").unwrap();
        store.put(2, b"b").unwrap();
        store.put(300, b"c").unwrap();
        store.put(1, b"a").unwrap();
        assert_eq!(store.max_key().unwrap(), 300);
        let keys: Vec<u64> = store.entries().unwrap().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![1, 2, 300]);
    }

    #[test]
    fn test_empty_store_max_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = KeyStore::open(dir.path(), "t").unwrap();
        assert_eq!(store.max_key().unwrap(), 0);
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_optimize_preserves_records() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = KeyStore::open(dir.path(), "t").unwrap();
        for i in 1..=200u64 {
            store.put(i, format!("value-{}", i).as_bytes()).unwrap();
        }
        // Overwrite to leave garbage behind
        for i in 1..=200u64 {
            store.put(i, format!("v{}", i).as_bytes()).unwrap();
        }
        assert!(store.optimize(0).unwrap());
        assert_eq!(store.len().unwrap(), 200);
        assert_eq!(store.get(17).unwrap().unwrap().as_ref(), b"v17");
        assert_eq!(store.max_key().unwrap(), 200);
    }

    #[test]
    fn test_reopen_after_close() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = KeyStore::open(dir.path(), "t").unwrap();
            store.put(5, b"five").unwrap();
            store.close().unwrap();
            assert!(matches!(store.get(5), Err(GazetteerError::Closed)));
        }
        let store = KeyStore::open(dir.path(), "t").unwrap();
        assert_eq!(store.get(5).unwrap().unwrap().as_ref(), b"five");
    }

    #[test]
    fn test_decode_key_rejects_bad_length() {
        assert_eq!(decode_key(&[1, 2, 3]), None);
        assert_eq!(decode_key(&encode_key(77)), Some(77));
    }
}
