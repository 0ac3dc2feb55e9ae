use lru::LruCache;
use std::num::NonZeroUsize;
use tracing::debug;

use super::PartitionTree;
use crate::error::Result;
use crate::storage::PartitionStore;

/// Bounded write-back cache of per-parent partitions.
///
/// A dirty partition is written to the blob store before it leaves the cache.
pub struct PartitionCache {
    entries: LruCache<u64, PartitionTree>,
}

impl PartitionCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
        }
    }

    /// Partition of `parent_id`, loading it from `store` on a miss.
    /// Refreshes its recency.
    pub fn get_or_load(
        &mut self,
        parent_id: u64,
        store: &PartitionStore,
    ) -> Result<&mut PartitionTree> {
        let loaded = if self.entries.contains(&parent_id) {
            None
        } else {
            let tree = match store.read_key_data(parent_id)? {
                Some(bytes) => PartitionTree::from_bytes(&bytes)?,
                None => PartitionTree::new(),
            };
            self.evict_if_full(store)?;
            Some(tree)
        };
        Ok(self
            .entries
            .get_or_insert_mut(parent_id, || loaded.unwrap_or_default()))
    }

    fn evict_if_full(&mut self, store: &PartitionStore) -> Result<()> {
        if self.entries.len() < self.entries.cap().get() {
            return Ok(());
        }
        if let Some((parent_id, tree)) = self.entries.pop_lru() {
            if tree.is_modified() {
                store.write_key_data(parent_id, &tree.to_bytes()?)?;
                debug!("Evicted dirty partition {} ({} keys)", parent_id, tree.len());
            } else {
                debug!("Evicted partition {}", parent_id);
            }
        }
        Ok(())
    }

    /// Write every dirty partition; returns how many were written
    pub fn flush_dirty(&mut self, store: &PartitionStore) -> Result<usize> {
        let mut written = 0;
        for (parent_id, tree) in self.entries.iter_mut() {
            if tree.is_modified() {
                store.write_key_data(*parent_id, &tree.to_bytes()?)?;
                tree.mark_saved();
                written += 1;
            }
        }
        Ok(written)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, parent_id: u64) -> bool {
        self.entries.contains(&parent_id)
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_bound_and_write_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = PartitionStore::open(dir.path()).unwrap();
        let mut cache = PartitionCache::new(2);

        for parent in 10..15u64 {
            let tree = cache.get_or_load(parent, &store).unwrap();
            tree.insert("Д1", parent * 100);
            assert!(cache.len() <= 2);
        }
        assert!(cache.contains(14));
        assert!(!cache.contains(10));

        // Evicted partitions come back from the store
        let tree = cache.get_or_load(10, &store).unwrap();
        assert_eq!(tree.find("Д1"), Some(1000));
        assert!(!tree.is_modified());
    }

    #[test]
    fn test_recency_refreshed_by_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let store = PartitionStore::open(dir.path()).unwrap();
        let mut cache = PartitionCache::new(2);
        cache.get_or_load(1, &store).unwrap();
        cache.get_or_load(2, &store).unwrap();
        cache.get_or_load(1, &store).unwrap();
        cache.get_or_load(3, &store).unwrap();
        assert!(cache.contains(1));
        assert!(!cache.contains(2));
    }

    #[test]
    fn test_flush_dirty_then_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = PartitionStore::open(dir.path()).unwrap();
        let mut cache = PartitionCache::new(4);
        cache.get_or_load(7, &store).unwrap().insert("КВ3", 70);
        cache.get_or_load(8, &store).unwrap();
        assert_eq!(cache.flush_dirty(&store).unwrap(), 1);
        assert_eq!(cache.flush_dirty(&store).unwrap(), 0);
        cache.clear();
        assert!(cache.is_empty());
        assert!(store.read_key_data(7).unwrap().is_some());
        assert!(store.read_key_data(8).unwrap().is_none());
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let cache = PartitionCache::new(0);
        assert_eq!(cache.capacity(), 1);
    }
}
