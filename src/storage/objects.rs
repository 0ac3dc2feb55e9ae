use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{KeyStore, TypeTable};
use crate::error::{GazetteerError, Result};
use crate::models::{AddrLevel, RepositoryNode};

/// On-disk layout of a node. Types are stored as type-table ids and the
/// child list lives in the children table.
#[derive(Debug, Serialize, Deserialize)]
struct ObjectRecord {
    spelling: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    level: Option<AddrLevel>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    types: Vec<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    parents: Vec<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    registry: Vec<String>,
}

/// Node id -> node record.
pub struct ObjectTable {
    store: KeyStore,
}

impl ObjectTable {
    pub fn open(base_dir: &Path) -> Result<Self> {
        Ok(Self {
            store: KeyStore::open(base_dir, "objs")?,
        })
    }

    /// Load a node without its children
    pub fn get(&self, id: u64, types: &TypeTable) -> Result<Option<RepositoryNode>> {
        let Some(raw) = self.store.get(id)? else {
            return Ok(None);
        };
        let record: ObjectRecord = serde_json::from_slice(&raw)?;

        let mut type_names = Vec::with_capacity(record.types.len());
        for type_id in record.types {
            let name = types
                .name(type_id)
                .ok_or(GazetteerError::CorruptRecord { table: "objs", key: id })?;
            type_names.push(name.to_string());
        }

        Ok(Some(RepositoryNode {
            id,
            spelling: record.spelling,
            level: record.level,
            types: type_names,
            parent_ids: record.parents,
            child_ids: Vec::new(),
            registry_links: record.registry,
        }))
    }

    pub fn add(&self, id: u64, node: &RepositoryNode, types: &mut TypeTable) -> Result<()> {
        let mut type_ids = Vec::with_capacity(node.types.len());
        for name in &node.types {
            type_ids.push(types.intern(name)?);
        }
        let record = ObjectRecord {
            spelling: node.spelling.clone(),
            level: node.level,
            types: type_ids,
            parents: node.parent_ids.clone(),
            registry: node.registry_links.clone(),
        };
        let raw = serde_json::to_vec(&record)?;
        self.store.put(id, &raw)
    }

    pub fn max_key(&self) -> Result<u64> {
        self.store.max_key()
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_survives_storage() {
        let dir = tempfile::tempdir().unwrap();
        let mut types = TypeTable::open(dir.path()).unwrap();
        let objects = ObjectTable::open(dir.path()).unwrap();

        let mut node = RepositoryNode::new(2, "улица Ленина", AddrLevel::Street);
        node.types = vec!["улица".to_string()];
        node.parent_ids = vec![1];
        node.registry_links = vec!["a1b2".to_string()];
        node.child_ids = vec![10, 11];
        objects.add(2, &node, &mut types).unwrap();

        let loaded = objects.get(2, &types).unwrap().unwrap();
        assert_eq!(loaded.spelling, "улица Ленина");
        assert_eq!(loaded.level, Some(AddrLevel::Street));
        assert_eq!(loaded.types, node.types);
        assert_eq!(loaded.parent_ids, vec![1]);
        assert_eq!(loaded.registry_links, node.registry_links);
        assert!(loaded.child_ids.is_empty());
        assert_eq!(types.find("улица"), Some(1));
    }

    #[test]
    fn test_missing_and_max() {
        let dir = tempfile::tempdir().unwrap();
        let mut types = TypeTable::open(dir.path()).unwrap();
        let objects = ObjectTable::open(dir.path()).unwrap();
        assert!(objects.get(1, &types).unwrap().is_none());
        objects.add(1, &RepositoryNode::root(), &mut types).unwrap();
        objects
            .add(9, &RepositoryNode::new(9, "Москва", AddrLevel::City), &mut types)
            .unwrap();
        assert_eq!(objects.max_key().unwrap(), 9);
        assert_eq!(objects.get(1, &types).unwrap().unwrap().level, None);
    }

    #[test]
    fn test_unknown_type_id_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let types = TypeTable::open(dir.path()).unwrap();
        let objects = ObjectTable::open(dir.path()).unwrap();
        objects
            .store
            .put(5, br#"{"spelling":"x","types":[42]}"#)
            .unwrap();
        assert!(matches!(
            objects.get(5, &types),
            Err(GazetteerError::CorruptRecord { table: "objs", key: 5 })
        ));
    }
}
