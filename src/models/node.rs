//! Persisted repository node.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use super::AddrLevel;

/// Id of the implicit root node
pub const ROOT_ID: u64 = 1;

/// Entry of the gazetteer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryNode {
    /// Stable id, assigned as max id + 1
    pub id: u64,

    /// Canonical display string
    pub spelling: String,

    /// Level; `None` only for the implicit root
    pub level: Option<AddrLevel>,

    /// Ordered set of classifier strings
    pub types: Vec<String>,

    /// Parent node ids (at most one is populated)
    pub parent_ids: Vec<u64>,

    /// Child node ids, loaded from the children table on demand
    pub child_ids: Vec<u64>,

    /// External registry guids correlated with this node
    pub registry_links: Vec<String>,
}

impl RepositoryNode {
    pub fn new(id: u64, spelling: impl Into<String>, level: AddrLevel) -> Self {
        Self {
            id,
            spelling: spelling.into(),
            level: Some(level),
            ..Default::default()
        }
    }

    pub fn root() -> Self {
        Self {
            id: ROOT_ID,
            spelling: "Root".to_string(),
            ..Default::default()
        }
    }

    pub fn is_root(&self) -> bool {
        self.id == ROOT_ID
    }

    /// Add a type if not present yet; returns true when added
    pub fn merge_type(&mut self, typ: &str) -> bool {
        if typ.is_empty() || self.types.iter().any(|t| t == typ) {
            return false;
        }
        self.types.push(typ.to_string());
        true
    }

    /// Add a registry link if not present yet; returns true when added
    pub fn merge_registry_link(&mut self, guid: &str) -> bool {
        if self.registry_links.iter().any(|g| g == guid) {
            return false;
        }
        self.registry_links.push(guid.to_string());
        true
    }

    fn level_rank(&self) -> u8 {
        self.level.map(|l| l.rank()).unwrap_or(0)
    }
}

impl PartialOrd for RepositoryNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Level first (country first), then spelling, then id
impl Ord for RepositoryNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.level_rank()
            .cmp(&other.level_rank())
            .then_with(|| self.spelling.cmp(&other.spelling))
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl fmt::Display for RepositoryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (ID={})", self.spelling, self.id)
    }
}
