//! Search keys and match costs for parsed address items.

mod normalize;
mod scorer;

pub use normalize::Normalizer;
pub use scorer::ReferenceScorer;

use crate::index::IndexStub;
use crate::levels::can_be_equals_registry_level;
use crate::models::{AddrLevel, ParsedAddressItem, RepositoryNode};
use crate::storage::TypeTable;

/// Costs at or above this value are never accepted as a match
pub const REJECT_COST: u32 = 100;

/// Everything the resolver needs to look up one area item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchContext {
    /// Candidate index keys, most specific first
    pub keys: Vec<String>,
    pub level: AddrLevel,
    /// Canonical head types of the item
    pub types: Vec<String>,
    /// Ids of `types` already known to the type table
    pub type_ids: Vec<u32>,
    pub miscs: Vec<String>,
}

/// Pluggable matching strategy used by the repository.
pub trait MatchScorer {
    /// Keys and classifiers of an area item. Type ids are looked up only,
    /// never registered.
    fn build_search_context(&self, item: &ParsedAddressItem, types: &TypeTable) -> SearchContext;

    /// Cost of matching `ctx` with `stub` given the nearest resolved
    /// ancestor and the one above it; 0 is exact
    fn score(
        &self,
        ctx: &SearchContext,
        stub: &IndexStub,
        hint1: Option<&RepositoryNode>,
        hint2: Option<&RepositoryNode>,
    ) -> u32;

    /// Partition keys of a plot, house or room item, most specific first
    fn leaf_search_keys(&self, item: &ParsedAddressItem) -> Vec<String>;

    /// Enrich a matched node from the item; returns true when it changed
    fn correct(
        &self,
        ctx: &SearchContext,
        item: &ParsedAddressItem,
        node: &mut RepositoryNode,
        stub: &IndexStub,
        ancestor: Option<&RepositoryNode>,
    ) -> bool;
}

/// Guids of the registry entities that can denote the same object as `item`
pub fn registry_links(item: &ParsedAddressItem) -> Vec<String> {
    let mut res: Vec<String> = Vec::new();
    for reg in &item.registry_refs {
        if can_be_equals_registry_level(item, reg) && !res.contains(&reg.id) {
            res.push(reg.id.clone());
        }
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AreaAttributes, Attributes, RegistryEntity, RegistryLevel};

    #[test]
    fn test_registry_links_filtered_by_level() {
        let mut item = ParsedAddressItem::new(
            Attributes::Area(AreaAttributes::new("Москва", "город")),
            AddrLevel::City,
        );
        let entity = |id: &str, level: RegistryLevel| RegistryEntity {
            id: id.to_string(),
            level,
            attrs: Attributes::Area(AreaAttributes::new("Москва", "город")),
            parent_ids: Vec::new(),
        };
        item.registry_refs = vec![
            entity("city-guid", RegistryLevel::City),
            entity("street-guid", RegistryLevel::Street),
            entity("city-guid", RegistryLevel::City),
        ];
        assert_eq!(registry_links(&item), vec!["city-guid".to_string()]);
    }
}
