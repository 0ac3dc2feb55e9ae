use tracing::trace;

use super::{registry_links, MatchScorer, Normalizer, SearchContext, REJECT_COST};
use crate::index::IndexStub;
use crate::levels::{can_be_parent, levels_equal_modulo_road};
use crate::models::{Attributes, HouseType, ParsedAddressItem, RepositoryNode};
use crate::storage::TypeTable;

const ROAD_LEVEL_COST: u32 = 10;
const GRANDPARENT_COST: u32 = 5;
const UNLINKED_COST: u32 = 30;
const TYPE_MISMATCH_COST: u32 = 10;
const ROOTLESS_COST: u32 = 5;

/// Default scorer: exact keys on normalized spellings plus a small cost
/// table for level, parent and type disagreements.
#[derive(Debug, Clone, Default)]
pub struct ReferenceScorer {
    normalizer: Normalizer,
}

impl ReferenceScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_normalizer(normalizer: Normalizer) -> Self {
        Self { normalizer }
    }

    fn area_keys(&self, item: &ParsedAddressItem) -> Vec<String> {
        let Some(area) = item.attrs.as_area() else {
            return Vec::new();
        };
        let mut keys: Vec<String> = Vec::new();
        let mut push = |key: String| {
            if !key.is_empty() && !keys.contains(&key) {
                keys.push(key);
            }
        };
        match &area.number {
            Some(num) if area.names.is_empty() => push(self.normalizer.key(num)),
            Some(num) => {
                for name in &area.names {
                    push(self.normalizer.key(&format!("{} {}", name, num)));
                }
            }
            None => {
                for name in &area.names {
                    push(self.normalizer.key(name));
                }
            }
        }
        keys
    }

    fn compact_key(&self, text: &str) -> String {
        self.normalizer.key(text).replace(' ', "")
    }
}

impl MatchScorer for ReferenceScorer {
    fn build_search_context(&self, item: &ParsedAddressItem, types: &TypeTable) -> SearchContext {
        let mut canonical: Vec<String> = Vec::new();
        for typ in item.attrs.types() {
            let c = self.normalizer.canonical_type(typ);
            if !c.is_empty() && !canonical.contains(&c) {
                canonical.push(c);
            }
        }
        let type_ids = canonical.iter().filter_map(|t| types.find(t)).collect();
        SearchContext {
            keys: self.area_keys(item),
            level: item.level,
            types: canonical,
            type_ids,
            miscs: item.attrs.miscs().to_vec(),
        }
    }

    fn score(
        &self,
        ctx: &SearchContext,
        stub: &IndexStub,
        hint1: Option<&RepositoryNode>,
        hint2: Option<&RepositoryNode>,
    ) -> u32 {
        let Some(stub_level) = stub.level else {
            return REJECT_COST;
        };
        let mut cost = 0;

        if stub_level != ctx.level {
            // Only the item's tags are known here, the stub carries none
            if !levels_equal_modulo_road(ctx.level, stub_level, &ctx.miscs, &ctx.miscs) {
                return REJECT_COST;
            }
            cost += ROAD_LEVEL_COST;
        }

        match hint1 {
            Some(parent) if stub.parents.contains(&parent.id) => {}
            Some(_) => {
                if hint2.is_some_and(|gp| stub.parents.contains(&gp.id)) {
                    cost += GRANDPARENT_COST;
                } else if stub.parents.is_empty() {
                    cost += UNLINKED_COST;
                } else {
                    return REJECT_COST;
                }
            }
            None if !stub.parents.is_empty() => cost += ROOTLESS_COST,
            None => {}
        }

        let stub_has_types = !stub.type_ids.is_empty();
        if !ctx.types.is_empty() && stub_has_types {
            let shared = ctx.type_ids.iter().any(|t| stub.type_ids.contains(t));
            if !shared {
                cost += TYPE_MISMATCH_COST;
            }
        }

        trace!("Scored stub {} at {}", stub.id, cost);
        cost
    }

    fn leaf_search_keys(&self, item: &ParsedAddressItem) -> Vec<String> {
        let mut keys = Vec::new();
        match &item.attrs {
            Attributes::House(h) => {
                let Some(num) = &h.number else {
                    return keys;
                };
                let mut suffix = String::new();
                if let Some(b) = &h.building_number {
                    suffix.push('К');
                    suffix.push_str(&self.compact_key(b));
                }
                if let Some(s) = &h.structure_number {
                    suffix.push('С');
                    suffix.push_str(&self.compact_key(s));
                }
                let num = self.compact_key(num);
                keys.push(format!("{}{}{}", h.house_type.key_code(), num, suffix));
                if h.house_type.is_residential() {
                    let generic = format!("{}{}{}", HouseType::House.key_code(), num, suffix);
                    if !keys.contains(&generic) {
                        keys.push(generic);
                    }
                }
            }
            Attributes::Room(r) => {
                if let Some(num) = &r.number {
                    keys.push(format!("{}{}", r.room_type.key_code(), self.compact_key(num)));
                }
            }
            Attributes::Area(_) => {}
        }
        keys
    }

    fn correct(
        &self,
        ctx: &SearchContext,
        item: &ParsedAddressItem,
        node: &mut RepositoryNode,
        stub: &IndexStub,
        ancestor: Option<&RepositoryNode>,
    ) -> bool {
        let mut changed = false;
        for typ in &ctx.types {
            changed |= node.merge_type(typ);
        }
        for guid in registry_links(item) {
            changed |= node.merge_registry_link(&guid);
        }
        if node.parent_ids.is_empty() && stub.parents.is_empty() {
            if let Some(parent) = ancestor {
                let linkable = match (node.level, parent.level) {
                    (Some(child_level), Some(parent_level)) => {
                        can_be_parent(child_level, parent_level)
                    }
                    _ => false,
                };
                if linkable {
                    node.parent_ids.push(parent.id);
                    changed = true;
                }
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AddrLevel, AreaAttributes, HouseAttributes, RegistryEntity, RegistryLevel,
        RoomAttributes, RoomType,
    };

    fn area(level: AddrLevel, name: &str, typ: &str) -> ParsedAddressItem {
        ParsedAddressItem::new(Attributes::Area(AreaAttributes::new(name, typ)), level)
    }

    fn stub(id: u64, level: AddrLevel, type_ids: Vec<u32>, parents: Vec<u64>) -> IndexStub {
        IndexStub {
            id,
            level: Some(level),
            type_ids,
            parents,
        }
    }

    fn context(
        scorer: &ReferenceScorer,
        item: &ParsedAddressItem,
    ) -> (tempfile::TempDir, SearchContext) {
        let dir = tempfile::tempdir().unwrap();
        let mut types = TypeTable::open(dir.path()).unwrap();
        types.intern("улица").unwrap();
        types.intern("город").unwrap();
        let ctx = scorer.build_search_context(item, &types);
        (dir, ctx)
    }

    #[test]
    fn test_context_keys_and_types() {
        let scorer = ReferenceScorer::new();
        let mut item = area(AddrLevel::Street, "Ленина", "ул.");
        let (_dir, ctx) = context(&scorer, &item);
        assert_eq!(ctx.keys, vec!["ЛЕНИНА".to_string()]);
        assert_eq!(ctx.types, vec!["улица".to_string()]);
        assert_eq!(ctx.type_ids, vec![1]);

        if let Attributes::Area(a) = &mut item.attrs {
            a.number = Some("2".to_string());
        }
        let (_dir, ctx) = context(&scorer, &item);
        assert_eq!(ctx.keys, vec!["ЛЕНИНА 2".to_string()]);
    }

    #[test]
    fn test_unknown_type_is_not_interned() {
        let scorer = ReferenceScorer::new();
        let item = area(AddrLevel::Street, "Ленина", "аллея");
        let (_dir, ctx) = context(&scorer, &item);
        assert_eq!(ctx.types, vec!["аллея".to_string()]);
        assert!(ctx.type_ids.is_empty());
    }

    #[test]
    fn test_score_exact_and_parent_hints() {
        let scorer = ReferenceScorer::new();
        let item = area(AddrLevel::Street, "Ленина", "улица");
        let (_dir, ctx) = context(&scorer, &item);
        let city = RepositoryNode::new(3, "город Москва", AddrLevel::City);
        let region = RepositoryNode::new(2, "Московская область", AddrLevel::RegionArea);

        let exact = stub(4, AddrLevel::Street, vec![1], vec![3]);
        assert_eq!(scorer.score(&ctx, &exact, Some(&city), Some(&region)), 0);

        let via_region = stub(5, AddrLevel::Street, vec![1], vec![2]);
        assert_eq!(scorer.score(&ctx, &via_region, Some(&city), Some(&region)), 5);

        let unlinked = stub(6, AddrLevel::Street, vec![1], vec![]);
        assert_eq!(scorer.score(&ctx, &unlinked, Some(&city), None), 30);

        let elsewhere = stub(7, AddrLevel::Street, vec![1], vec![99]);
        assert_eq!(scorer.score(&ctx, &elsewhere, Some(&city), None), REJECT_COST);
    }

    #[test]
    fn test_score_level_and_types() {
        let scorer = ReferenceScorer::new();
        let item = area(AddrLevel::Street, "Ленина", "улица");
        let (_dir, ctx) = context(&scorer, &item);

        let city_stub = stub(3, AddrLevel::City, vec![2], vec![]);
        assert_eq!(scorer.score(&ctx, &city_stub, None, None), REJECT_COST);

        let other_type = stub(4, AddrLevel::Street, vec![2], vec![]);
        assert_eq!(scorer.score(&ctx, &other_type, None, None), 10);

        let untyped = stub(5, AddrLevel::Street, vec![], vec![]);
        assert_eq!(scorer.score(&ctx, &untyped, None, None), 0);

        let root_stub = IndexStub {
            id: 1,
            ..Default::default()
        };
        assert_eq!(scorer.score(&ctx, &root_stub, None, None), REJECT_COST);
    }

    #[test]
    fn test_road_tolerates_territory_level() {
        let scorer = ReferenceScorer::new();
        let mut item = area(AddrLevel::Street, "Минское", "шоссе");
        if let Attributes::Area(a) = &mut item.attrs {
            a.miscs.push("дорога".to_string());
        }
        let (_dir, ctx) = context(&scorer, &item);
        let territory = stub(8, AddrLevel::Territory, vec![], vec![]);
        assert_eq!(scorer.score(&ctx, &territory, None, None), 10);
    }

    #[test]
    fn test_leaf_keys() {
        let scorer = ReferenceScorer::new();

        let mut house = HouseAttributes::house("12а");
        house.building_number = Some("1".to_string());
        let item = ParsedAddressItem::new(Attributes::House(house), AddrLevel::Building);
        assert_eq!(scorer.leaf_search_keys(&item), vec!["Д12АК1".to_string()]);

        let mut estate = HouseAttributes::house("7");
        estate.house_type = HouseType::Estate;
        let item = ParsedAddressItem::new(Attributes::House(estate), AddrLevel::Building);
        assert_eq!(
            scorer.leaf_search_keys(&item),
            vec!["В7".to_string(), "Д7".to_string()]
        );

        let mut garage = HouseAttributes::house("3");
        garage.house_type = HouseType::Garage;
        let item = ParsedAddressItem::new(Attributes::House(garage), AddrLevel::Building);
        assert_eq!(scorer.leaf_search_keys(&item), vec!["Г3".to_string()]);

        let office = RoomAttributes {
            room_type: RoomType::Office,
            number: Some("15".to_string()),
        };
        let item = ParsedAddressItem::new(Attributes::Room(office), AddrLevel::Apartment);
        assert_eq!(scorer.leaf_search_keys(&item), vec!["О15".to_string()]);

        let empty = ParsedAddressItem::new(
            Attributes::House(HouseAttributes::default()),
            AddrLevel::Building,
        );
        assert!(scorer.leaf_search_keys(&empty).is_empty());
    }

    #[test]
    fn test_correct_merges_and_links() {
        let scorer = ReferenceScorer::new();
        let mut item = area(AddrLevel::City, "Москва", "город");
        item.registry_refs.push(RegistryEntity {
            id: "msk".to_string(),
            level: RegistryLevel::City,
            attrs: Attributes::Area(AreaAttributes::new("Москва", "город")),
            parent_ids: Vec::new(),
        });
        let (_dir, ctx) = context(&scorer, &item);

        let region = RepositoryNode::new(2, "Московская область", AddrLevel::RegionArea);
        let mut node = RepositoryNode::new(3, "город Москва", AddrLevel::City);
        let stub = stub(3, AddrLevel::City, vec![], vec![]);

        assert!(scorer.correct(&ctx, &item, &mut node, &stub, Some(&region)));
        assert_eq!(node.types, vec!["город".to_string()]);
        assert_eq!(node.registry_links, vec!["msk".to_string()]);
        assert_eq!(node.parent_ids, vec![2]);

        assert!(!scorer.correct(&ctx, &item, &mut node, &stub, Some(&region)));
    }
}
