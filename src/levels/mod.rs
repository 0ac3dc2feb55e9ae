//! Level compatibility rules.
//!
//! Pure, total predicates over [`AddrLevel`] and [`RegistryLevel`]: which
//! level may directly parent which, and which text level may denote the same
//! object as a registry level. Unknown pairs are simply incompatible.

mod registry;

pub use registry::{can_be_equals_registry_level, registry_match_rule, RegistryMatchRule};

use std::cmp::Ordering;
use std::sync::LazyLock;

use crate::matching::Normalizer;
use crate::models::{
    AddrLevel, Attributes, HouseType, ParsedAddressHierarchy, ParsedAddressItem, RegistryLevel,
};

/// Misc tag marking roads that may be classified either as streets or as
/// territories
pub const ROAD_TAG: &str = "дорога";

/// Type marking kilometer posts along a road
pub const KILOMETER_TYPE: &str = "километр";

static TYPE_NORMALIZER: LazyLock<Normalizer> = LazyLock::new(Normalizer::new);

/// Ordinal comparison by rank
pub fn compare_levels(a: AddrLevel, b: AddrLevel) -> Ordering {
    a.rank().cmp(&b.rank())
}

/// Can `parent` be the direct parent of `child`
pub fn can_be_parent(child: AddrLevel, parent: AddrLevel) -> bool {
    use AddrLevel::*;
    match child {
        Country => false,
        RegionCity | RegionArea => parent == Country,
        District => matches!(parent, Country | RegionCity | RegionArea | District),
        Settlement => matches!(parent, RegionCity | RegionArea | District),
        City => matches!(parent, Country | RegionCity | RegionArea | District | Settlement),
        CityDistrict => parent == City,
        Locality => matches!(
            parent,
            District | Settlement | City | RegionCity | CityDistrict | Locality
        ),
        Territory => matches!(
            parent,
            RegionCity | Locality | City | District | CityDistrict | Settlement | Territory
        ),
        Street => matches!(
            parent,
            RegionCity | Locality | City | Territory | CityDistrict | District | Street
        ),
        Building | Plot => match parent {
            Locality | Territory | Street => true,
            City | Plot => child == Building,
            _ => false,
        },
        Apartment => parent == Building,
        Room => matches!(parent, Apartment | Building),
    }
}

/// Can a text level and a registry level denote the same object
pub fn can_be_equal_levels(text: AddrLevel, registry: RegistryLevel) -> bool {
    use AddrLevel as A;
    use RegistryLevel as G;
    match text {
        A::Country => false,
        A::RegionCity | A::RegionArea => registry == G::Region,
        A::District => matches!(registry, G::MunicipalArea | G::AdminArea),
        A::Settlement => registry == G::Settlement,
        A::City => registry == G::City,
        A::CityDistrict => false,
        A::Locality => matches!(registry, G::Locality | G::Area | G::AdminArea),
        A::Territory => matches!(registry, G::Area | G::District),
        A::Street => registry == G::Street,
        A::Plot => registry == G::Plot,
        A::Building => registry == G::Building,
        A::Apartment | A::Room => registry == G::Room,
    }
}

/// Can two text items denote the same object despite a level mismatch:
/// roads are classified as streets or as territories interchangeably.
pub fn can_be_equals_level(a: &ParsedAddressItem, b: &ParsedAddressItem) -> bool {
    levels_equal_modulo_road(a.level, b.level, a.attrs.miscs(), b.attrs.miscs())
}

/// Level form of [`can_be_equals_level`], the misc tags belong to the item
/// at the territory level
pub fn levels_equal_modulo_road(
    a: AddrLevel,
    b: AddrLevel,
    a_miscs: &[String],
    b_miscs: &[String],
) -> bool {
    if a == b {
        return true;
    }
    match (a, b) {
        (AddrLevel::Street, AddrLevel::Territory) => b_miscs.iter().any(|m| m == ROAD_TAG),
        (AddrLevel::Territory, AddrLevel::Street) => a_miscs.iter().any(|m| m == ROAD_TAG),
        _ => false,
    }
}

/// Attribute-aware parent check for two parsed items.
///
/// Besides the level table this admits a garage inside a non-garage building,
/// a numbered city inside the equally named plain city, and nested kilometer
/// posts. A street or territory directly under a district needs a city-like
/// grandparent.
pub fn can_be_parent_for(
    parent: &ParsedAddressItem,
    child: &ParsedAddressItem,
    grand_parent: Option<&ParsedAddressItem>,
) -> bool {
    if !can_be_parent(child.level, parent.level) {
        return lexical_nesting_exception(parent, child);
    }
    if matches!(child.level, AddrLevel::Street | AddrLevel::Territory)
        && parent.level == AddrLevel::District
    {
        return grand_parent.is_some_and(|gp| {
            matches!(
                gp.level,
                AddrLevel::City | AddrLevel::RegionCity | AddrLevel::RegionArea
            )
        });
    }
    true
}

fn lexical_nesting_exception(parent: &ParsedAddressItem, child: &ParsedAddressItem) -> bool {
    match (parent.level, child.level) {
        (AddrLevel::Building, AddrLevel::Building) => {
            let typ = |it: &ParsedAddressItem| it.attrs.as_house().map(|h| h.house_type);
            typ(child) == Some(HouseType::Garage) && typ(parent) != Some(HouseType::Garage)
        }
        (AddrLevel::City, AddrLevel::City) => match (&parent.attrs, &child.attrs) {
            (Attributes::Area(pa), Attributes::Area(ca)) => {
                pa.names.first().is_some_and(|n| ca.names.contains(n))
                    && pa.number.is_none()
                    && ca.number.is_some()
            }
            _ => false,
        },
        (AddrLevel::Street, AddrLevel::Street) => {
            is_kilometer_post(child) || is_kilometer_post(parent)
        }
        _ => false,
    }
}

/// Any head type of `item` canonicalizes to [`KILOMETER_TYPE`] ("км", "км.")
fn is_kilometer_post(item: &ParsedAddressItem) -> bool {
    item.attrs
        .types()
        .iter()
        .any(|t| TYPE_NORMALIZER.canonical_type(t) == KILOMETER_TYPE)
}

/// Pair of consecutive area items that cannot nest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructureIssue {
    pub parent_index: usize,
    pub child_index: usize,
}

/// Check every consecutive pair of area items with [`can_be_parent_for`]
pub fn check_structure(hierarchy: &ParsedAddressHierarchy) -> Vec<StructureIssue> {
    let area: Vec<(usize, &ParsedAddressItem)> = hierarchy
        .items
        .iter()
        .enumerate()
        .filter(|(_, it)| it.attrs.as_area().is_some())
        .collect();

    area.windows(2)
        .enumerate()
        .filter_map(|(k, pair)| {
            let (pi, parent) = pair[0];
            let (ci, child) = pair[1];
            let grand_parent = if k > 0 { Some(area[k - 1].1) } else { None };
            if can_be_parent_for(parent, child, grand_parent) {
                None
            } else {
                Some(StructureIssue {
                    parent_index: pi,
                    child_index: ci,
                })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AreaAttributes, HouseAttributes};

    fn area(level: AddrLevel, name: &str, typ: &str) -> ParsedAddressItem {
        ParsedAddressItem::new(Attributes::Area(AreaAttributes::new(name, typ)), level)
    }

    fn house(level: AddrLevel, typ: HouseType) -> ParsedAddressItem {
        let mut h = HouseAttributes::house("1");
        h.house_type = typ;
        ParsedAddressItem::new(Attributes::House(h), level)
    }

    #[test]
    fn test_compare_levels_total_order() {
        let all = AddrLevel::all();
        for &a in all {
            assert_eq!(compare_levels(a, a), Ordering::Equal);
            for &b in all {
                assert_eq!(compare_levels(a, b), compare_levels(b, a).reverse());
                for &c in all {
                    if compare_levels(a, b) == Ordering::Less
                        && compare_levels(b, c) == Ordering::Less
                    {
                        assert_eq!(compare_levels(a, c), Ordering::Less);
                    }
                }
            }
        }
    }

    #[test]
    fn test_can_be_parent_full_table() {
        use AddrLevel::*;
        let expected: &[(AddrLevel, &[AddrLevel])] = &[
            (Country, &[]),
            (RegionArea, &[Country]),
            (RegionCity, &[Country]),
            (District, &[Country, RegionArea, RegionCity, District]),
            (Settlement, &[RegionArea, RegionCity, District]),
            (City, &[Country, RegionArea, RegionCity, District, Settlement]),
            (CityDistrict, &[City]),
            (
                Locality,
                &[RegionCity, District, Settlement, City, CityDistrict, Locality],
            ),
            (
                Territory,
                &[RegionCity, District, Settlement, City, CityDistrict, Locality, Territory],
            ),
            (
                Street,
                &[RegionCity, District, City, CityDistrict, Locality, Territory, Street],
            ),
            (Plot, &[Locality, Territory, Street]),
            (Building, &[City, Locality, Territory, Street, Plot]),
            (Apartment, &[Building]),
            (Room, &[Building, Apartment]),
        ];
        for (child, parents) in expected {
            for &parent in AddrLevel::all() {
                assert_eq!(
                    can_be_parent(*child, parent),
                    parents.contains(&parent),
                    "{} under {}",
                    child,
                    parent
                );
            }
        }
    }

    #[test]
    fn test_parent_is_never_more_specific() {
        for &child in AddrLevel::all() {
            for &parent in AddrLevel::all() {
                if can_be_parent(child, parent) {
                    assert_ne!(compare_levels(parent, child), Ordering::Greater);
                }
            }
        }
    }

    #[test]
    fn test_can_be_equal_levels() {
        use AddrLevel as A;
        use RegistryLevel as G;
        assert!(!can_be_equal_levels(A::Country, G::Region));
        assert!(can_be_equal_levels(A::RegionCity, G::Region));
        assert!(can_be_equal_levels(A::RegionArea, G::Region));
        assert!(can_be_equal_levels(A::District, G::MunicipalArea));
        assert!(can_be_equal_levels(A::District, G::AdminArea));
        assert!(can_be_equal_levels(A::Settlement, G::Settlement));
        assert!(can_be_equal_levels(A::City, G::City));
        assert!(can_be_equal_levels(A::Locality, G::Locality));
        assert!(can_be_equal_levels(A::Locality, G::Area));
        assert!(can_be_equal_levels(A::Locality, G::AdminArea));
        assert!(can_be_equal_levels(A::Territory, G::District));
        assert!(can_be_equal_levels(A::Street, G::Street));
        assert!(can_be_equal_levels(A::Apartment, G::Room));
        assert!(can_be_equal_levels(A::Room, G::Room));
        assert!(!can_be_equal_levels(A::Room, G::Carplace));
        assert!(!can_be_equal_levels(A::CityDistrict, G::District));
    }

    #[test]
    fn test_road_equivalence() {
        let street = area(AddrLevel::Street, "Московское", "шоссе");
        let mut road = area(AddrLevel::Territory, "Московское", "шоссе");
        assert!(!can_be_equals_level(&street, &road));
        if let Attributes::Area(a) = &mut road.attrs {
            a.miscs.push(ROAD_TAG.to_string());
        }
        assert!(can_be_equals_level(&street, &road));
        assert!(can_be_equals_level(&road, &street));
    }

    #[test]
    fn test_garage_inside_building() {
        let building = house(AddrLevel::Building, HouseType::House);
        let garage = house(AddrLevel::Building, HouseType::Garage);
        assert!(can_be_parent_for(&building, &garage, None));
        assert!(!can_be_parent_for(&garage, &building, None));
        assert!(!can_be_parent_for(&garage, &garage, None));
    }

    #[test]
    fn test_numbered_city_inside_plain_city() {
        let plain = area(AddrLevel::City, "Сочи", "город");
        let mut numbered = area(AddrLevel::City, "Сочи", "город");
        if let Attributes::Area(a) = &mut numbered.attrs {
            a.number = Some("2".to_string());
        }
        assert!(can_be_parent_for(&plain, &numbered, None));
        assert!(!can_be_parent_for(&numbered, &plain, None));
    }

    #[test]
    fn test_kilometer_post_streets() {
        let road = area(AddrLevel::Street, "Каширское", "шоссе");
        let km = area(AddrLevel::Street, "25", KILOMETER_TYPE);
        assert!(can_be_parent_for(&road, &km, None));
    }

    #[test]
    fn test_kilometer_post_abbreviations() {
        assert!(is_kilometer_post(&area(AddrLevel::Street, "25", "км")));
        assert!(is_kilometer_post(&area(AddrLevel::Street, "25", "км.")));
        assert!(is_kilometer_post(&area(AddrLevel::Street, "25", "Километр")));
        assert!(!is_kilometer_post(&area(AddrLevel::Street, "Каширское", "шоссе")));
        assert!(!is_kilometer_post(&area(AddrLevel::Street, "Мира", "")));
    }

    #[test]
    fn test_street_under_district_needs_city_grandparent() {
        let district = area(AddrLevel::District, "Ленинский", "район");
        let street = area(AddrLevel::Street, "Мира", "улица");
        let city = area(AddrLevel::City, "Томск", "город");
        let locality = area(AddrLevel::Locality, "Заречье", "деревня");
        assert!(!can_be_parent_for(&district, &street, None));
        assert!(!can_be_parent_for(&district, &street, Some(&locality)));
        assert!(can_be_parent_for(&district, &street, Some(&city)));
    }

    #[test]
    fn test_check_structure_reports_bad_pairs() {
        let h = ParsedAddressHierarchy::new(vec![
            area(AddrLevel::RegionArea, "Томская область", "область"),
            area(AddrLevel::CityDistrict, "Кировский", "район"),
            area(AddrLevel::Street, "Мира", "улица"),
        ]);
        let issues = check_structure(&h);
        assert_eq!(
            issues,
            vec![StructureIssue {
                parent_index: 0,
                child_index: 1
            }]
        );
    }
}
