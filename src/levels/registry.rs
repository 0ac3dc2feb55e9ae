//! Decision table deciding whether a text item and a registry entity may
//! denote the same real object although their level enumerations differ.

use crate::models::{AddrLevel, ParsedAddressItem, RegistryEntity, RegistryLevel};

use super::{can_be_equal_levels, ROAD_TAG};

/// Rule of the decision table that admitted a (text, registry) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistryMatchRule {
    /// Locality/area or territory/locality/street sharing a misc tag
    SharedMisc,
    /// Text road tagged "дорога" against a registry street or area
    RoadTag,
    /// Locality/area or territory/locality/street sharing a head type
    SharedType,
    /// Text locality against a registry microdistrict area
    MicrodistrictArea,
    /// Registry area display contains the text's head type
    AreaDisplayContainsType,
    /// Text territory tagged as a collective farm against a registry locality
    CollectiveFarm,
    /// Text microdistrict territory against a registry street named as one
    MicrodistrictStreet,
    /// Text city against a registry municipal/admin area typed "город"
    CityAsMunicipality,
    /// Text district against a registry settlement mentioning "район"
    DistrictAsSettlement,
    /// Plain level table
    LevelTable,
    LocalityAsSettlement,
    SettlementAsLocality,
    /// Text district typed "улус" against a registry locality
    UlusAsLocality,
    /// Text city district against a registry entity whose head type is a district
    CityDistrictByType,
    /// Text street typed only "улица" against a registry area
    StreetAsArea,
    /// Text settlement/locality against a registry city that is a township
    SettlementOrLocalityAsCity,
    /// Text city not typed "город" against a registry locality
    CityAsLocality,
}

/// Returns the first rule admitting the pair, or `None`
pub fn registry_match_rule(
    item: &ParsedAddressItem,
    reg: &RegistryEntity,
) -> Option<RegistryMatchRule> {
    use AddrLevel as A;
    use RegistryLevel as G;
    use RegistryMatchRule as R;

    let a_types = item.attrs.types();
    let g_types = reg.attrs.types();
    let text = item.level;
    let level = reg.level;

    let grouped = matches!(
        (text, level),
        (A::Locality, G::Area) | (A::Territory, G::Locality) | (A::Territory, G::Street)
    );
    if grouped {
        return grouped_rule(item, reg);
    }

    if text == A::City
        && matches!(level, G::MunicipalArea | G::AdminArea)
        && g_types.iter().any(|t| t == "город")
    {
        return Some(R::CityAsMunicipality);
    }
    if text == A::District
        && level == G::Settlement
        && (g_types.iter().any(|t| t.contains("район"))
            || reg.attrs.names().iter().any(|n| n.contains("район")))
    {
        return Some(R::DistrictAsSettlement);
    }
    if can_be_equal_levels(text, level) {
        return Some(R::LevelTable);
    }
    if text == A::Locality && level == G::Settlement {
        return Some(R::LocalityAsSettlement);
    }
    if text == A::Settlement && level == G::Locality {
        return Some(R::SettlementAsLocality);
    }
    if text == A::District && level == G::Locality && a_types.iter().any(|t| t == "улус") {
        return Some(R::UlusAsLocality);
    }
    if text == A::CityDistrict && g_types.first().is_some_and(|t| t.contains("район")) {
        return Some(R::CityDistrictByType);
    }
    if text == A::Street && level == G::Area && a_types.len() == 1 && a_types[0] == "улица" {
        return Some(R::StreetAsArea);
    }
    if matches!(text, A::Settlement | A::Locality) && level == G::City {
        let township = reg.to_string().contains("поселок")
            || item.spelling().contains("поселок")
            || a_types.iter().any(|t| g_types.contains(t));
        if township {
            return Some(R::SettlementOrLocalityAsCity);
        }
    }
    if text == A::City && level == G::Locality && !a_types.iter().any(|t| t == "город") {
        return Some(R::CityAsLocality);
    }
    None
}

/// Locality vs area and territory vs locality/street: decided by lexical
/// overlap only, the level table is not consulted
fn grouped_rule(item: &ParsedAddressItem, reg: &RegistryEntity) -> Option<RegistryMatchRule> {
    use AddrLevel as A;
    use RegistryLevel as G;
    use RegistryMatchRule as R;

    let a_types = item.attrs.types();
    let g_types = reg.attrs.types();
    let g_miscs = reg.attrs.miscs();

    for mi in item.attrs.miscs() {
        if g_miscs.contains(mi) {
            return Some(R::SharedMisc);
        }
        if mi == ROAD_TAG && matches!(reg.level, G::Street | G::Area) {
            return Some(R::RoadTag);
        }
    }
    if a_types.iter().any(|t| g_types.contains(t)) {
        return Some(R::SharedType);
    }
    match (item.level, reg.level) {
        (A::Locality, G::Area) => {
            if g_types.iter().any(|t| t == "микрорайон") {
                return Some(R::MicrodistrictArea);
            }
            if let Some(t) = a_types.first() {
                if reg.to_string().to_lowercase().contains(t.as_str()) {
                    return Some(R::AreaDisplayContainsType);
                }
            }
        }
        (A::Territory, G::Locality) => {
            if item
                .attrs
                .miscs()
                .iter()
                .any(|m| m == "совхоз" || m == "колхоз")
            {
                return Some(R::CollectiveFarm);
            }
        }
        (A::Territory, G::Street) => {
            if a_types.iter().any(|t| t == "микрорайон")
                && reg.to_string().to_uppercase().contains("МИКРОРАЙОН")
            {
                return Some(R::MicrodistrictStreet);
            }
        }
        _ => {}
    }
    None
}

/// Can a text item and a registry entity denote the same object
pub fn can_be_equals_registry_level(item: &ParsedAddressItem, reg: &RegistryEntity) -> bool {
    registry_match_rule(item, reg).is_some()
}
