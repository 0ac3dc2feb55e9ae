//! Level enumerations for text-extracted entities and for the official
//! address registry.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Level of an address entity extracted from free text.
///
/// Declaration order follows the rank order, so the derived `Ord` agrees with
/// [`AddrLevel::rank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AddrLevel {
    /// Country
    Country,
    /// Region that is an area (oblast, krai, republic)
    RegionArea,
    /// City with region status (Moscow, St. Petersburg, Sevastopol)
    RegionCity,
    /// Municipal or administrative district
    District,
    /// Rural or urban settlement
    Settlement,
    /// City or town
    City,
    /// District inside a city
    CityDistrict,
    /// Village, hamlet or other locality
    Locality,
    /// Planning structure element (microdistrict, gardening partnership, ...)
    Territory,
    /// Street network element
    Street,
    /// Land plot
    Plot,
    /// Building or structure
    Building,
    /// Apartment or premises
    Apartment,
    /// Room inside an apartment
    Room,
}

impl AddrLevel {
    /// Numeric rank used for ordering, country first
    pub fn rank(&self) -> u8 {
        match self {
            AddrLevel::Country => 1,
            AddrLevel::RegionArea => 2,
            AddrLevel::RegionCity => 3,
            AddrLevel::District => 4,
            AddrLevel::Settlement => 5,
            AddrLevel::City => 6,
            AddrLevel::CityDistrict => 7,
            AddrLevel::Locality => 8,
            AddrLevel::Territory => 9,
            AddrLevel::Street => 10,
            AddrLevel::Plot => 11,
            AddrLevel::Building => 12,
            AddrLevel::Apartment => 13,
            AddrLevel::Room => 14,
        }
    }

    /// Inverse of [`AddrLevel::rank`]
    pub fn from_rank(rank: u8) -> Option<Self> {
        Self::all().iter().copied().find(|l| l.rank() == rank)
    }

    /// Get all levels in hierarchical order (country first)
    pub fn all() -> &'static [AddrLevel] {
        &[
            AddrLevel::Country,
            AddrLevel::RegionArea,
            AddrLevel::RegionCity,
            AddrLevel::District,
            AddrLevel::Settlement,
            AddrLevel::City,
            AddrLevel::CityDistrict,
            AddrLevel::Locality,
            AddrLevel::Territory,
            AddrLevel::Street,
            AddrLevel::Plot,
            AddrLevel::Building,
            AddrLevel::Apartment,
            AddrLevel::Room,
        ]
    }

    /// Stable identifier, identical to the serde representation
    pub fn field_name(&self) -> &'static str {
        match self {
            AddrLevel::Country => "country",
            AddrLevel::RegionArea => "region_area",
            AddrLevel::RegionCity => "region_city",
            AddrLevel::District => "district",
            AddrLevel::Settlement => "settlement",
            AddrLevel::City => "city",
            AddrLevel::CityDistrict => "city_district",
            AddrLevel::Locality => "locality",
            AddrLevel::Territory => "territory",
            AddrLevel::Street => "street",
            AddrLevel::Plot => "plot",
            AddrLevel::Building => "building",
            AddrLevel::Apartment => "apartment",
            AddrLevel::Room => "room",
        }
    }

    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            AddrLevel::Country => "страна",
            AddrLevel::RegionArea => "регион",
            AddrLevel::RegionCity => "город-регион",
            AddrLevel::District => "район",
            AddrLevel::Settlement => "поселение",
            AddrLevel::City => "город",
            AddrLevel::CityDistrict => "городской район",
            AddrLevel::Locality => "населенный пункт",
            AddrLevel::Territory => "элемент планировочной структуры",
            AddrLevel::Street => "элемент улично-дорожной сети",
            AddrLevel::Plot => "земельный участок",
            AddrLevel::Building => "здание (сооружение)",
            AddrLevel::Apartment => "помещение",
            AddrLevel::Room => "комната",
        }
    }

    /// Levels a hierarchy may start with
    pub fn is_admissible_root(&self) -> bool {
        matches!(
            self,
            AddrLevel::Country | AddrLevel::RegionCity | AddrLevel::RegionArea | AddrLevel::City
        )
    }

    /// Levels resolved through the per-parent partitions rather than the
    /// global candidate index
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            AddrLevel::Plot | AddrLevel::Building | AddrLevel::Apartment | AddrLevel::Room
        )
    }
}

impl fmt::Display for AddrLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// Level of an entity in the official address registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RegistryLevel {
    Region,
    AdminArea,
    MunicipalArea,
    Settlement,
    City,
    Locality,
    District,
    Area,
    Street,
    Plot,
    Building,
    Room,
    Carplace,
}

impl RegistryLevel {
    pub fn rank(&self) -> u8 {
        match self {
            RegistryLevel::Region => 1,
            RegistryLevel::AdminArea => 2,
            RegistryLevel::MunicipalArea => 3,
            RegistryLevel::Settlement => 4,
            RegistryLevel::City => 5,
            RegistryLevel::Locality => 6,
            RegistryLevel::District => 7,
            RegistryLevel::Area => 8,
            RegistryLevel::Street => 9,
            RegistryLevel::Plot => 10,
            RegistryLevel::Building => 11,
            RegistryLevel::Room => 12,
            RegistryLevel::Carplace => 13,
        }
    }

    pub fn all() -> &'static [RegistryLevel] {
        &[
            RegistryLevel::Region,
            RegistryLevel::AdminArea,
            RegistryLevel::MunicipalArea,
            RegistryLevel::Settlement,
            RegistryLevel::City,
            RegistryLevel::Locality,
            RegistryLevel::District,
            RegistryLevel::Area,
            RegistryLevel::Street,
            RegistryLevel::Plot,
            RegistryLevel::Building,
            RegistryLevel::Room,
            RegistryLevel::Carplace,
        ]
    }

    pub fn field_name(&self) -> &'static str {
        match self {
            RegistryLevel::Region => "region",
            RegistryLevel::AdminArea => "admin_area",
            RegistryLevel::MunicipalArea => "municipal_area",
            RegistryLevel::Settlement => "settlement",
            RegistryLevel::City => "city",
            RegistryLevel::Locality => "locality",
            RegistryLevel::District => "district",
            RegistryLevel::Area => "area",
            RegistryLevel::Street => "street",
            RegistryLevel::Plot => "plot",
            RegistryLevel::Building => "building",
            RegistryLevel::Room => "room",
            RegistryLevel::Carplace => "carplace",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RegistryLevel::Region => "регион",
            RegistryLevel::AdminArea => "административный район",
            RegistryLevel::MunicipalArea => "муниципальный район",
            RegistryLevel::Settlement => "сельское/городское поселение",
            RegistryLevel::City => "город",
            RegistryLevel::Locality => "населенный пункт",
            RegistryLevel::District => "район города",
            RegistryLevel::Area => "элемент планировочной структуры",
            RegistryLevel::Street => "элемент улично-дорожной сети",
            RegistryLevel::Plot => "земельный участок",
            RegistryLevel::Building => "здание (сооружение)",
            RegistryLevel::Room => "помещение",
            RegistryLevel::Carplace => "машино-место",
        }
    }
}

impl fmt::Display for RegistryLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_matches_declaration_order() {
        for pair in AddrLevel::all().windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].rank() < pair[1].rank());
        }
        for pair in RegistryLevel::all().windows(2) {
            assert!(pair[0].rank() < pair[1].rank());
        }
    }

    #[test]
    fn test_from_rank_roundtrip() {
        for level in AddrLevel::all() {
            assert_eq!(AddrLevel::from_rank(level.rank()), Some(*level));
        }
        assert_eq!(AddrLevel::from_rank(0), None);
        assert_eq!(AddrLevel::from_rank(15), None);
    }

    #[test]
    fn test_field_name_matches_serde() {
        for level in AddrLevel::all() {
            let json = serde_json::to_string(level).unwrap();
            assert_eq!(json, format!("\"{}\"", level.field_name()));
        }
        for level in RegistryLevel::all() {
            let json = serde_json::to_string(level).unwrap();
            assert_eq!(json, format!("\"{}\"", level.field_name()));
        }
    }

    #[test]
    fn test_admissible_roots() {
        let roots: Vec<AddrLevel> = AddrLevel::all()
            .iter()
            .copied()
            .filter(AddrLevel::is_admissible_root)
            .collect();
        assert_eq!(
            roots,
            vec![
                AddrLevel::Country,
                AddrLevel::RegionArea,
                AddrLevel::RegionCity,
                AddrLevel::City
            ]
        );
    }
}
