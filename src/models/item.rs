//! Parsed address hierarchies handed over by the upstream text analyzer.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{AddrLevel, Attributes, RegistryLevel};

/// Entity of the official address registry, attached to a parsed item
/// upstream. Read-only matching context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntity {
    /// Registry guid
    pub id: String,

    pub level: RegistryLevel,

    pub attrs: Attributes,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parent_ids: Vec<String>,
}

impl fmt::Display for RegistryEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.attrs.to_string())
    }
}

/// One element of a parsed address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedAddressItem {
    pub attrs: Attributes,

    pub level: AddrLevel,

    /// Registry entities already correlated with this item
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub registry_refs: Vec<RegistryEntity>,

    /// Id of the repository node this item resolved to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_node: Option<u64>,
}

impl ParsedAddressItem {
    pub fn new(attrs: Attributes, level: AddrLevel) -> Self {
        Self {
            attrs,
            level,
            registry_refs: Vec::new(),
            resolved_node: None,
        }
    }

    /// Canonical display string, used as the spelling of created nodes
    pub fn spelling(&self) -> String {
        self.attrs.to_string_at(Some(self.level))
    }
}

impl fmt::Display for ParsedAddressItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.spelling())
    }
}

/// Role of an item inside a hierarchy during resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemRole {
    Area,
    Plot,
    House,
    Room,
}

impl ParsedAddressItem {
    pub fn role(&self) -> ItemRole {
        match &self.attrs {
            Attributes::Area(_) => ItemRole::Area,
            Attributes::House(_) if self.level == AddrLevel::Plot => ItemRole::Plot,
            Attributes::House(_) => ItemRole::House,
            Attributes::Room(_) => ItemRole::Room,
        }
    }
}

/// A single postal address, broadest item first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedAddressHierarchy {
    pub items: Vec<ParsedAddressItem>,
}

impl ParsedAddressHierarchy {
    pub fn new(items: Vec<ParsedAddressItem>) -> Self {
        Self { items }
    }

    /// Resolved node ids, in item order
    pub fn resolved_ids(&self) -> Vec<Option<u64>> {
        self.items.iter().map(|it| it.resolved_node).collect()
    }

    pub fn clear_resolution(&mut self) {
        for it in &mut self.items {
            it.resolved_node = None;
        }
    }
}

impl fmt::Display for ParsedAddressHierarchy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.items.iter().map(|it| it.spelling()).collect();
        f.write_str(&parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AreaAttributes, HouseAttributes, RoomAttributes};

    #[test]
    fn test_roles() {
        let area = ParsedAddressItem::new(
            Attributes::Area(AreaAttributes::new("Москва", "город")),
            AddrLevel::City,
        );
        let plot = ParsedAddressItem::new(
            Attributes::House(HouseAttributes::house("3")),
            AddrLevel::Plot,
        );
        let house = ParsedAddressItem::new(
            Attributes::House(HouseAttributes::house("3")),
            AddrLevel::Building,
        );
        let room = ParsedAddressItem::new(
            Attributes::Room(RoomAttributes::flat("1")),
            AddrLevel::Apartment,
        );
        assert_eq!(area.role(), ItemRole::Area);
        assert_eq!(plot.role(), ItemRole::Plot);
        assert_eq!(house.role(), ItemRole::House);
        assert_eq!(room.role(), ItemRole::Room);
    }

    #[test]
    fn test_hierarchy_from_json() {
        let json = r#"{"items":[
            {"attrs":{"kind":"area","names":["Москва"],"types":["город"]},"level":"city"},
            {"attrs":{"kind":"area","names":["Ленина"],"types":["улица"]},"level":"street"},
            {"attrs":{"kind":"house","house_type":"house","number":"12"},"level":"building"}
        ]}"#;
        let h: ParsedAddressHierarchy = serde_json::from_str(json).unwrap();
        assert_eq!(h.items.len(), 3);
        assert_eq!(h.to_string(), "город Москва, улица Ленина, д. 12");
        assert_eq!(h.resolved_ids(), vec![None, None, None]);
    }
}
