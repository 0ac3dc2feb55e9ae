//! Attribute payloads carried by parsed address items and registry entities.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::AddrLevel;

/// Kind of a house-level entity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HouseType {
    #[default]
    Undefined,
    House,
    Estate,
    HouseEstate,
    Plot,
    Garage,
    Special,
    Well,
}

impl HouseType {
    /// Display prefix, short or full form
    pub fn label(&self, short: bool) -> &'static str {
        match self {
            HouseType::Estate => if short { "влад." } else { "владение" },
            HouseType::HouseEstate => if short { "дмвлд." } else { "домовладение" },
            HouseType::House => if short { "д." } else { "дом" },
            HouseType::Plot => if short { "уч." } else { "участок" },
            HouseType::Garage => if short { "гар." } else { "гараж" },
            HouseType::Special => if short { "" } else { "специальное строение" },
            HouseType::Well => if short { "скваж." } else { "скважина" },
            HouseType::Undefined => "",
        }
    }

    /// Single-letter code used in leaf search keys
    pub fn key_code(&self) -> char {
        match self {
            HouseType::Undefined | HouseType::House => 'Д',
            HouseType::Estate => 'В',
            HouseType::HouseEstate => 'М',
            HouseType::Plot => 'У',
            HouseType::Garage => 'Г',
            HouseType::Special => 'С',
            HouseType::Well => 'К',
        }
    }

    /// House, estate and house-estate are interchangeable in practice
    pub fn is_residential(&self) -> bool {
        matches!(
            self,
            HouseType::Undefined | HouseType::House | HouseType::Estate | HouseType::HouseEstate
        )
    }
}

/// Kind of a room-level entity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomType {
    #[default]
    Undefined,
    Flat,
    Office,
    Room,
    Pavilion,
    Pantry,
    Carplace,
}

impl RoomType {
    pub fn label(&self, short: bool) -> &'static str {
        match self {
            RoomType::Flat | RoomType::Undefined => if short { "кв." } else { "квартира" },
            RoomType::Office => if short { "оф." } else { "офис" },
            RoomType::Room => if short { "комн." } else { "комната" },
            RoomType::Pavilion => if short { "пав." } else { "павильон" },
            RoomType::Pantry => if short { "кладов." } else { "кладовка" },
            RoomType::Carplace => if short { "маш.м." } else { "машиноместо" },
        }
    }

    pub fn key_code(&self) -> char {
        match self {
            RoomType::Flat | RoomType::Undefined => 'К',
            RoomType::Office => 'О',
            RoomType::Room => 'Н',
            RoomType::Pavilion => 'П',
            RoomType::Pantry => 'Л',
            RoomType::Carplace => 'М',
        }
    }
}

/// Attributes of an area-scale entity (region ... street)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaAttributes {
    /// Proper names, the first one is canonical
    #[serde(default)]
    pub names: Vec<String>,

    /// Distinguishing number ("2-я Парковая", "Москва 3")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,

    /// Lexical head types, lower case ("улица", "город")
    #[serde(default)]
    pub types: Vec<String>,

    /// Additional tags ("дорога", "совхоз")
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub miscs: Vec<String>,
}

impl AreaAttributes {
    pub fn new(name: &str, typ: &str) -> Self {
        Self {
            names: vec![name.to_string()],
            types: if typ.is_empty() {
                Vec::new()
            } else {
                vec![typ.to_string()]
            },
            ..Default::default()
        }
    }

    /// Display string with the head type placed before or after the name
    pub fn to_string_at(&self, level: Option<AddrLevel>) -> String {
        let name = self.names.first().map(String::as_str).unwrap_or("?");
        let mut res = String::new();
        let typ = self.types.first().map(String::as_str);
        // Regions name their type after the proper name ("Московская область")
        let type_after = matches!(level, Some(AddrLevel::RegionArea) | Some(AddrLevel::District))
            || typ.is_some_and(|t| name.to_lowercase().contains(t));
        if let (Some(t), false) = (typ, type_after) {
            res.push_str(t);
            res.push(' ');
        }
        res.push_str(name);
        if let Some(num) = &self.number {
            res.push(' ');
            res.push_str(num);
        }
        if let (Some(t), true) = (typ, type_after) {
            if !name.to_lowercase().contains(t) {
                res.push(' ');
                res.push_str(t);
            }
        }
        res
    }
}

impl fmt::Display for AreaAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_at(None))
    }
}

/// Attributes of a house or a land plot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseAttributes {
    #[serde(default)]
    pub house_type: HouseType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,

    /// Корпус
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_number: Option<String>,

    /// Строение
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure_number: Option<String>,
}

impl HouseAttributes {
    pub fn house(number: &str) -> Self {
        Self {
            house_type: HouseType::House,
            number: Some(number.to_string()),
            ..Default::default()
        }
    }
}

impl fmt::Display for HouseAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        if let Some(num) = &self.number {
            let label = self.house_type.label(true);
            if label.is_empty() {
                parts.push(num.clone());
            } else {
                parts.push(format!("{} {}", label, num));
            }
        }
        if let Some(num) = &self.building_number {
            parts.push(format!("корп. {}", num));
        }
        if let Some(num) = &self.structure_number {
            parts.push(format!("стр. {}", num));
        }
        if parts.is_empty() {
            return f.write_str("?");
        }
        f.write_str(&parts.join(" "))
    }
}

/// Attributes of an apartment, office or room
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomAttributes {
    #[serde(default)]
    pub room_type: RoomType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
}

impl RoomAttributes {
    pub fn flat(number: &str) -> Self {
        Self {
            room_type: RoomType::Flat,
            number: Some(number.to_string()),
        }
    }
}

impl fmt::Display for RoomAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.number {
            Some(num) => write!(f, "{} {}", self.room_type.label(true), num),
            None => f.write_str("?"),
        }
    }
}

/// Attribute payload, one variant per attribute kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Attributes {
    Area(AreaAttributes),
    House(HouseAttributes),
    Room(RoomAttributes),
}

impl Attributes {
    pub fn as_area(&self) -> Option<&AreaAttributes> {
        match self {
            Attributes::Area(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_house(&self) -> Option<&HouseAttributes> {
        match self {
            Attributes::House(h) => Some(h),
            _ => None,
        }
    }

    /// Lexical types of an area payload, empty for other kinds
    pub fn types(&self) -> &[String] {
        match self {
            Attributes::Area(a) => &a.types,
            _ => &[],
        }
    }

    /// Misc tags of an area payload, empty for other kinds
    pub fn miscs(&self) -> &[String] {
        match self {
            Attributes::Area(a) => &a.miscs,
            _ => &[],
        }
    }

    /// Proper names of an area payload, empty for other kinds
    pub fn names(&self) -> &[String] {
        match self {
            Attributes::Area(a) => &a.names,
            _ => &[],
        }
    }

    pub fn to_string_at(&self, level: Option<AddrLevel>) -> String {
        match self {
            Attributes::Area(a) => a.to_string_at(level),
            Attributes::House(h) => h.to_string(),
            Attributes::Room(r) => r.to_string(),
        }
    }
}

impl fmt::Display for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_at(None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_display_type_before_name() {
        let a = AreaAttributes::new("Ленина", "улица");
        assert_eq!(a.to_string_at(Some(AddrLevel::Street)), "улица Ленина");
    }

    #[test]
    fn test_area_display_type_contained_in_name() {
        let a = AreaAttributes::new("Московская область", "область");
        assert_eq!(
            a.to_string_at(Some(AddrLevel::RegionArea)),
            "Московская область"
        );
    }

    #[test]
    fn test_area_display_with_number() {
        let mut a = AreaAttributes::new("Парковая", "улица");
        a.number = Some("2".to_string());
        assert_eq!(a.to_string_at(Some(AddrLevel::Street)), "улица Парковая 2");
    }

    #[test]
    fn test_house_display() {
        let mut h = HouseAttributes::house("12");
        h.building_number = Some("1".to_string());
        assert_eq!(h.to_string(), "д. 12 корп. 1");
    }

    #[test]
    fn test_room_display() {
        assert_eq!(RoomAttributes::flat("5").to_string(), "кв. 5");
    }

    #[test]
    fn test_attributes_tagged_json() {
        let json = r#"{"kind":"house","house_type":"garage","number":"7"}"#;
        let attrs: Attributes = serde_json::from_str(json).unwrap();
        let house = attrs.as_house().unwrap();
        assert_eq!(house.house_type, HouseType::Garage);
        assert_eq!(house.number.as_deref(), Some("7"));
    }
}
