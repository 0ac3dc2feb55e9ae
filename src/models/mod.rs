//! Core data models for the gazetteer.

pub mod attrs;
pub mod item;
pub mod level;
pub mod node;

pub use attrs::{AreaAttributes, Attributes, HouseAttributes, HouseType, RoomAttributes, RoomType};
pub use item::{ItemRole, ParsedAddressHierarchy, ParsedAddressItem, RegistryEntity};
pub use level::{AddrLevel, RegistryLevel};
pub use node::{RepositoryNode, ROOT_ID};
