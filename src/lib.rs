//! Gazetteer - an incrementally built, persistent catalogue of address
//! entities.
//!
//! Parsed address hierarchies (country, region, city, ... street, building,
//! apartment) are resolved against the catalogue with level-aware fuzzy
//! matching; `add` creates the nodes that are still missing. This library
//! provides the repository and shared types for the ingest and query binaries.

pub mod config;
pub mod error;
pub mod index;
pub mod levels;
pub mod matching;
pub mod models;
pub mod repository;
pub mod storage;

pub use config::RepositoryConfig;
pub use error::{GazetteerError, Result};
pub use models::{AddrLevel, ParsedAddressHierarchy, ParsedAddressItem, RepositoryNode};
pub use repository::{AddressRepository, NOT_ADMISSIBLE};
