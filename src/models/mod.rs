//! Core data models for the address encoder.

pub mod address;
pub mod admin;
pub mod feature;
pub mod geo;

pub use address::{AddressResult, AdminSelection};
pub use admin::{AdminEntry, AdminHierarchy, AdminLevel};
pub use feature::{Feature, FeatureCollection, GeometryKind};
pub use geo::{BoundingBox, GeoPoint, TileIndex};
