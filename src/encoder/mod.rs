//! Deterministic building addresses.
//!
//! geometry -> centroid -> zoom-17 tile -> Morton code -> block number,
//! geometry JSON -> DJB2 -> building number, then both are appended to the
//! caller's admin segments. Everything here is pure and allocation-light, so
//! callers may encode from any number of threads without coordination.

mod centroid;
mod hash;
mod morton;
mod tile;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::models::{AddressResult, AdminSelection, Feature, GeoPoint, TileIndex};

pub use centroid::{bounding_box, centroid};
pub use hash::{building_number, djb2, geometry_text};
pub use morton::{block_number, morton, part1by1, tile_morton};
pub use tile::{lon_lat_to_tile, TILE_ZOOM};

/// Number of distinct block numbers
pub const BLOCK_COUNT: u32 = 100_000;

/// Number of distinct building numbers within a block
pub const BUILDING_COUNT: u32 = 1_000;

/// Why no address could be generated
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("feature has no geometry")]
    NoGeometry,

    #[error("unrecognized geometry type '{0}'")]
    UnknownGeometryType(String),

    #[error("geometry has no finite coordinates")]
    EmptyCoordinates,
}

/// Intermediate values of one encoding
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Encoding {
    pub centroid: GeoPoint,
    pub tile: TileIndex,
    pub morton: u32,
    pub block_no: u32,
    pub building_no: u32,
}

/// Encode a raw geometry into block and building numbers
pub fn encode_geometry(geometry: &Value) -> Result<Encoding, AddressError> {
    let centroid = centroid(geometry)?;
    let tile = lon_lat_to_tile(centroid.lon, centroid.lat, TILE_ZOOM);
    let morton = tile_morton(&tile);

    Ok(Encoding {
        centroid,
        tile,
        morton,
        block_no: block_number(&tile),
        building_no: building_number(geometry),
    })
}

/// Build the address for a feature, reporting why when it cannot
pub fn try_build_address(
    feature: &Feature,
    admin: &AdminSelection,
) -> Result<AddressResult, AddressError> {
    let geometry = feature.geometry.as_ref().ok_or(AddressError::NoGeometry)?;
    let encoding = encode_geometry(geometry)?;
    Ok(AddressResult::new(
        admin,
        encoding.block_no,
        encoding.building_no,
    ))
}

/// Build the address for a feature; `None` when it has no usable geometry
pub fn build_address(feature: &Feature, admin: &AdminSelection) -> Option<AddressResult> {
    match try_build_address(feature, admin) {
        Ok(result) => Some(result),
        Err(e) => {
            debug!("No address for feature {:?}: {}", feature.display_id(), e);
            None
        }
    }
}
