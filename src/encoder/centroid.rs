//! Bounding-box centroid of a raw GeoJSON geometry.
//!
//! Walks the coordinate tree by hand rather than converting into geometry
//! types: positions may carry extra ordinates, and malformed branches are
//! skipped instead of rejecting the whole geometry.

use serde_json::Value;

use super::AddressError;
use crate::models::{BoundingBox, GeoPoint, GeometryKind};

/// Centroid of a geometry: the point itself for `Point`, otherwise the
/// midpoint of the bounding box of every finite position.
pub fn centroid(geometry: &Value) -> Result<GeoPoint, AddressError> {
    let type_name = geometry
        .get("type")
        .and_then(Value::as_str)
        .ok_or(AddressError::NoGeometry)?;
    let kind = GeometryKind::from_type_name(type_name)
        .ok_or_else(|| AddressError::UnknownGeometryType(type_name.to_string()))?;

    match kind {
        GeometryKind::Point => geometry
            .get("coordinates")
            .and_then(point_position)
            .ok_or(AddressError::EmptyCoordinates),
        GeometryKind::GeometryCollection => {
            let mut bbox = BoundingBox::empty();
            if let Some(Value::Array(members)) = geometry.get("geometries") {
                // Only direct members' coordinates; nested collections have none
                for member in members {
                    if let Some(coords) = member.get("coordinates") {
                        visit(coords, &mut bbox);
                    }
                }
            }
            bbox.midpoint().ok_or(AddressError::EmptyCoordinates)
        }
        _ => {
            let mut bbox = BoundingBox::empty();
            if let Some(coords) = geometry.get("coordinates") {
                visit(coords, &mut bbox);
            }
            bbox.midpoint().ok_or(AddressError::EmptyCoordinates)
        }
    }
}

/// Bounding box of a coordinate tree (arbitrarily nested arrays of positions)
pub fn bounding_box(coordinates: &Value) -> BoundingBox {
    let mut bbox = BoundingBox::empty();
    visit(coordinates, &mut bbox);
    bbox
}

fn point_position(coords: &Value) -> Option<GeoPoint> {
    let lon = coords.get(0)?.as_f64()?;
    let lat = coords.get(1)?.as_f64()?;
    let point = GeoPoint::new(lon, lat);
    point.is_finite().then_some(point)
}

fn visit(node: &Value, bbox: &mut BoundingBox) {
    let Value::Array(items) = node else {
        return;
    };

    // A position: first two members are numbers
    if let (Some(lon), Some(lat)) = (
        items.first().and_then(Value::as_f64),
        items.get(1).and_then(Value::as_f64),
    ) {
        bbox.extend(lon, lat);
        return;
    }

    for item in items {
        visit(item, bbox);
    }
}
