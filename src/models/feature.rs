//! GeoJSON feature input.
//!
//! The geometry is held as raw JSON rather than parsed into geometry types:
//! the building number is a hash over the geometry's JSON text, so the field
//! order it arrived with has to survive (serde_json is built with
//! `preserve_order`).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// RFC 7946 geometry type names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryKind {
    Point,
    MultiPoint,
    LineString,
    MultiLineString,
    Polygon,
    MultiPolygon,
    GeometryCollection,
}

impl GeometryKind {
    /// Parse a GeoJSON `type` member, `None` for anything unrecognized
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "Point" => Some(GeometryKind::Point),
            "MultiPoint" => Some(GeometryKind::MultiPoint),
            "LineString" => Some(GeometryKind::LineString),
            "MultiLineString" => Some(GeometryKind::MultiLineString),
            "Polygon" => Some(GeometryKind::Polygon),
            "MultiPolygon" => Some(GeometryKind::MultiPolygon),
            "GeometryCollection" => Some(GeometryKind::GeometryCollection),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            GeometryKind::Point => "Point",
            GeometryKind::MultiPoint => "MultiPoint",
            GeometryKind::LineString => "LineString",
            GeometryKind::MultiLineString => "MultiLineString",
            GeometryKind::Polygon => "Polygon",
            GeometryKind::MultiPolygon => "MultiPolygon",
            GeometryKind::GeometryCollection => "GeometryCollection",
        }
    }
}

impl std::fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name())
    }
}

/// A GeoJSON Feature as supplied by the map UI
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub feature_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    #[serde(default)]
    pub properties: Option<Map<String, Value>>,

    /// Raw geometry object; `null` and a missing member both land here as `None`
    #[serde(default)]
    pub geometry: Option<Value>,
}

impl Feature {
    /// Feature wrapping a bare geometry object
    pub fn new(geometry: Value) -> Self {
        Self {
            feature_type: Some("Feature".to_string()),
            id: None,
            properties: None,
            geometry: Some(geometry),
        }
    }

    /// Geometry type of this feature, if it has a recognized one
    pub fn geometry_kind(&self) -> Option<GeometryKind> {
        self.geometry
            .as_ref()
            .and_then(|g| g.get("type"))
            .and_then(Value::as_str)
            .and_then(GeometryKind::from_type_name)
    }

    /// Display identifier: `properties.id` first, then the feature `id`
    pub fn display_id(&self) -> Option<String> {
        let from_props = self.properties.as_ref().and_then(|p| p.get("id"));
        from_props
            .or(self.id.as_ref())
            .and_then(value_to_label)
    }
}

/// Render a string or number JSON value as a label
pub fn value_to_label(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// GeoJSON FeatureCollection of buildings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub collection_type: Option<String>,

    #[serde(default)]
    pub features: Vec<Feature>,
}
