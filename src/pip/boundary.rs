//! Admin boundary loading from GeoJSON boundary datasets.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use flate2::read::GzDecoder;
use geo::{Area, BoundingRect, MultiPolygon};
use geojson::GeoJson;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use unicode_normalization::UnicodeNormalization;
use walkdir::WalkDir;

use crate::models::feature::value_to_label;
use crate::models::{AdminEntry, AdminLevel, BoundingBox};

/// A single admin boundary polygon with metadata
#[derive(Debug, Clone)]
pub struct AdminBoundary {
    pub entry: AdminEntry,
    pub geometry: MultiPolygon<f64>,
}

impl AdminBoundary {
    /// Bounding box of the polygon, `None` for an empty geometry
    pub fn bbox(&self) -> Option<BoundingBox> {
        self.geometry
            .bounding_rect()
            .map(|rect| BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y))
    }

    /// Planar area in square degrees, used to rank overlapping boundaries
    pub fn area(&self) -> f64 {
        self.geometry.unsigned_area()
    }
}

// Property keys tried in order, covering geoBoundaries (shape*), GADM (GID_n,
// NAME_n), OCHA/HDX (ADMn_PCODE, ADMn_EN) and Natural Earth style exports.
fn code_keys(level: AdminLevel) -> &'static [&'static str] {
    match level {
        AdminLevel::Country => &[
            "iso", "iso_a3", "ISO_A3", "ADM0_A3", "shapeGroup", "shapeISO", "GID_0", "ADM0_PCODE",
        ],
        AdminLevel::Province => &[
            "GID_1",
            "ADM1_PCODE",
            "PCODE",
            "CODE_1",
            "ID_1",
            "PROV_CODE",
            "province_id",
            "state",
            "state_id",
            "shapeISO",
            "shapeID",
        ],
        AdminLevel::District => &[
            "GID_2",
            "ADM2_PCODE",
            "PCODE",
            "CODE_2",
            "ID_2",
            "OBJECTID",
            "id",
            "shapeID",
        ],
        AdminLevel::City => &["GID_3", "ADM3_PCODE", "PCODE", "CODE_3", "ID_3", "shapeID", "id"],
        AdminLevel::Village => &["GID_4", "ADM4_PCODE", "PCODE", "CODE_4", "ID_4", "shapeID", "id"],
    }
}

fn name_keys(level: AdminLevel) -> &'static [&'static str] {
    match level {
        AdminLevel::Country => &["name", "ADMIN", "NAME", "shapeName", "NAME_0", "ADM0_EN"],
        AdminLevel::Province => &["shapeName", "NAME_1", "ADM1_EN", "en_name", "name", "NAME"],
        AdminLevel::District => &[
            "NAME_2",
            "ADM2_EN",
            "DIST_NAME",
            "DISTRICT",
            "shapeName",
            "NAME",
            "en_name",
            "local_name",
            "name",
        ],
        AdminLevel::City => &["NAME_3", "ADM3_EN", "shapeName", "NAME", "name"],
        AdminLevel::Village => &["NAME_4", "ADM4_EN", "shapeName", "NAME", "name"],
    }
}

fn parent_keys(level: AdminLevel) -> &'static [&'static str] {
    match level {
        AdminLevel::Country => &[],
        AdminLevel::Province => &["GID_0", "ADM0_PCODE", "shapeGroup"],
        AdminLevel::District => &["GID_1", "ADM1_PCODE"],
        AdminLevel::City => &["GID_2", "ADM2_PCODE"],
        AdminLevel::Village => &["GID_3", "ADM3_PCODE"],
    }
}

/// First non-empty string or number among `keys`
fn pick(props: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| props.get(*key))
        .filter_map(value_to_label)
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
}

/// Load boundaries of one admin level from a GeoJSON file (`.gz` accepted)
pub fn load_boundaries(path: &Path, level: AdminLevel) -> Result<Vec<AdminBoundary>> {
    info!("Loading {} boundaries from {}", level, path.display());

    let file = File::open(path)
        .with_context(|| format!("Failed to open boundary file {}", path.display()))?;
    let mut reader: Box<dyn Read> = if path.extension().map_or(false, |e| e == "gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };

    let mut content = String::new();
    reader
        .read_to_string(&mut content)
        .with_context(|| format!("Failed to read boundary file {}", path.display()))?;
    let geojson: GeoJson = content
        .parse()
        .with_context(|| format!("Failed to parse GeoJSON in {}", path.display()))?;

    let boundaries = parse_boundaries(geojson, level)?;
    info!(
        "Loaded {} {} boundaries from {}",
        boundaries.len(),
        level,
        path.display()
    );
    Ok(boundaries)
}

/// Convert a parsed GeoJSON document into boundaries of `level`
pub fn parse_boundaries(geojson: GeoJson, level: AdminLevel) -> Result<Vec<AdminBoundary>> {
    let features = match geojson {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(_) => {
            bail!("Expected a Feature or FeatureCollection, got a bare geometry")
        }
    };

    let total = features.len();
    let boundaries: Vec<AdminBoundary> = features
        .into_iter()
        .filter_map(|f| boundary_from_feature(f, level))
        .collect();

    if boundaries.len() < total {
        debug!(
            "Skipped {} of {} {} features without polygon geometry or identity",
            total - boundaries.len(),
            total,
            level
        );
    }

    Ok(boundaries)
}

fn boundary_from_feature(feature: geojson::Feature, level: AdminLevel) -> Option<AdminBoundary> {
    let geometry: geo::Geometry<f64> = feature.geometry?.try_into().ok()?;
    let geometry = match geometry {
        geo::Geometry::MultiPolygon(mp) => mp,
        geo::Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
        _ => return None,
    };

    let empty = Map::new();
    let props = feature.properties.as_ref().unwrap_or(&empty);

    let feature_id = feature.id.as_ref().map(|id| match id {
        geojson::feature::Id::String(s) => s.clone(),
        geojson::feature::Id::Number(n) => n.to_string(),
    });

    let mut entry = AdminEntry::new(level);
    entry.code = pick(props, code_keys(level)).or(feature_id);
    entry.name = pick(props, name_keys(level));
    entry.parent_code = pick(props, parent_keys(level));

    if entry.code.is_none() && entry.name.is_none() {
        return None;
    }

    let mut boundary = AdminBoundary { entry, geometry };
    boundary.entry.bbox = boundary.bbox();
    Some(boundary)
}

/// ADM level encoded in a boundary file name, e.g. `geoBoundaries-LAO-ADM1.geojson`
pub fn level_from_file_name(name: &str) -> Option<AdminLevel> {
    let upper = name.to_ascii_uppercase();
    for (i, _) in upper.match_indices("ADM") {
        // "GADM41" is a dataset name, not a level
        if upper[..i]
            .chars()
            .next_back()
            .map_or(false, |c| c.is_ascii_alphabetic())
        {
            continue;
        }
        let mut rest = upper[i + 3..].chars();
        let Some(digit) = rest.next().and_then(|c| c.to_digit(10)) else {
            continue;
        };
        if rest.next().map_or(false, |c| c.is_ascii_digit()) {
            continue;
        }
        return AdminLevel::from_adm_level(digit as u8);
    }
    None
}

fn is_geojson_file(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    let lower = lower.strip_suffix(".gz").unwrap_or(&lower);
    lower.ends_with(".geojson") || lower.ends_with(".json")
}

/// Find boundary files under a directory, recursively.
///
/// Files must be GeoJSON (optionally gzipped) with an ADM level in the name.
pub fn discover_boundary_files<P: AsRef<Path>>(dir: P) -> Result<Vec<(AdminLevel, PathBuf)>> {
    let dir = dir.as_ref();
    if !dir.exists() {
        warn!("Boundary directory not found: {}", dir.display());
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !is_geojson_file(file_name) {
            continue;
        }

        match level_from_file_name(file_name) {
            Some(level) => found.push((level, path.to_path_buf())),
            None => debug!("Skipping {}: no ADM level in file name", path.display()),
        }
    }

    found.sort();
    info!(
        "Found {} boundary files in {}",
        found.len(),
        dir.display()
    );
    Ok(found)
}

/// Combining diacritical marks left behind by NFKD
const COMBINING_MARKS: std::ops::RangeInclusive<char> = '\u{0300}'..='\u{036f}';

/// Normalize an admin name for spelling-tolerant matching.
///
/// Lowercases, strips accents (NFKD), keeps ASCII letters only, then folds the common
/// romanization variants `kh`/`x` and `ph`/`f`.
pub fn normalize_admin_name(s: &str) -> String {
    let letters: String = s
        .to_lowercase()
        .nfkd()
        .filter(|c| !COMBINING_MARKS.contains(c))
        .filter(char::is_ascii_lowercase)
        .collect();
    letters.replace("kh", "x").replace("ph", "f")
}
