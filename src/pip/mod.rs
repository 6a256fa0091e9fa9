//! Point-in-Polygon (PIP) admin lookup service.
//!
//! Loads ADM0..ADM4 boundary GeoJSON files and resolves the admin hierarchy
//! of a building from its centroid using an R-tree spatial index.

mod boundary;
mod index;
mod service;

pub use boundary::{
    discover_boundary_files, level_from_file_name, load_boundaries, normalize_admin_name,
    parse_boundaries, AdminBoundary,
};
pub use index::AdminSpatialIndex;
pub use service::PipService;

#[cfg(test)]
pub(crate) mod fixtures {
    use geo::{polygon, MultiPolygon};

    use super::AdminBoundary;
    use crate::models::{AdminEntry, AdminLevel};

    /// Axis-aligned square boundary with its lower-left corner at `min`
    pub(crate) fn square(
        level: AdminLevel,
        code: &str,
        name: &str,
        (min_x, min_y): (f64, f64),
        size: f64,
    ) -> AdminBoundary {
        let mut entry = AdminEntry::new(level);
        entry.code = Some(code.to_string());
        entry.name = Some(name.to_string());
        let poly = polygon![
            (x: min_x, y: min_y),
            (x: min_x + size, y: min_y),
            (x: min_x + size, y: min_y + size),
            (x: min_x, y: min_y + size),
            (x: min_x, y: min_y),
        ];
        AdminBoundary {
            entry,
            geometry: MultiPolygon::new(vec![poly]),
        }
    }
}
