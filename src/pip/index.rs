//! R-tree over admin boundaries of every level.

use std::sync::Arc;

use geo::{Contains, Point};
use rstar::{RTree, RTreeObject, AABB};
use tracing::{debug, info};

use super::{normalize_admin_name, AdminBoundary};
use crate::models::AdminLevel;

const LEVEL_COUNT: usize = 5;

fn slot(level: AdminLevel) -> usize {
    level.to_adm_level() as usize
}

/// Tree entry sharing its boundary with the per-level lists
struct IndexedBoundary {
    boundary: Arc<AdminBoundary>,
    envelope: AABB<[f64; 2]>,
}

impl IndexedBoundary {
    fn new(boundary: Arc<AdminBoundary>) -> Option<Self> {
        let bbox = boundary.bbox()?;
        let envelope =
            AABB::from_corners([bbox.min_lon, bbox.min_lat], [bbox.max_lon, bbox.max_lat]);
        Some(Self { boundary, envelope })
    }
}

impl RTreeObject for IndexedBoundary {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Point lookups over admin boundaries
pub struct AdminSpatialIndex {
    tree: RTree<IndexedBoundary>,
    /// Indexed by ADM level, load order within a level
    levels: [Vec<Arc<AdminBoundary>>; LEVEL_COUNT],
}

impl AdminSpatialIndex {
    /// Index boundaries; empty geometries are dropped
    pub fn build(boundaries: Vec<AdminBoundary>) -> Self {
        let mut levels: [Vec<Arc<AdminBoundary>>; LEVEL_COUNT] = Default::default();
        let mut entries = Vec::with_capacity(boundaries.len());

        for boundary in boundaries {
            let boundary = Arc::new(boundary);
            let Some(entry) = IndexedBoundary::new(Arc::clone(&boundary)) else {
                debug!("Skipping boundary {} without geometry", boundary.entry.label());
                continue;
            };
            levels[slot(boundary.entry.level)].push(boundary);
            entries.push(entry);
        }

        let tree = RTree::bulk_load(entries);

        info!("Indexed {} admin boundaries", tree.size());
        for level in AdminLevel::all() {
            let count = levels[slot(*level)].len();
            if count > 0 {
                info!("  {}: {}", level, count);
            }
        }

        Self { tree, levels }
    }

    /// Boundaries whose polygon contains the point, any level
    fn containing(&self, lon: f64, lat: f64) -> Vec<&Arc<AdminBoundary>> {
        let point = Point::new(lon, lat);
        let envelope = AABB::from_point([lon, lat]);

        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|entry| &entry.boundary)
            .filter(|boundary| boundary.geometry.contains(&point))
            .collect()
    }

    /// All boundaries containing a point
    pub fn lookup(&self, lon: f64, lat: f64) -> Vec<Arc<AdminBoundary>> {
        self.containing(lon, lat).into_iter().cloned().collect()
    }

    /// Smallest boundary of `level` containing a point
    pub fn lookup_at_level(
        &self,
        lon: f64,
        lat: f64,
        level: AdminLevel,
    ) -> Option<Arc<AdminBoundary>> {
        self.containing(lon, lat)
            .into_iter()
            .filter(|boundary| boundary.entry.level == level)
            .min_by(|a, b| a.area().total_cmp(&b.area()))
            .cloned()
    }

    pub fn boundaries_at_level(&self, level: AdminLevel) -> &[Arc<AdminBoundary>] {
        &self.levels[slot(level)]
    }

    /// Boundaries at a level whose code matches exactly or whose name matches
    /// after normalization
    pub fn find_by_name(&self, level: AdminLevel, name: &str) -> Vec<Arc<AdminBoundary>> {
        let wanted = normalize_admin_name(name);
        self.boundaries_at_level(level)
            .iter()
            .filter(|b| {
                b.entry.code.as_deref() == Some(name.trim())
                    || (!wanted.is_empty()
                        && b.entry
                            .name
                            .as_deref()
                            .map_or(false, |n| normalize_admin_name(n) == wanted))
            })
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Levels that have at least one boundary, in ADM order
    pub fn levels(&self) -> Vec<AdminLevel> {
        AdminLevel::all()
            .iter()
            .copied()
            .filter(|level| !self.levels[slot(*level)].is_empty())
            .collect()
    }
}
